// src/danmu.rs

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use std::{fmt, time::Duration};
use tracing::{info, warn};

use crate::{error::AppResult, utils::validate::color_value};

pub const SEND_URL: &str = "https://api.live.bilibili.com/msg/send";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

/// 一次發送所需的全部參數；開始發送時拍下快照，之後不再變動。
#[derive(Clone, PartialEq)]
pub struct SendParams {
    pub room_id: String,
    pub message: String,
    pub csrf: String,
    pub csrf_token: String,
    pub sessdata: String,
    pub color: String,
    pub font_size: u32,
    pub mode: u8,
    pub interval_seconds: f64,
}

/* 憑證不進 log */
impl fmt::Debug for SendParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendParams")
            .field("room_id", &self.room_id)
            .field("message", &self.message)
            .field("color", &self.color)
            .field("font_size", &self.font_size)
            .field("mode", &self.mode)
            .field("interval_seconds", &self.interval_seconds)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendResult {
    pub ok: bool,
    /// 遠端回應原文，或失敗原因
    pub raw: String,
}

#[derive(thiserror::Error, Debug)]
pub enum SendFailure {
    #[error("request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("color {0:?} is not #RRGGBB")]
    BadColor(String),
}

/// 發送迴圈的對外出口；測試時換成記錄用的實作
#[async_trait]
pub trait DanmuSink: Send + Sync {
    async fn send(&self, params: &SendParams) -> SendResult;
}

#[derive(Clone)]
pub struct DanmuClient {
    http: Client,
    endpoint: String,
}

impl DanmuClient {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> AppResult<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self { http: builder.build()?, endpoint: endpoint.into() })
    }

    async fn post(&self, p: &SendParams) -> Result<String, SendFailure> {
        let form = form_fields(p, chrono::Utc::now().timestamp())?;
        let resp = self
            .http
            .post(&self.endpoint)
            .header(header::COOKIE, format!("SESSDATA={}", p.sessdata))
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(SendFailure::Status { code: status.as_u16(), body });
        }
        Ok(body)
    }
}

#[async_trait]
impl DanmuSink for DanmuClient {
    async fn send(&self, params: &SendParams) -> SendResult {
        match self.post(params).await {
            Ok(body) => {
                // 只記錄，不拿 code 決定成敗
                if let Some(code) = remote_code(&body).filter(|c| *c != 0) {
                    warn!(room_id = %params.room_id, code, response = %body, "remote rejected danmu");
                } else {
                    info!(room_id = %params.room_id, response = %body, "danmu sent");
                }
                SendResult { ok: true, raw: body }
            }
            Err(e) => {
                warn!(room_id = %params.room_id, error = %e, "danmu send failed");
                SendResult { ok: false, raw: e.to_string() }
            }
        }
    }
}

/// 表單欄位（`application/x-www-form-urlencoded`），依送出順序
fn form_fields(p: &SendParams, rnd: i64) -> Result<Vec<(&'static str, String)>, SendFailure> {
    let color = color_value(&p.color).ok_or_else(|| SendFailure::BadColor(p.color.clone()))?;
    Ok(vec![
        ("roomid", p.room_id.clone()),
        ("msg", p.message.clone()),
        ("rnd", rnd.to_string()),
        ("color", color.to_string()),
        ("fontsize", p.font_size.to_string()),
        ("mode", p.mode.to_string()),
        ("csrf", p.csrf.clone()),
        ("csrf_token", p.csrf_token.clone()),
    ])
}

fn remote_code(body: &str) -> Option<i64> {
    serde_json::from_str::<Value>(body).ok()?.get("code")?.as_i64()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{
        extract::Extension,
        http::{header as h, HeaderMap, StatusCode},
        routing::post,
        Form, Router,
    };
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    pub(crate) fn params(message: &str, interval_seconds: f64) -> SendParams {
        SendParams {
            room_id: "12345".into(),
            message: message.into(),
            csrf: "a".into(),
            csrf_token: "b".into(),
            sessdata: "c".into(),
            color: "#FFFFFF".into(),
            font_size: 25,
            mode: 1,
            interval_seconds,
        }
    }

    #[test]
    fn form_has_wire_fields() {
        let form = form_fields(&params("hello", 5.0), 1_700_000_000).unwrap();
        let get = |k: &str| form.iter().find(|(f, _)| *f == k).map(|(_, v)| v.as_str());
        assert_eq!(get("roomid"), Some("12345"));
        assert_eq!(get("msg"), Some("hello"));
        assert_eq!(get("rnd"), Some("1700000000"));
        assert_eq!(get("color"), Some("16777215"));
        assert_eq!(get("fontsize"), Some("25"));
        assert_eq!(get("mode"), Some("1"));
        assert_eq!(get("csrf"), Some("a"));
        assert_eq!(get("csrf_token"), Some("b"));
    }

    #[test]
    fn black_is_zero() {
        let mut p = params("x", 1.0);
        p.color = "#000000".into();
        let form = form_fields(&p, 0).unwrap();
        assert!(form.contains(&("color", "0".to_string())));
    }

    #[test]
    fn bad_color_is_a_send_failure() {
        let mut p = params("x", 1.0);
        p.color = "white".into();
        assert!(matches!(form_fields(&p, 0), Err(SendFailure::BadColor(_))));
    }

    #[test]
    fn debug_hides_credentials() {
        let dbg = format!("{:?}", params("x", 1.0));
        assert!(dbg.contains("12345"));
        assert!(!dbg.contains("sessdata"));
    }

    #[test]
    fn reads_remote_code() {
        assert_eq!(remote_code(r#"{"code":0,"msg":""}"#), Some(0));
        assert_eq!(remote_code(r#"{"code":-101}"#), Some(-101));
        assert_eq!(remote_code("<html>"), None);
    }

    /* ---------- 本機假伺服器：記下收到的請求 ---------- */
    #[derive(Debug, Default, Clone)]
    struct Seen {
        cookie: String,
        user_agent: String,
        content_type: String,
        form: HashMap<String, String>,
    }

    type SeenLog = Arc<Mutex<Option<Seen>>>;

    async fn record(
        Extension(log): Extension<SeenLog>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> &'static str {
        let get = |name| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned()
        };
        *log.lock().unwrap() = Some(Seen {
            cookie: get(h::COOKIE),
            user_agent: get(h::USER_AGENT),
            content_type: get(h::CONTENT_TYPE),
            form,
        });
        r#"{"code":0,"data":[],"message":"","msg":""}"#
    }

    pub(crate) async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn posts_form_with_cookie_and_agent() {
        let log = SeenLog::default();
        let app = Router::new()
            .route("/msg/send", post(record))
            .layer(Extension(log.clone()));
        let base = spawn_server(app).await;

        let client = DanmuClient::new(format!("{base}/msg/send"), None).unwrap();
        let before = chrono::Utc::now().timestamp();
        let res = client.send(&params("hello", 1.0)).await;
        assert!(res.ok, "{}", res.raw);
        assert!(res.raw.contains("\"code\":0"));

        let seen = log.lock().unwrap().clone().expect("request reached server");
        assert_eq!(seen.cookie, "SESSDATA=c");
        assert_eq!(seen.user_agent, USER_AGENT);
        assert!(seen.content_type.starts_with("application/x-www-form-urlencoded"));
        assert_eq!(seen.form["roomid"], "12345");
        assert_eq!(seen.form["msg"], "hello");
        assert_eq!(seen.form["color"], "16777215");
        assert_eq!(seen.form["fontsize"], "25");
        assert_eq!(seen.form["mode"], "1");
        assert_eq!(seen.form["csrf"], "a");
        assert_eq!(seen.form["csrf_token"], "b");
        let rnd: i64 = seen.form["rnd"].parse().unwrap();
        assert!(rnd >= before && rnd <= chrono::Utc::now().timestamp());
    }

    #[tokio::test]
    async fn server_error_is_not_ok() {
        let app = Router::new().route(
            "/msg/send",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn_server(app).await;

        let client = DanmuClient::new(format!("{base}/msg/send"), None).unwrap();
        let res = client.send(&params("hello", 1.0)).await;
        assert!(!res.ok);
        assert!(res.raw.contains("500"));
        assert!(res.raw.contains("boom"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_captured() {
        let client = DanmuClient::new("http://127.0.0.1:9/msg/send", Some(Duration::from_secs(2))).unwrap();
        let res = client.send(&params("hello", 1.0)).await;
        assert!(!res.ok);
        assert!(!res.raw.is_empty());
    }
}
