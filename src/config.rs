use std::{env, net::SocketAddr, path::PathBuf, time::Duration};

use crate::{
    danmu::SEND_URL,
    error::{self, AppResult},
};

pub const CONFIG_FILE: &str = "config/config.txt";
const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub bind: SocketAddr,
    pub endpoint: String,
    pub recover: bool,
    pub http_timeout: Option<Duration>,
    pub assets: PathBuf,
}

impl AppConfig {
    /// 讀 `.env` 之後的環境變數；未設定的一律用預設值
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let bind = get("DANMU_BIND").unwrap_or_else(|| DEFAULT_BIND.into()).parse()?;

        let recover = match get("DANMU_RECOVER").as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(error::AppErr::Env {
                    key: "DANMU_RECOVER",
                    reason: format!("expected 1/0/true/false, got {other:?}"),
                })
            }
        };

        let http_timeout = get("DANMU_HTTP_TIMEOUT")
            .map(|s| s.trim().parse::<f64>())
            .transpose()
            .map_err(error::env("DANMU_HTTP_TIMEOUT"))?
            .map(Duration::try_from_secs_f64)
            .transpose()
            .map_err(error::env("DANMU_HTTP_TIMEOUT"))?;
        if http_timeout.is_some_and(|d| d.is_zero()) {
            return Err(error::AppErr::Env {
                key: "DANMU_HTTP_TIMEOUT",
                reason: "timeout must be greater than 0".into(),
            });
        }

        Ok(Self {
            config_path: get("DANMU_CONFIG").unwrap_or_else(|| CONFIG_FILE.into()).into(),
            bind,
            endpoint: get("DANMU_ENDPOINT").unwrap_or_else(|| SEND_URL.into()),
            recover,
            http_timeout,
            assets: get("DANMU_ASSETS").unwrap_or_else(|| "photos".into()).into(),
        })
    }
}
