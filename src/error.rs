use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::{fmt::Display, path::PathBuf};

use crate::utils::validate::ValidationError;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    /// 設定檔存在但無法解析；啟動時致命
    #[error("config file {} is corrupt: {source}", path.display())]
    ConfigCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("room {0} is not a saved room")]
    InvalidRoom(String),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("message text is empty")]
    EmptyMessage,

    #[error("message index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Env {key}: {reason}")]
    Env { key: &'static str, reason: String },

    #[error("Bind address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
}

impl IntoResponse for AppErr {
    fn into_response(self) -> axum::response::Response {
        let (code, body) = match &self {
            AppErr::Validation(v) => (
                StatusCode::BAD_REQUEST,
                json!({ "field": v.field(), "error": v.to_string() }),
            ),
            AppErr::InvalidRoom(_) => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            AppErr::MissingField(field) => (
                StatusCode::BAD_REQUEST,
                json!({ "field": field, "error": self.to_string() }),
            ),
            AppErr::EmptyMessage | AppErr::IndexOutOfRange { .. } => {
                (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() }))
            }
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": other.to_string() }),
            ),
        };
        (code, Json(body)).into_response()
    }
}

/* ── 小助手：環境變數格式錯誤 ── */
pub fn env<E: Display>(key: &'static str) -> impl Fn(E) -> AppErr {
    move |e| AppErr::Env { key, reason: e.to_string() }
}
