use axum::{
    extract::{Extension, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    danmu::SendParams,
    error::AppResult,
    state::{SharedScheduler, SharedStore},
};

/// 表單上目前的內容；顏色、字體、模式、間隔取自設定
#[derive(Deserialize)]
struct ToggleReq {
    room_id: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    csrf: String,
    #[serde(default)]
    csrf_token: String,
    #[serde(default)]
    sessdata: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/state", get(snapshot))
        .route("/toggle", post(toggle))
}

async fn snapshot(
    Extension(store): Extension<SharedStore>,
    Extension(scheduler): Extension<SharedScheduler>,
) -> Json<Value> {
    let doc = store.read().await.document().clone();
    Json(json!({
        "document": doc,
        "state":    scheduler.state().await,
        "current":  scheduler.current().await,
    }))
}

/* ---------------- 開始 / 停止發送 ---------------- */
async fn toggle(
    Extension(store): Extension<SharedStore>,
    Extension(scheduler): Extension<SharedScheduler>,
    Json(p): Json<ToggleReq>,
) -> AppResult<Json<Value>> {
    let params = {
        let s = store.read().await;
        let cfg = s.settings();
        SendParams {
            room_id: p.room_id,
            message: p.message.trim().to_owned(),
            csrf: p.csrf,
            csrf_token: p.csrf_token,
            sessdata: p.sessdata,
            color: cfg.color.clone(),
            font_size: cfg.font_size,
            mode: cfg.mode,
            interval_seconds: cfg.time_step,
        }
    }; // 讀鎖在這裡放掉，toggle 會寫入設定文件

    let state = scheduler.toggle(params).await?;
    Ok(Json(json!({ "state": state })))
}
