//! routes/rooms.rs
use axum::{
    extract::{Extension, Json, Path},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{AppErr, AppResult},
    state::SharedStore,
    store::RoomProfile,
};

#[derive(Deserialize)]
struct SaveRoom {
    csrf: String,
    csrf_token: String,
    sessdata: String,
    #[serde(default)]
    danmus: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct NewDanmu {
    text: String,
}

pub fn router() -> Router {
    Router::new()
        .route("/rooms/:room_id", get(show).put(save).delete(remove))
        .route("/rooms/:room_id/danmus", post(add_danmu))
        .route("/rooms/:room_id/danmus/:index", delete(remove_danmu))
}

/* ---------------- 選取常用直播間 ---------------- */
async fn show(
    Extension(store): Extension<SharedStore>,
    Path(room_id): Path<String>,
) -> AppResult<Json<RoomProfile>> {
    store
        .read()
        .await
        .room(&room_id)
        .cloned()
        .map(Json)
        .ok_or(AppErr::InvalidRoom(room_id))
}

/* ---------------- 保存配置 ---------------- */
async fn save(
    Extension(store): Extension<SharedStore>,
    Path(room_id): Path<String>,
    Json(p): Json<SaveRoom>,
) -> AppResult<Json<RoomProfile>> {
    let mut s = store.write().await;
    s.save_room(&room_id, &p.csrf, &p.csrf_token, &p.sessdata, p.danmus)?;
    info!(room_id = %room_id, "room saved");
    // 剛存入的房間一定在容量內
    s.room(&room_id)
        .cloned()
        .map(Json)
        .ok_or(AppErr::InvalidRoom(room_id))
}

/* ---------------- 刪除直播間 ---------------- */
async fn remove(
    Extension(store): Extension<SharedStore>,
    Path(room_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    if !store.write().await.delete_room(&room_id)? {
        return Err(AppErr::InvalidRoom(room_id));
    }
    info!(room_id = %room_id, "room deleted");
    Ok(Json(serde_json::json!({ "deleted": room_id })))
}

/* ---------------- 常用彈幕 ---------------- */
async fn add_danmu(
    Extension(store): Extension<SharedStore>,
    Path(room_id): Path<String>,
    Json(p): Json<NewDanmu>,
) -> AppResult<Json<Vec<String>>> {
    let mut s = store.write().await;
    s.add_message(&room_id, &p.text)?;
    Ok(Json(danmus(&s, &room_id)))
}

async fn remove_danmu(
    Extension(store): Extension<SharedStore>,
    Path((room_id, index)): Path<(String, usize)>,
) -> AppResult<Json<Vec<String>>> {
    let mut s = store.write().await;
    s.delete_message(&room_id, index)?;
    Ok(Json(danmus(&s, &room_id)))
}

fn danmus(s: &crate::store::ConfigStore, room_id: &str) -> Vec<String> {
    s.room(room_id).map(|r| r.danmus.clone()).unwrap_or_default()
}
