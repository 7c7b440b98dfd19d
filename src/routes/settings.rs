use axum::{
    extract::{Extension, Json, Path},
    routing::{get, patch, put},
    Router,
};
use serde::Serialize;
use tracing::info;

use crate::{
    error::AppResult,
    state::SharedStore,
    store::{Settings, SettingsPatch},
    theme::Theme,
};

#[derive(Serialize)]
struct ThemeJson {
    name: &'static str,
    color: &'static str,
    background: &'static str,
}

impl From<Theme> for ThemeJson {
    fn from(t: Theme) -> Self {
        Self { name: t.name(), color: t.color(), background: t.background() }
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/settings", patch(update))
        .route("/themes", get(themes))
        .route("/theme/:name", put(change_theme))
}

async fn update(
    Extension(store): Extension<SharedStore>,
    Json(p): Json<SettingsPatch>,
) -> AppResult<Json<Settings>> {
    let mut s = store.write().await;
    s.update_settings(&p)?;
    info!(settings = ?s.settings(), "settings updated");
    Ok(Json(s.settings().clone()))
}

async fn themes() -> Json<Vec<ThemeJson>> {
    Json(Theme::ALL.into_iter().map(ThemeJson::from).collect())
}

async fn change_theme(
    Extension(store): Extension<SharedStore>,
    Path(name): Path<String>,
) -> AppResult<Json<ThemeJson>> {
    let theme = store.write().await.change_theme(&name)?;
    info!(theme = theme.name(), "theme changed");
    Ok(Json(theme.into()))
}
