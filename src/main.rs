mod config;
mod danmu;
mod error;
mod routes;
mod scheduler;
mod state;
mod store;
mod theme;
mod utils {
    pub mod validate;
}

use axum::{Extension, Router};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};
use tracing::{error, info};

use crate::{
    config::AppConfig,
    danmu::DanmuClient,
    scheduler::SendScheduler,
    state::{SharedScheduler, SharedStore},
    store::ConfigStore,
};
use error::AppErr;

const BODY_LIMIT: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<(), AppErr> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let cfg = AppConfig::from_env()?;

    // 設定檔壞掉時不覆寫，除非明確要求 DANMU_RECOVER
    let store = match ConfigStore::load_or_recover(&cfg.config_path, cfg.recover) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "cannot load config; set DANMU_RECOVER=1 to start over with defaults");
            return Err(e);
        }
    };
    info!(path = %store.path().display(), rooms = store.rooms().count(), "config loaded");

    let store: SharedStore = Arc::new(RwLock::new(store));
    let client = DanmuClient::new(cfg.endpoint.clone(), cfg.http_timeout)?;
    let scheduler: SharedScheduler = Arc::new(SendScheduler::new(store.clone(), Arc::new(client)));

    let app = Router::new()
        .merge(routes::router())
        .nest_service("/photos", ServeDir::new(&cfg.assets))
        .layer(Extension(store))
        .layer(Extension(scheduler.clone()))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT));

    let listener = tokio::net::TcpListener::bind(cfg.bind).await?;
    info!(addr = %cfg.bind, "control panel listening");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    scheduler.shutdown().await;
    info!("bye");
    Ok(())
}
