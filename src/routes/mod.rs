use axum::Router;

pub mod rooms;
pub mod sending;
pub mod settings;

pub fn router() -> Router {
    Router::new().nest(
        "/api",
        rooms::router()
            .merge(settings::router())
            .merge(sending::router()),
    )
}
