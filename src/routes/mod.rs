// src/routes/mod.rs
pub mod chat;

use crate::config::ServerConfig;
use crate::error::panic_response;
use crate::state::SharedState;
use axum::{
    Router,
    routing::{get, post},
};
use chat::{chat_handler, status_handler};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(config: &ServerConfig) -> Router<SharedState> {
    let mut router = Router::new()
        .route("/", get(status_handler))
        .route(&config.chat_path, post(chat_handler))
        .route("/health", get(|| async { "OK" }));

    if let Some(dir) = &config.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}
