//! Route table

use crate::api;
use crate::middleware::log_request;
use crate::server::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(api::chat::handle_chat).get(api::chat::chat_liveness))
        .route("/api/verify", post(api::verify::handle_verify))
        .route("/api/gallery", get(api::gallery::handle_gallery))
        .route("/health", get(api::health::health_check))
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .with_state(state)
}
