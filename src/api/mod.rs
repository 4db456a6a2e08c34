//! # API Module
//!
//! HTTP surface of the relay.
//!
//! ## Endpoints
//! - `POST /api/chat` - forward a conversation to the model API
//! - `GET /api/health` - liveness check

pub mod chat;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let api_router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/chat", post(chat::chat_handler));

    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
