// src/api/chat.rs

use axum::{extract::State, Json};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    relay::{protocol::ChatRequest, RelayError},
    AppState,
};

/// `POST /api/chat`: forwards the conversation and returns the model's
/// response body unchanged.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<Value>, RelayError> {
    info!("Received chat request with {} messages", request.conversation.len());

    let response = state.anthropic.forward(request.conversation).await?;
    debug!("Relaying model response {}", response.get("id").and_then(serde_json::Value::as_str).unwrap_or("-"));

    Ok(Json(response))
}
