use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use super::protocol::ErrorBody;

/// Failures reaching the model API. The conversation itself is never touched.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("request to model API failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model API returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("model API returned an unreadable body: {0}")]
    Decode(String),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: "Error communicating with Anthropic API".to_string(),
            details: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
