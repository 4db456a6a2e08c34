// src/chat/backend.rs

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, error};

use crate::relay::{
    protocol::{ChatRequest, ErrorBody, Message, ModelResponse},
    AnthropicClient, RelayError,
};

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("failed to reach relay: {0}")]
    Relay(#[from] reqwest::Error),
    #[error("relay returned {status}: {details}")]
    Status { status: u16, details: String },
    #[error("unreadable model response: {0}")]
    Decode(String),
    #[error(transparent)]
    Upstream(#[from] RelayError),
}

/// Where the chat session sends its history
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, conversation: &[Message]) -> Result<ModelResponse, ChatError>;
}

/// Talks to the relay's `POST /api/chat` route
#[derive(Clone)]
pub struct RelayClient {
    http: Client,
    url: String,
}

impl RelayClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatBackend for RelayClient {
    async fn complete(&self, conversation: &[Message]) -> Result<ModelResponse, ChatError> {
        let request = ChatRequest {
            conversation: conversation.to_vec(),
        };
        debug!("Sending {} messages to relay at {}", conversation.len(), self.url);

        let response = self.http.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let details = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.details)
                .unwrap_or(body);
            error!("Relay returned {}: {}", status, details);
            return Err(ChatError::Status {
                status: status.as_u16(),
                details,
            });
        }

        response
            .json::<ModelResponse>()
            .await
            .map_err(|e| ChatError::Decode(e.to_string()))
    }
}

/// Skips the relay and calls the model API in-process
#[async_trait]
impl ChatBackend for AnthropicClient {
    async fn complete(&self, conversation: &[Message]) -> Result<ModelResponse, ChatError> {
        let body = self.forward(conversation.to_vec()).await?;
        serde_json::from_value(body).map_err(|e| ChatError::Decode(e.to_string()))
    }
}
