// src/relay/client.rs

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, error};

use super::{build_upstream_request, error::RelayError, protocol::Message};
use crate::config::Config;

/// Forwards conversations to the Anthropic Messages API.
///
/// One pooled `reqwest::Client` is shared by all requests; the client holds no
/// per-conversation state.
#[derive(Clone)]
pub struct AnthropicClient {
    http: Client,
    api_url: String,
    api_key: SecretString,
    api_version: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(config.relay_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_url: config.anthropic_api_url.clone(),
            api_key: config.anthropic_api_key.clone(),
            api_version: config.anthropic_version.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single best-effort forward. The upstream JSON is returned as-is.
    pub async fn forward(&self, conversation: Vec<Message>) -> Result<Value, RelayError> {
        let request = build_upstream_request(&self.model, self.max_tokens, conversation);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Forwarding conversation to model API"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            if let Ok(payload) = serde_json::to_string(&request) {
                tracing::trace!("Outbound payload: {}", payload);
            }
        }

        let response = self
            .http
            .post(&self.api_url)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", &self.api_version)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Model API request failed: {}", e);
                RelayError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Model API returned {}: {}", status, body);
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| RelayError::Decode(e.to_string()))
    }
}
