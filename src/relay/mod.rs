//! # Relay
//!
//! Stateless forwarding of chat conversations to the model provider. The relay
//! attaches the fixed tool manifest and model parameters; it never inspects or
//! rewrites the upstream response.

pub mod client;
pub mod error;
pub mod protocol;

pub use client::AnthropicClient;
pub use error::RelayError;

use protocol::{Message, MessageContent, Role, UpstreamRequest};

use crate::tools;

/// Injected when the client sends an empty conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant with access to various tools. \
When a user asks for something that requires using a tool, use that tool.";

/// Builds the outbound Messages API request.
///
/// `system` messages are lifted into the top-level `system` field; all other
/// messages keep their original order.
pub fn build_upstream_request(
    model: &str,
    max_tokens: u32,
    conversation: Vec<Message>,
) -> UpstreamRequest {
    let mut conversation = conversation;
    if conversation.is_empty() {
        conversation.push(Message::system(DEFAULT_SYSTEM_PROMPT));
    }

    let (system, messages): (Vec<Message>, Vec<Message>) = conversation
        .into_iter()
        .partition(|message| message.role == Role::System);

    let system_text: Vec<String> = system
        .into_iter()
        .filter_map(|message| match message.content {
            MessageContent::Text(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        })
        .collect();

    UpstreamRequest {
        model: model.to_string(),
        max_tokens,
        system: (!system_text.is_empty()).then(|| system_text.join("\n\n")),
        messages,
        tools: tools::manifest(),
    }
}
