// src/chat/session.rs

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    backend::{ChatBackend, ChatError},
    conversation::Conversation,
    usage::TokenUsage,
};
use crate::{
    relay::protocol::{Message, Role},
    tools::{ToolDispatcher, ToolResult},
};

/// What one user turn produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// Visible assistant text, `None` when the model only called tools
    pub reply: Option<String>,
    /// Every tool result sent back during the turn, in order
    pub tool_results: Vec<ToolResult>,
    /// Tool round-trips performed
    pub rounds: usize,
}

/// Client side of the chat: owns the visible conversation and runs the
/// tool loop for each user turn.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    dispatcher: ToolDispatcher,
    conversation: Conversation,
    usage: TokenUsage,
    max_tool_rounds: usize,
}

impl ChatSession {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        dispatcher: ToolDispatcher,
        system_prompt: Option<String>,
        max_tool_rounds: usize,
    ) -> Self {
        Self {
            backend,
            dispatcher,
            conversation: Conversation::new(system_prompt),
            usage: TokenUsage::default(),
            max_tool_rounds,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    pub fn reset(&mut self) {
        self.conversation.reset();
        self.usage = TokenUsage::default();
        info!("Conversation reset");
    }

    /// Send one user message and run tool round-trips until the model
    /// answers without requesting a tool.
    ///
    /// On a backend error the user message stays in the conversation and no
    /// assistant message is added; the next send merges the two user turns.
    pub async fn send_message(&mut self, text: &str) -> Result<TurnOutcome, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(TurnOutcome::default());
        }

        self.conversation.push_user(text);
        // tool exchanges live only in this working copy
        let mut history = self.conversation.to_request();

        let mut replies: Vec<String> = Vec::new();
        let mut tool_results = Vec::new();
        let mut rounds = 0;

        loop {
            let response = self.backend.complete(&history).await?;
            if let Some(usage) = &response.usage {
                self.usage.record(usage);
            }

            replies.extend(
                response
                    .text_segments()
                    .filter(|segment| !segment.trim().is_empty())
                    .map(str::to_string),
            );

            let invocations: Vec<_> = response.tool_uses().collect();
            if invocations.is_empty() {
                break;
            }
            if rounds >= self.max_tool_rounds {
                warn!(
                    "Model still requesting tools after {} rounds, stopping",
                    self.max_tool_rounds
                );
                break;
            }
            rounds += 1;

            let mut results = Vec::with_capacity(invocations.len());
            for invocation in invocations {
                results.push(self.dispatcher.execute(invocation).await);
            }
            debug!("Round {}: {} tool results", rounds, results.len());

            history.push(Message::blocks(Role::Assistant, response.to_content_blocks()));
            history.push(Message::blocks(
                Role::User,
                results.iter().cloned().map(ToolResult::into_block).collect(),
            ));
            tool_results.extend(results);
        }

        let reply = replies.join("\n\n");
        let reply = if reply.is_empty() {
            None
        } else {
            self.conversation.push_assistant(reply.clone());
            Some(reply)
        };

        Ok(TurnOutcome {
            reply,
            tool_results,
            rounds,
        })
    }
}
