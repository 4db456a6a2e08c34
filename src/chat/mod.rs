//! # Chat client
//!
//! Keeps the visible conversation, sends it to a [`ChatBackend`] (normally the
//! relay), and runs the tool loop: every `tool_use` block in a response is
//! executed by the [`ToolDispatcher`](crate::tools::ToolDispatcher) and its
//! result sent back until the model answers in plain text.

pub mod backend;
pub mod conversation;
pub mod repl;
pub mod session;
pub mod usage;

pub use backend::{ChatBackend, ChatError, RelayClient};
pub use conversation::{normalize, Conversation};
pub use session::{ChatSession, TurnOutcome};
pub use usage::TokenUsage;
