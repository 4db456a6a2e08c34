// src/lib.rs

// Re-export commonly used types
pub use ethers::types::{Address, H256, U256};

pub mod api;
pub mod chains;
pub mod chat;
pub mod config;
pub mod relay;
pub mod tools;
pub mod utils;
pub mod wallet;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: config::Config,
    /// Client for the model API
    pub anthropic: relay::AnthropicClient,
}

impl AppState {
    pub fn new(config: config::Config) -> Result<Self, relay::RelayError> {
        let anthropic = relay::AnthropicClient::new(&config)?;
        Ok(Self { config, anthropic })
    }
}
