// src/config.rs

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use secrecy::SecretString;
use url::Url;

pub const DEFAULT_ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
pub const DEFAULT_CHAT_PROMPT: &str = "You are a helpful AI assistant.";

// A struct to hold all configuration, loaded once at startup from the .env file.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,

    // Model provider settings
    pub anthropic_api_key: SecretString,
    pub anthropic_api_url: String,
    pub anthropic_version: String,
    pub model: String,
    pub max_tokens: u32,
    pub relay_timeout: Duration,

    // Chat client settings
    pub relay_url: String,
    pub system_prompt: String,
    pub max_tool_rounds: usize,

    /// RPC endpoint per chain id, e.g. `{"1": "https://eth.llamarpc.com"}`
    pub chain_rpc_urls: HashMap<u64, String>,
    pub default_chain_id: u64,

    // Wallet settings
    pub wallet_private_key: Option<SecretString>,
    pub session_path: PathBuf,
    pub network_switch_timeout: Duration,
    pub receipt_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        let port = 3000;
        Self {
            port,
            anthropic_api_key: SecretString::new(String::new()),
            anthropic_api_url: DEFAULT_ANTHROPIC_API_URL.to_string(),
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1000,
            relay_timeout: Duration::from_secs(60),
            relay_url: default_relay_url(port),
            system_prompt: DEFAULT_CHAT_PROMPT.to_string(),
            max_tool_rounds: 8,
            chain_rpc_urls: HashMap::from([(1, "https://eth.llamarpc.com".to_string())]),
            default_chain_id: 1,
            wallet_private_key: None,
            session_path: default_session_path(),
            network_switch_timeout: Duration::from_secs(10),
            receipt_timeout: Duration::from_secs(120),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let port: u16 = parse_var("PORT", defaults.port)?;

        let anthropic_api_url = env::var("ANTHROPIC_API_URL").unwrap_or(defaults.anthropic_api_url);
        Url::parse(&anthropic_api_url).context("ANTHROPIC_API_URL must be a valid URL")?;

        let relay_url = env::var("RELAY_URL").unwrap_or_else(|_| default_relay_url(port));
        Url::parse(&relay_url).context("RELAY_URL must be a valid URL")?;

        let chain_rpc_urls = match env::var("CHAIN_RPC_URLS") {
            Ok(raw) => parse_chain_rpc_urls(&raw)?,
            Err(_) => defaults.chain_rpc_urls,
        };

        let default_chain_id = parse_var("DEFAULT_CHAIN_ID", defaults.default_chain_id)?;
        if !chain_rpc_urls.contains_key(&default_chain_id) {
            anyhow::bail!(
                "DEFAULT_CHAIN_ID {} has no entry in CHAIN_RPC_URLS",
                default_chain_id
            );
        }

        let session_path = env::var("SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_path);

        Ok(Config {
            port,
            anthropic_api_key: SecretString::new(env::var("ANTHROPIC_API_KEY").unwrap_or_default()),
            anthropic_api_url,
            anthropic_version: env::var("ANTHROPIC_VERSION").unwrap_or(defaults.anthropic_version),
            model: env::var("ANTHROPIC_MODEL").unwrap_or(defaults.model),
            max_tokens: parse_var("ANTHROPIC_MAX_TOKENS", defaults.max_tokens)?,
            relay_timeout: Duration::from_secs(parse_var("RELAY_TIMEOUT_SECS", 60)?),
            relay_url,
            system_prompt: env::var("SYSTEM_PROMPT").unwrap_or(defaults.system_prompt),
            max_tool_rounds: parse_var("MAX_TOOL_ROUNDS", defaults.max_tool_rounds)?,
            chain_rpc_urls,
            default_chain_id,
            wallet_private_key: env::var("WALLET_PRIVATE_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(SecretString::new),
            session_path,
            network_switch_timeout: Duration::from_secs(parse_var(
                "NETWORK_SWITCH_TIMEOUT_SECS",
                10,
            )?),
            receipt_timeout: Duration::from_secs(parse_var("RECEIPT_TIMEOUT_SECS", 120)?),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}

/// Parses a JSON map of chain id -> RPC URL. Keys are strings in JSON.
pub fn parse_chain_rpc_urls(raw: &str) -> Result<HashMap<u64, String>> {
    let by_name: HashMap<String, String> = serde_json::from_str(raw)
        .context("CHAIN_RPC_URLS must be a JSON map of chain_id -> RPC URL")?;

    by_name
        .into_iter()
        .map(|(chain_id, url)| {
            let id = chain_id
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid chain id '{}' in CHAIN_RPC_URLS", chain_id))?;
            Url::parse(&url).with_context(|| format!("Invalid RPC URL for chain {}", id))?;
            Ok((id, url))
        })
        .collect()
}

fn default_relay_url(port: u16) -> String {
    format!("http://127.0.0.1:{}/api/chat", port)
}

fn default_session_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".wallet-chat");
    path.push("session.json");
    path
}
