//! # Wallet tools
//!
//! The fixed set of tools the model may call. The same [`ToolKind`] enum
//! drives both the manifest the relay advertises and the dispatcher's handler
//! table, so the two cannot drift apart.
//!
//! ## Tools
//! - `get_wallet_address` - connected account, or null
//! - `get_balance` - native balance of an address on a chain
//! - `send_eth` - value transfer from the connected account
//! - `get_chain_id` - chain id for a network name, or null

pub mod address;
pub mod balance;
pub mod chain;
pub mod dispatcher;
pub mod transfer;

pub use dispatcher::{ToolDispatcher, ToolResult};

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{relay::protocol::ToolDescriptor, utils, wallet::WalletError};

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool {0} not found")]
    ToolNotFound(String),
    #[error("Invalid input for {tool}: {reason}")]
    InvalidInput { tool: String, reason: String },
    #[error("No address provided and no wallet connected")]
    NoAddress,
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("No chain specified and no active chain")]
    NoChain,
    #[error("Unsupported chain: {0}")]
    UnknownChain(String),
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("Failed to serialize tool output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    GetWalletAddress,
    GetBalance,
    SendEth,
    GetChainId,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::GetWalletAddress,
        ToolKind::SendEth,
        ToolKind::GetBalance,
        ToolKind::GetChainId,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::GetWalletAddress => "get_wallet_address",
            ToolKind::GetBalance => "get_balance",
            ToolKind::SendEth => "send_eth",
            ToolKind::GetChainId => "get_chain_id",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::GetWalletAddress => "Get the address of the connected Ethereum wallet.",
            ToolKind::GetBalance => {
                "Get the native ETH balance of an Ethereum address. Defaults to the connected \
                 wallet and its active network."
            }
            ToolKind::SendEth => {
                "Send Ethereum (ETH) from the connected wallet to a specified address, \
                 switching networks first if needed."
            }
            ToolKind::GetChainId => "Get the EVM chain ID for a given blockchain network name.",
        }
    }

    pub fn input_schema(self) -> Value {
        match self {
            ToolKind::GetWalletAddress => json!({
                "type": "object",
                "properties": {}
            }),
            ToolKind::GetBalance => json!({
                "type": "object",
                "properties": {
                    "address": {
                        "type": "string",
                        "description": "The Ethereum address to check the balance of \
                                        (defaults to the connected wallet)"
                    },
                    "chain_name": {
                        "type": "string",
                        "description": "The network name, e.g. 'ethereum', 'polygon' (optional)"
                    },
                    "chain_id": {
                        "type": "number",
                        "description": "The EVM chain ID (optional)"
                    }
                }
            }),
            ToolKind::SendEth => json!({
                "type": "object",
                "properties": {
                    "to": {
                        "type": "string",
                        "description": "The Ethereum address to send to"
                    },
                    "value": {
                        "type": "string",
                        "description": "The amount of ETH to send, as a decimal string \
                                        (e.g. '0.01')"
                    },
                    "chain_name": {
                        "type": "string",
                        "description": "The network to send on, e.g. 'sepolia' (optional)"
                    },
                    "chain_id": {
                        "type": "number",
                        "description": "The EVM chain ID (optional)"
                    }
                },
                "required": ["to", "value"]
            }),
            ToolKind::GetChainId => json!({
                "type": "object",
                "properties": {
                    "chain_name": {
                        "type": "string",
                        "description": "The name of the blockchain network \
                                        (e.g., 'ethereum', 'polygon', 'arbitrum')"
                    }
                },
                "required": ["chain_name"]
            }),
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Tool manifest sent with every model request
pub fn manifest() -> Vec<ToolDescriptor> {
    ToolKind::ALL.into_iter().map(ToolKind::descriptor).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GetBalanceInput {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub chain_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SendEthInput {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub value: Option<Amount>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub chain_name: Option<String>,
}

/// ETH amount as the model sent it, either `"0.5"` or `0.5`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(serde_json::Number),
}

impl Amount {
    /// Plain decimal form. Numbers serde_json prints in exponent form
    /// (`5e-7`, `1e21`) are expanded, since `parse_ether` rejects exponents.
    pub fn as_decimal_string(&self) -> String {
        match self {
            Amount::Text(text) => text.trim().to_string(),
            Amount::Number(number) => {
                let printed = number.to_string();
                expand_exponent(&printed).unwrap_or(printed)
            }
        }
    }
}

/// `1.5e-7` -> `0.00000015`. `None` when there is no exponent to expand.
fn expand_exponent(raw: &str) -> Option<String> {
    let (mantissa, exponent) = raw.split_once(['e', 'E'])?;
    let exponent: i64 = exponent.parse().ok()?;

    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{}{}", int_part, frac_part);
    let point = int_part.len() as i64 + exponent;

    let expanded = if point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else if point as usize >= digits.len() {
        format!("{}{}", digits, "0".repeat(point as usize - digits.len()))
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        format!("{}.{}", whole, fraction)
    };
    Some(format!("{}{}", sign, expanded))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GetChainIdInput {
    pub chain_name: String,
}

/// A tool invocation with its input already decoded
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    GetWalletAddress,
    GetBalance(GetBalanceInput),
    SendEth(SendEthInput),
    GetChainId(GetChainIdInput),
}

impl ToolCall {
    pub fn parse(name: &str, input: &Value) -> Result<Self, ToolError> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| ToolError::ToolNotFound(name.to_string()))?;

        Ok(match kind {
            ToolKind::GetWalletAddress => ToolCall::GetWalletAddress,
            ToolKind::GetBalance => ToolCall::GetBalance(utils::parse_tool_input(name, input)?),
            ToolKind::SendEth => ToolCall::SendEth(utils::parse_tool_input(name, input)?),
            ToolKind::GetChainId => ToolCall::GetChainId(utils::parse_tool_input(name, input)?),
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::GetWalletAddress => ToolKind::GetWalletAddress,
            ToolCall::GetBalance(_) => ToolKind::GetBalance,
            ToolCall::SendEth(_) => ToolKind::SendEth,
            ToolCall::GetChainId(_) => ToolKind::GetChainId,
        }
    }
}
