// src/tools/balance.rs

use ethers::utils::format_ether;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::{GetBalanceInput, ToolError};
use crate::{chains, utils, wallet::WalletProvider};

#[derive(Debug, Clone, Serialize)]
pub struct BalanceOutput {
    pub address: String,
    pub chain_id: u64,
    /// Balance in wei as a decimal string
    pub wei: String,
    pub formatted: String,
    pub symbol: &'static str,
    pub decimals: u8,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChainLookupError {
    #[error("Unsupported chain: {0}")]
    Unknown(String),
    #[error("No chain specified and no active chain")]
    Missing,
}

impl From<ChainLookupError> for ToolError {
    fn from(err: ChainLookupError) -> Self {
        match err {
            ChainLookupError::Unknown(name) => ToolError::UnknownChain(name),
            ChainLookupError::Missing => ToolError::NoChain,
        }
    }
}

/// Resolve the chain a request targets: explicit name, then explicit id,
/// then the wallet's active chain.
pub async fn resolve_chain(
    wallet: &dyn WalletProvider,
    chain_name: Option<&str>,
    chain_id: Option<u64>,
) -> Result<u64, ChainLookupError> {
    if let Some(name) = chain_name.filter(|name| !name.trim().is_empty()) {
        return chains::chain_id_for_name(name)
            .ok_or_else(|| ChainLookupError::Unknown(name.to_string()));
    }
    if let Some(id) = chain_id {
        return Ok(id);
    }
    wallet.chain_id().await.ok_or(ChainLookupError::Missing)
}

/// `get_balance`: native balance of the given (or connected) address
pub async fn get_balance(
    wallet: &dyn WalletProvider,
    input: &GetBalanceInput,
) -> Result<BalanceOutput, ToolError> {
    let chain_id = resolve_chain(wallet, input.chain_name.as_deref(), input.chain_id).await?;

    let address = match input.address.as_deref().filter(|a| !a.trim().is_empty()) {
        Some(raw) => utils::parse_address(raw)?,
        None => wallet.account().await.ok_or(ToolError::NoAddress)?,
    };

    debug!("Fetching balance of {:?} on chain {}", address, chain_id);
    let wei = wallet.get_balance(chain_id, address).await?;

    Ok(BalanceOutput {
        address: utils::checksum(&address),
        chain_id,
        wei: wei.to_string(),
        formatted: format_ether(wei),
        symbol: "ETH",
        decimals: 18,
    })
}
