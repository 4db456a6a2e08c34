// src/tools/transfer.rs

use std::time::Duration;

use ethers::{types::U256, utils::parse_ether};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use super::{
    balance::{resolve_chain, ChainLookupError},
    SendEthInput,
};
use crate::{
    utils,
    wallet::{TxReceipt, WalletError, WalletProvider},
};

/// Why a transfer did not go through. Reported to the model as
/// `{success: false, result: <message>}`.
#[derive(Error, Debug)]
pub enum SendEthError {
    #[error("Recipient address for ETH transfer is undefined or empty")]
    MissingRecipient,
    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),
    #[error("Value for ETH transfer is undefined or empty")]
    MissingValue,
    #[error("Invalid value for ETH transfer: {0}")]
    InvalidValue(String),
    #[error("Value for ETH transfer must be greater than 0")]
    NonPositiveValue,
    #[error("Unsupported chain: {0}")]
    UnknownChain(String),
    #[error("No chain specified and no active chain")]
    NoChain,
    #[error("Wallet is not connected")]
    NotConnected,
    #[error("Network switching not supported")]
    SwitchingUnsupported,
    #[error("Timed out waiting for network switch to chain {0}")]
    SwitchTimeout(u64),
    #[error("{0}")]
    Wallet(#[from] WalletError),
}

impl From<ChainLookupError> for SendEthError {
    fn from(err: ChainLookupError) -> Self {
        match err {
            ChainLookupError::Unknown(name) => SendEthError::UnknownChain(name),
            ChainLookupError::Missing => SendEthError::NoChain,
        }
    }
}

/// `send_eth`: never fails as a tool call; every failure becomes a
/// structured `{success: false}` result.
pub async fn send_eth(
    wallet: &dyn WalletProvider,
    input: &SendEthInput,
    switch_timeout: Duration,
) -> Value {
    match transfer(wallet, input, switch_timeout).await {
        Ok(receipt) => json!({ "success": true, "result": receipt }),
        Err(e) => {
            warn!("send_eth failed: {}", e);
            json!({ "success": false, "result": e.to_string() })
        }
    }
}

/// Parse a decimal ETH amount into wei. Zero and negative amounts are rejected.
pub fn parse_amount(raw: &str) -> Result<U256, SendEthError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SendEthError::MissingValue);
    }
    if raw.starts_with('-') {
        return Err(SendEthError::NonPositiveValue);
    }

    let wei = parse_ether(raw).map_err(|_| SendEthError::InvalidValue(raw.to_string()))?;
    if wei.is_zero() {
        return Err(SendEthError::NonPositiveValue);
    }
    Ok(wei)
}

async fn transfer(
    wallet: &dyn WalletProvider,
    input: &SendEthInput,
    switch_timeout: Duration,
) -> Result<TxReceipt, SendEthError> {
    let to_raw = input
        .to
        .as_deref()
        .filter(|to| !to.trim().is_empty())
        .ok_or(SendEthError::MissingRecipient)?;
    let to = utils::parse_address(to_raw)
        .map_err(|_| SendEthError::InvalidRecipient(to_raw.trim().to_string()))?;

    let value = input.value.as_ref().ok_or(SendEthError::MissingValue)?;
    let wei = parse_amount(&value.as_decimal_string())?;

    let target = resolve_chain(wallet, input.chain_name.as_deref(), input.chain_id).await?;

    if wallet.account().await.is_none() {
        return Err(SendEthError::NotConnected);
    }

    if wallet.chain_id().await != Some(target) {
        ensure_chain(wallet, target, switch_timeout).await?;
    }

    info!("Sending {} wei to {:?} on chain {}", wei, to, target);
    let hash = wallet.send_transaction(target, to, wei).await?;
    Ok(wallet.wait_for_receipt(target, hash).await?)
}

/// Switch the wallet to `target` and wait for the change to be observed.
async fn ensure_chain(
    wallet: &dyn WalletProvider,
    target: u64,
    timeout: Duration,
) -> Result<(), SendEthError> {
    if !wallet.supports_switching() {
        return Err(SendEthError::SwitchingUnsupported);
    }

    // Subscribe before requesting the switch so the change cannot be missed
    let receiver = wallet.subscribe_chain();
    wallet.switch_chain(target).await?;
    wait_for_chain(receiver, target, timeout).await
}

pub async fn wait_for_chain(
    mut receiver: watch::Receiver<Option<u64>>,
    target: u64,
    timeout: Duration,
) -> Result<(), SendEthError> {
    let switched = tokio::time::timeout(timeout, receiver.wait_for(|chain| *chain == Some(target)))
        .await
        .map(|result| result.is_ok())
        .unwrap_or(false);

    if switched {
        Ok(())
    } else {
        Err(SendEthError::SwitchTimeout(target))
    }
}
