// src/wallet/mod.rs

//! Wallet capability consumed by the tool dispatcher.
//!
//! The dispatcher only talks to [`WalletProvider`]; the crate ships an
//! ethers-backed implementation in [`local`].

pub mod local;
pub mod nonce_manager;
pub mod session;
pub mod transactions;

pub use local::LocalWalletProvider;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("no signing key configured")]
    NoSigner,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("chain {0} is not configured")]
    UnsupportedChain(u64),
    #[error("RPC for chain {expected} reports chain id {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
    #[error("provider error: {0}")]
    Provider(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("timed out waiting for receipt of {0:?}")]
    ReceiptTimeout(H256),
    #[error("transaction {0:?} was dropped from the mempool")]
    Dropped(H256),
    #[error("session storage error: {0}")]
    Storage(String),
}

impl From<ethers::providers::ProviderError> for WalletError {
    fn from(err: ethers::providers::ProviderError) -> Self {
        WalletError::Provider(err.to_string())
    }
}

/// Outcome of a mined transaction, as reported back to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub hash: H256,
    pub status: TxStatus,
    /// Decimal string; block numbers exceed JSON's safe integer range on some chains
    #[serde(serialize_with = "serialize_opt_decimal")]
    pub block_number: Option<u64>,
    pub transaction_index: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Reverted,
}

fn serialize_opt_decimal<S: serde::Serializer>(
    value: &Option<u64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(n) => serializer.serialize_str(&n.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Capabilities of a connected wallet.
///
/// Chain changes are published on a `watch` channel so callers can await a
/// switch instead of polling.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn connect(&self) -> Result<Address, WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Currently connected account, if any
    async fn account(&self) -> Option<Address>;

    /// Currently active chain, if any
    async fn chain_id(&self) -> Option<u64>;

    fn subscribe_chain(&self) -> watch::Receiver<Option<u64>>;

    fn supports_switching(&self) -> bool;

    /// Request a switch of the active chain. Completion is observed through
    /// [`WalletProvider::subscribe_chain`].
    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    async fn get_balance(&self, chain_id: u64, address: Address) -> Result<U256, WalletError>;

    async fn send_transaction(
        &self,
        chain_id: u64,
        to: Address,
        value: U256,
    ) -> Result<H256, WalletError>;

    async fn wait_for_receipt(&self, chain_id: u64, hash: H256) -> Result<TxReceipt, WalletError>;
}
