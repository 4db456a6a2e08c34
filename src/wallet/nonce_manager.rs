// src/wallet/nonce_manager.rs

use std::sync::Arc;

use dashmap::DashMap;
use ethers::{
    providers::{Http, Middleware, Provider},
    types::{Address, BlockNumber, U256},
};
use tokio::sync::Mutex;

use super::WalletError;

// Manages nonces per (chain, sender) so back-to-back transfers never reuse one.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    // Each sender gets its own state, protected by a Mutex.
    // The DashMap allows concurrent access to different senders.
    nonces: Arc<DashMap<(u64, Address), Arc<Mutex<NonceState>>>>,
}

#[derive(Debug)]
struct NonceState {
    next_nonce: Option<U256>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the next nonce for `address` on `chain_id`.
    /// The pending transaction count is fetched on first use, then incremented locally.
    pub async fn get_next_nonce(
        &self,
        chain_id: u64,
        address: Address,
        provider: &Provider<Http>,
    ) -> Result<U256, WalletError> {
        let address_nonce_lock = self
            .nonces
            .entry((chain_id, address))
            .or_insert_with(|| Arc::new(Mutex::new(NonceState { next_nonce: None })))
            .clone();

        let mut state = address_nonce_lock.lock().await;

        let nonce_to_use = match state.next_nonce {
            Some(nonce) => nonce,
            None => {
                provider
                    .get_transaction_count(address, Some(BlockNumber::Pending.into()))
                    .await?
            }
        };

        state.next_nonce = Some(nonce_to_use + U256::one());

        Ok(nonce_to_use)
    }

    /// Forget the cached nonce, e.g. after a failed broadcast.
    pub fn reset(&self, chain_id: u64, address: Address) {
        self.nonces.remove(&(chain_id, address));
    }
}
