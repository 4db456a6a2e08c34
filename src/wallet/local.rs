// src/wallet/local.rs

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::{
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, H256, U256},
};
use secrecy::ExposeSecret;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use super::{
    nonce_manager::NonceManager, session::SessionStore, transactions, TxReceipt, WalletError,
    WalletProvider,
};
use crate::config::Config;

/// Wallet backed by a locally held signing key and one JSON-RPC endpoint per chain
pub struct LocalWalletProvider {
    providers: HashMap<u64, Arc<Provider<Http>>>,
    /// Key loaded from configuration; `connect` makes it the active account
    signing_key: Option<LocalWallet>,
    connected: RwLock<Option<LocalWallet>>,
    active_chain: watch::Sender<Option<u64>>,
    nonce_manager: NonceManager,
    session: SessionStore,
    receipt_timeout: Duration,
}

impl LocalWalletProvider {
    pub fn new(config: &Config) -> Result<Self, WalletError> {
        let mut providers = HashMap::new();

        for (chain_id, url) in &config.chain_rpc_urls {
            match Provider::<Http>::try_from(url.as_str()) {
                Ok(provider) => {
                    providers.insert(*chain_id, Arc::new(provider));
                }
                Err(e) => warn!(
                    "Failed to create provider for chain {} at {}: {}",
                    chain_id, url, e
                ),
            }
        }

        let signing_key = config
            .wallet_private_key
            .as_ref()
            .map(|key| LocalWallet::from_str(key.expose_secret().trim()))
            .transpose()
            .map_err(|e| WalletError::Signing(format!("invalid WALLET_PRIVATE_KEY: {}", e)))?;

        let initial_chain = providers
            .contains_key(&config.default_chain_id)
            .then_some(config.default_chain_id);
        let (active_chain, _) = watch::channel(initial_chain);

        let session = SessionStore::new(config.session_path.clone());
        debug!("Wallet session file: {}", session.path().display());

        Ok(Self {
            providers,
            signing_key,
            connected: RwLock::new(None),
            active_chain,
            nonce_manager: NonceManager::new(),
            session,
            receipt_timeout: config.receipt_timeout,
        })
    }

    /// Reconnect if the stored session was connected with the configured key.
    /// Returns the restored address.
    pub async fn restore_session(&self) -> Result<Option<Address>, WalletError> {
        let record = self
            .session
            .load()
            .map_err(|e| WalletError::Storage(e.to_string()))?;

        if let Some(chain_id) = record.chain_id.filter(|id| self.providers.contains_key(id)) {
            self.active_chain.send_replace(Some(chain_id));
        }

        let Some(key) = &self.signing_key else {
            return Ok(None);
        };
        if !record.connected || record.address != Some(key.address()) {
            return Ok(None);
        }

        *self.connected.write().await = Some(key.clone());
        info!("Restored wallet session for {:?}", key.address());
        Ok(Some(key.address()))
    }

    fn get_provider(&self, chain_id: u64) -> Result<Arc<Provider<Http>>, WalletError> {
        self.providers
            .get(&chain_id)
            .cloned()
            .ok_or(WalletError::UnsupportedChain(chain_id))
    }
}

#[async_trait]
impl WalletProvider for LocalWalletProvider {
    async fn connect(&self) -> Result<Address, WalletError> {
        let key = self.signing_key.clone().ok_or(WalletError::NoSigner)?;
        let address = key.address();
        *self.connected.write().await = Some(key);

        let chain_id = *self.active_chain.borrow();
        self.session
            .record_connected(address, chain_id)
            .map_err(|e| WalletError::Storage(e.to_string()))?;

        info!("Wallet connected: {:?}", address);
        Ok(address)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        *self.connected.write().await = None;
        self.session
            .clear()
            .map_err(|e| WalletError::Storage(e.to_string()))?;
        info!("Wallet disconnected");
        Ok(())
    }

    async fn account(&self) -> Option<Address> {
        self.connected.read().await.as_ref().map(|wallet| wallet.address())
    }

    async fn chain_id(&self) -> Option<u64> {
        *self.active_chain.borrow()
    }

    fn subscribe_chain(&self) -> watch::Receiver<Option<u64>> {
        self.active_chain.subscribe()
    }

    fn supports_switching(&self) -> bool {
        self.providers.len() > 1
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        let provider = self.get_provider(chain_id)?;

        let actual = provider.get_chainid().await?.as_u64();
        if actual != chain_id {
            return Err(WalletError::ChainMismatch {
                expected: chain_id,
                actual,
            });
        }

        self.active_chain.send_replace(Some(chain_id));
        if let Err(e) = self.session.record_chain(chain_id) {
            warn!("Failed to persist active chain {}: {}", chain_id, e);
        }
        info!("Switched active chain to {}", chain_id);
        Ok(())
    }

    async fn get_balance(&self, chain_id: u64, address: Address) -> Result<U256, WalletError> {
        let provider = self.get_provider(chain_id)?;
        Ok(provider.get_balance(address, None).await?)
    }

    async fn send_transaction(
        &self,
        chain_id: u64,
        to: Address,
        value: U256,
    ) -> Result<H256, WalletError> {
        let wallet = self
            .connected
            .read()
            .await
            .clone()
            .ok_or(WalletError::NotConnected)?;
        let provider = self.get_provider(chain_id)?;

        transactions::send_value_transfer(
            &provider,
            chain_id,
            &wallet,
            to,
            value,
            &self.nonce_manager,
        )
        .await
    }

    async fn wait_for_receipt(&self, chain_id: u64, hash: H256) -> Result<TxReceipt, WalletError> {
        let provider = self.get_provider(chain_id)?;
        transactions::wait_for_receipt(&provider, hash, self.receipt_timeout).await
    }
}
