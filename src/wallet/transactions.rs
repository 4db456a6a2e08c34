// src/wallet/transactions.rs

use std::time::Duration;

use ethers::{
    providers::{Http, Middleware, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Address, TransactionReceipt, TransactionRequest,
        H256, U256, U64,
    },
};
use tracing::{debug, info, warn};

use super::{nonce_manager::NonceManager, TxReceipt, TxStatus, WalletError};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Signs and broadcasts a plain value transfer.
/// Nonces come from the shared `NonceManager`; gas and gas price come from the node.
pub async fn send_value_transfer(
    provider: &Provider<Http>,
    chain_id: u64,
    wallet: &LocalWallet,
    to: Address,
    value: U256,
    nonce_manager: &NonceManager,
) -> Result<H256, WalletError> {
    let from = wallet.address();
    let nonce = nonce_manager.get_next_nonce(chain_id, from, provider).await?;

    let mut tx: TypedTransaction = TransactionRequest::new()
        .from(from)
        .to(to)
        .value(value)
        .nonce(nonce)
        .chain_id(chain_id)
        .into();

    let result = async {
        let gas = provider.estimate_gas(&tx, None).await?;
        tx.set_gas(gas);
        let gas_price = provider.get_gas_price().await?;
        tx.set_gas_price(gas_price);
        debug!(?from, ?to, %value, %gas, %gas_price, %nonce, chain_id, "Signing transfer");

        let signer = wallet.clone().with_chain_id(chain_id);
        let signature = signer
            .sign_transaction(&tx)
            .await
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        let raw_tx = tx.rlp_signed(&signature);

        let pending = provider.send_raw_transaction(raw_tx).await?;
        Ok::<H256, WalletError>(pending.tx_hash())
    }
    .await;

    match result {
        Ok(hash) => {
            info!("Broadcast transfer {:?} on chain {}", hash, chain_id);
            Ok(hash)
        }
        Err(e) => {
            // The nonce may not have been consumed; refetch it next time.
            nonce_manager.reset(chain_id, from);
            Err(e)
        }
    }
}

/// Waits for `hash` to be mined, bounded by `timeout`.
pub async fn wait_for_receipt(
    provider: &Provider<Http>,
    hash: H256,
    timeout: Duration,
) -> Result<TxReceipt, WalletError> {
    let pending = PendingTransaction::new(hash, provider).interval(RECEIPT_POLL_INTERVAL);

    match tokio::time::timeout(timeout, pending).await {
        Ok(Ok(Some(receipt))) => Ok(to_tx_receipt(&receipt)),
        Ok(Ok(None)) => Err(WalletError::Dropped(hash)),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => {
            warn!("No receipt for {:?} after {:?}", hash, timeout);
            Err(WalletError::ReceiptTimeout(hash))
        }
    }
}

pub fn to_tx_receipt(receipt: &TransactionReceipt) -> TxReceipt {
    let status = if receipt.status == Some(U64::one()) {
        TxStatus::Success
    } else {
        TxStatus::Reverted
    };

    TxReceipt {
        hash: receipt.transaction_hash,
        status,
        block_number: receipt.block_number.map(|n| n.as_u64()),
        transaction_index: receipt.transaction_index.as_u64(),
    }
}
