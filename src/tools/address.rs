use serde_json::{json, Value};

use crate::{utils, wallet::WalletProvider};

/// `get_wallet_address`: checksummed connected account, or null
pub async fn get_wallet_address(wallet: &dyn WalletProvider) -> Value {
    json!(wallet.account().await.map(|address| utils::checksum(&address)))
}
