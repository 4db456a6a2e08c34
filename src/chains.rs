//! Static list of supported EVM networks and name -> chain id resolution.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chain {
    pub name: &'static str,
    pub id: u64,
    #[serde(skip)]
    pub aliases: &'static [&'static str],
}

pub const SUPPORTED_CHAINS: &[Chain] = &[
    Chain { name: "Ethereum", id: 1, aliases: &["mainnet", "eth", "ethereum mainnet"] },
    Chain { name: "Sepolia", id: 11_155_111, aliases: &["ethereum sepolia", "sepolia testnet"] },
    Chain { name: "Holesky", id: 17_000, aliases: &["holesky testnet"] },
    Chain { name: "Optimism", id: 10, aliases: &["op", "op mainnet", "optimism mainnet"] },
    Chain { name: "BNB Smart Chain", id: 56, aliases: &["bsc", "bnb", "binance smart chain"] },
    Chain { name: "Polygon", id: 137, aliases: &["matic", "polygon pos"] },
    Chain { name: "zkSync", id: 324, aliases: &["zksync era", "zk"] },
    Chain { name: "Base", id: 8453, aliases: &["base mainnet"] },
    Chain { name: "Arbitrum", id: 42_161, aliases: &["arbitrum one", "arb"] },
    Chain { name: "Avalanche", id: 43_114, aliases: &["avax", "avalanche c-chain"] },
    Chain { name: "Gnosis", id: 100, aliases: &["xdai", "gnosis chain"] },
];

// Case and separator insensitive: "Arbitrum_One" and "arbitrum one" compare equal.
fn normalize_name(input: &str) -> String {
    let s = input.trim().to_lowercase().replace(['_', '-'], " ");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolve a network name (or alias) to its chain id.
pub fn chain_id_for_name(name: &str) -> Option<u64> {
    chain_by_name(name).map(|chain| chain.id)
}

pub fn chain_by_name(name: &str) -> Option<&'static Chain> {
    let wanted = normalize_name(name);
    if wanted.is_empty() {
        return None;
    }
    SUPPORTED_CHAINS.iter().find(|chain| {
        normalize_name(chain.name) == wanted
            || chain.aliases.iter().any(|alias| normalize_name(alias) == wanted)
    })
}

pub fn chain_by_id(id: u64) -> Option<&'static Chain> {
    SUPPORTED_CHAINS.iter().find(|chain| chain.id == id)
}

pub fn supported_chains() -> &'static [Chain] {
    SUPPORTED_CHAINS
}
