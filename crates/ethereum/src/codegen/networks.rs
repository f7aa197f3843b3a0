//! Known EVM networks and their public endpoints

use serde::Serialize;

/// Static description of an EVM network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    /// Registry key, e.g. `mainnet`
    pub key: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub chain_id: u64,
    /// Default public RPC endpoint
    pub rpc_url: &'static str,
    /// Block explorer base URL
    pub explorer_url: &'static str,
    /// Native currency symbol
    pub currency: &'static str,
}

pub const KNOWN_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        key: "mainnet",
        name: "Ethereum Mainnet",
        chain_id: 1,
        rpc_url: "https://eth.llamarpc.com",
        explorer_url: "https://etherscan.io",
        currency: "ETH",
    },
    NetworkInfo {
        key: "sepolia",
        name: "Sepolia Testnet",
        chain_id: 11155111,
        rpc_url: "https://rpc.sepolia.org",
        explorer_url: "https://sepolia.etherscan.io",
        currency: "ETH",
    },
    NetworkInfo {
        key: "holesky",
        name: "Holesky Testnet",
        chain_id: 17000,
        rpc_url: "https://ethereum-holesky-rpc.publicnode.com",
        explorer_url: "https://holesky.etherscan.io",
        currency: "ETH",
    },
    NetworkInfo {
        key: "polygon",
        name: "Polygon PoS",
        chain_id: 137,
        rpc_url: "https://polygon-rpc.com",
        explorer_url: "https://polygonscan.com",
        currency: "POL",
    },
    NetworkInfo {
        key: "amoy",
        name: "Polygon Amoy Testnet",
        chain_id: 80002,
        rpc_url: "https://rpc-amoy.polygon.technology",
        explorer_url: "https://amoy.polygonscan.com",
        currency: "POL",
    },
    NetworkInfo {
        key: "arbitrum",
        name: "Arbitrum One",
        chain_id: 42161,
        rpc_url: "https://arb1.arbitrum.io/rpc",
        explorer_url: "https://arbiscan.io",
        currency: "ETH",
    },
    NetworkInfo {
        key: "optimism",
        name: "OP Mainnet",
        chain_id: 10,
        rpc_url: "https://mainnet.optimism.io",
        explorer_url: "https://optimistic.etherscan.io",
        currency: "ETH",
    },
    NetworkInfo {
        key: "base",
        name: "Base",
        chain_id: 8453,
        rpc_url: "https://mainnet.base.org",
        explorer_url: "https://basescan.org",
        currency: "ETH",
    },
    NetworkInfo {
        key: "bsc",
        name: "BNB Smart Chain",
        chain_id: 56,
        rpc_url: "https://bsc-dataseed.binance.org",
        explorer_url: "https://bscscan.com",
        currency: "BNB",
    },
    NetworkInfo {
        key: "avalanche",
        name: "Avalanche C-Chain",
        chain_id: 43114,
        rpc_url: "https://api.avax.network/ext/bc/C/rpc",
        explorer_url: "https://snowtrace.io",
        currency: "AVAX",
    },
    NetworkInfo {
        key: "localhost",
        name: "Local Development Node",
        chain_id: 31337,
        rpc_url: "http://127.0.0.1:8545",
        explorer_url: "",
        currency: "ETH",
    },
];

const ALIASES: &[(&str, &str)] = &[
    ("ethereum", "mainnet"),
    ("eth", "mainnet"),
    ("matic", "polygon"),
    ("arbitrum-one", "arbitrum"),
    ("op", "optimism"),
    ("bnb", "bsc"),
    ("avax", "avalanche"),
    ("local", "localhost"),
    ("anvil", "localhost"),
    ("hardhat", "localhost"),
];

/// Look up a network by key or common alias, case-insensitively
pub fn lookup(network: &str) -> Option<&'static NetworkInfo> {
    let key = network.trim().to_lowercase();
    let key = ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, target)| *target)
        .unwrap_or(key.as_str());

    KNOWN_NETWORKS.iter().find(|info| info.key == key)
}

/// Network keys end up in environment variable names and file contents
pub fn is_valid_network_key(network: &str) -> bool {
    !network.is_empty()
        && network
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
