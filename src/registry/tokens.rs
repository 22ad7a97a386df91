//! Token tables per chain and network mode
//!
//! Both tables are exhaustive matches over `ChainId`, so adding a chain
//! without a token list fails to compile. `verify_tables` additionally
//! checks at startup that every list is non-empty and native-first.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

use super::chain::{ChainFamily, ChainId};

/// Contract reference the aggregator uses for a Solana chain's base currency
pub const SOLANA_NATIVE_SENTINEL: &str = "So11111111111111111111111111111111111111112";

/// Contract reference the aggregator uses for an EVM chain's base currency
pub const EVM_NATIVE_SENTINEL: &str = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee";

/// Which set of networks the build talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NetworkMode {
    #[default]
    #[serde(alias = "mainnet")]
    Main,
    #[serde(alias = "testnet")]
    Test,
}

impl NetworkMode {
    pub fn is_test(&self) -> bool {
        matches!(self, NetworkMode::Test)
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkMode::Main => write!(f, "mainnet"),
            NetworkMode::Test => write!(f, "testnet"),
        }
    }
}

/// A tradable token on one chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    pub display_name: &'static str,
    /// Native-asset sentinel or contract/mint address
    pub contract_reference: &'static str,
    pub network_mode: NetworkMode,
}

impl TokenDescriptor {
    const fn main(display_name: &'static str, contract_reference: &'static str) -> Self {
        Self {
            display_name,
            contract_reference,
            network_mode: NetworkMode::Main,
        }
    }

    const fn test(display_name: &'static str, contract_reference: &'static str) -> Self {
        Self {
            display_name,
            contract_reference,
            network_mode: NetworkMode::Test,
        }
    }

    /// True if this descriptor refers to the chain's base currency
    pub fn is_native(&self) -> bool {
        self.contract_reference == SOLANA_NATIVE_SENTINEL
            || self.contract_reference.eq_ignore_ascii_case(EVM_NATIVE_SENTINEL)
    }
}

// Mainnet tables
const MAIN_SOLANA: &[TokenDescriptor] = &[
    TokenDescriptor::main("SOL", SOLANA_NATIVE_SENTINEL),
    TokenDescriptor::main("USDC", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
];
const MAIN_ETHEREUM: &[TokenDescriptor] = &[
    TokenDescriptor::main("ETH", EVM_NATIVE_SENTINEL),
    TokenDescriptor::main("USDC", "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
];
const MAIN_BSC: &[TokenDescriptor] = &[
    TokenDescriptor::main("BNB", EVM_NATIVE_SENTINEL),
    TokenDescriptor::main("USDT", "0x55d398326f99059ff775485246999027b3197955"),
];
const MAIN_AVALANCHE: &[TokenDescriptor] = &[
    TokenDescriptor::main("AVAX", EVM_NATIVE_SENTINEL),
    TokenDescriptor::main("USDC", "0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e"),
];
const MAIN_POLYGON: &[TokenDescriptor] = &[
    TokenDescriptor::main("MATIC", EVM_NATIVE_SENTINEL),
    TokenDescriptor::main("USDC", "0x2791bca1f2de4661ed88a30c99a7a9449aa84174"),
];
const MAIN_ARBITRUM: &[TokenDescriptor] = &[
    TokenDescriptor::main("ETH", EVM_NATIVE_SENTINEL),
    TokenDescriptor::main("USDC", "0xff970a61a04b1ca14834a43f5de4533ebddb5cc8"),
];
const MAIN_OPTIMISM: &[TokenDescriptor] = &[
    TokenDescriptor::main("ETH", EVM_NATIVE_SENTINEL),
    TokenDescriptor::main("USDC", "0x7f5c764cbc14f9669b88837ca1490cca17c31607"),
];
const MAIN_BASE: &[TokenDescriptor] = &[
    TokenDescriptor::main("ETH", EVM_NATIVE_SENTINEL),
    TokenDescriptor::main("USDC", "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"),
];

// Testnet tables (devnet / sepolia where the aggregator supports them)
const TEST_SOLANA: &[TokenDescriptor] = &[
    TokenDescriptor::test("SOL", SOLANA_NATIVE_SENTINEL),
    TokenDescriptor::test("USDC", "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU"),
];
const TEST_ETHEREUM: &[TokenDescriptor] = &[
    TokenDescriptor::test("ETH", EVM_NATIVE_SENTINEL),
    TokenDescriptor::test("USDC", "0x1c7D4B196Cb0C7B01d743Fbc6116a902379C7238"),
];
const TEST_BSC: &[TokenDescriptor] = &[
    TokenDescriptor::test("BNB", EVM_NATIVE_SENTINEL),
    TokenDescriptor::test("USDT", "0x55d398326f99059ff775485246999027b3197955"),
];
const TEST_AVALANCHE: &[TokenDescriptor] = &[
    TokenDescriptor::test("AVAX", EVM_NATIVE_SENTINEL),
    TokenDescriptor::test("USDC", "0xb97ef9ef8734c71904d8002f8b6bc66dd9c48a6e"),
];
const TEST_POLYGON: &[TokenDescriptor] = &[
    TokenDescriptor::test("MATIC", EVM_NATIVE_SENTINEL),
    TokenDescriptor::test("USDC", "0x2791bca1f2de4661ed88a30c99a7a9449aa84174"),
];
const TEST_ARBITRUM: &[TokenDescriptor] = &[
    TokenDescriptor::test("ETH", EVM_NATIVE_SENTINEL),
    TokenDescriptor::test("USDC", "0xff970a61a04b1ca14834a43f5de4533ebddb5cc8"),
];
const TEST_OPTIMISM: &[TokenDescriptor] = &[
    TokenDescriptor::test("ETH", EVM_NATIVE_SENTINEL),
    TokenDescriptor::test("USDC", "0x7f5c764cbc14f9669b88837ca1490cca17c31607"),
];
const TEST_BASE: &[TokenDescriptor] = &[
    TokenDescriptor::test("ETH", EVM_NATIVE_SENTINEL),
    TokenDescriptor::test("USDC", "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913"),
];

/// Ordered token list for a chain; the first entry is always the native asset
pub fn tokens_for(chain: ChainId, mode: NetworkMode) -> &'static [TokenDescriptor] {
    match mode {
        NetworkMode::Main => match chain {
            ChainId::Solana => MAIN_SOLANA,
            ChainId::Ethereum => MAIN_ETHEREUM,
            ChainId::Bsc => MAIN_BSC,
            ChainId::Avalanche => MAIN_AVALANCHE,
            ChainId::Polygon => MAIN_POLYGON,
            ChainId::Arbitrum => MAIN_ARBITRUM,
            ChainId::Optimism => MAIN_OPTIMISM,
            ChainId::Base => MAIN_BASE,
        },
        NetworkMode::Test => match chain {
            ChainId::Solana => TEST_SOLANA,
            ChainId::Ethereum => TEST_ETHEREUM,
            ChainId::Bsc => TEST_BSC,
            ChainId::Avalanche => TEST_AVALANCHE,
            ChainId::Polygon => TEST_POLYGON,
            ChainId::Arbitrum => TEST_ARBITRUM,
            ChainId::Optimism => TEST_OPTIMISM,
            ChainId::Base => TEST_BASE,
        },
    }
}

/// Native asset of a chain under the given mode
pub fn native_token(chain: ChainId, mode: NetworkMode) -> TokenDescriptor {
    // Non-empty by construction, checked by verify_tables at startup
    tokens_for(chain, mode)[0]
}

/// Look up a token on a chain by display name (case-insensitive)
pub fn find_token(chain: ChainId, mode: NetworkMode, name: &str) -> Option<TokenDescriptor> {
    tokens_for(chain, mode)
        .iter()
        .find(|t| t.display_name.eq_ignore_ascii_case(name.trim()))
        .copied()
}

/// Check that every (chain, mode) list is non-empty, native-first,
/// and tagged with the mode it is served under
pub fn verify_tables() -> Result<()> {
    for mode in [NetworkMode::Main, NetworkMode::Test] {
        for chain in ChainId::ALL {
            let tokens = tokens_for(chain, mode);
            let first = tokens.first().ok_or_else(|| {
                Error::Config(format!("No tokens registered for {} on {}", chain, mode))
            })?;

            let expected_native = match chain.family() {
                ChainFamily::Solana => first.contract_reference == SOLANA_NATIVE_SENTINEL,
                ChainFamily::Evm => first
                    .contract_reference
                    .eq_ignore_ascii_case(EVM_NATIVE_SENTINEL),
            };
            if !expected_native {
                return Err(Error::Config(format!(
                    "First token for {} on {} is {}, expected the native asset",
                    chain, mode, first.display_name
                )));
            }

            if let Some(t) = tokens.iter().find(|t| t.network_mode != mode) {
                return Err(Error::Config(format!(
                    "Token {} on {} is tagged {} but listed under {}",
                    t.display_name, chain, t.network_mode, mode
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_verified() {
        verify_tables().unwrap();
    }

    #[test]
    fn test_every_chain_native_first() {
        for mode in [NetworkMode::Main, NetworkMode::Test] {
            for chain in ChainId::ALL {
                let tokens = tokens_for(chain, mode);
                assert!(!tokens.is_empty(), "{} {}", chain, mode);
                assert!(tokens[0].is_native(), "{} {}", chain, mode);
                assert_eq!(tokens[0].display_name, chain.native_symbol());
            }
        }
    }

    #[test]
    fn test_find_token() {
        let usdc = find_token(ChainId::Solana, NetworkMode::Main, "usdc").unwrap();
        assert_eq!(
            usdc.contract_reference,
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
        );
        let devnet_usdc = find_token(ChainId::Solana, NetworkMode::Test, "USDC").unwrap();
        assert_ne!(devnet_usdc.contract_reference, usdc.contract_reference);
        assert!(find_token(ChainId::Bsc, NetworkMode::Main, "USDC").is_none());
    }

    #[test]
    fn test_network_mode_deserialize() {
        let mode: NetworkMode = serde_json::from_str("\"testnet\"").unwrap();
        assert_eq!(mode, NetworkMode::Test);
        let mode: NetworkMode = serde_json::from_str("\"main\"").unwrap();
        assert_eq!(mode, NetworkMode::Main);
    }
}
