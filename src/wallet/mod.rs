//! Wallet capabilities
//!
//! One `WalletCapability` per chain family:
//! - `SolanaWallet`: local keypair signer, submits through Solana RPC
//! - `EvmWallet`: injected EIP-1193 style provider (accounts + send)
//!
//! The swap workflow never branches on a wallet brand; it asks
//! `WalletSet::for_chain` for whichever capability owns the chain.
//!
//! ```text
//! SwapWorkflow -> WalletSet -> family_of(chain) -> WalletCapability
//!                                                      |
//!                                      SwapTransactionBuilder (aggregator)
//! ```

pub mod evm;
pub mod keypair;
pub mod provider;
pub mod solana;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::quote::SwapOrder;
use crate::registry::{family_of, ChainFamily, ChainId};

pub use evm::EvmWallet;
pub use keypair::load_keypair;
pub use provider::{Eip1193Provider, JsonRpcProvider};
pub use solana::SolanaWallet;

/// Signing capability for one chain family
#[async_trait]
pub trait WalletCapability: Send + Sync {
    /// Family this wallet signs for
    fn family(&self) -> ChainFamily;

    /// Whether the wallet can sign right now
    async fn is_connected(&self) -> bool;

    /// Connected account address, if any
    async fn address(&self) -> Option<String>;

    /// Sign the order's source-chain transaction and submit it,
    /// returning the transaction reference (signature or hash)
    async fn sign_and_submit(&self, order: &SwapOrder) -> Result<String>;
}

/// Wallet capabilities keyed by chain family
#[derive(Clone)]
pub struct WalletSet {
    solana: Arc<dyn WalletCapability>,
    evm: Arc<dyn WalletCapability>,
}

impl WalletSet {
    pub fn new(solana: Arc<dyn WalletCapability>, evm: Arc<dyn WalletCapability>) -> Self {
        Self { solana, evm }
    }

    pub fn for_family(&self, family: ChainFamily) -> &Arc<dyn WalletCapability> {
        match family {
            ChainFamily::Solana => &self.solana,
            ChainFamily::Evm => &self.evm,
        }
    }

    /// Capability owning the given chain
    pub fn for_chain(&self, chain: ChainId) -> &Arc<dyn WalletCapability> {
        self.for_family(family_of(chain))
    }
}

/// Shorten a long address for display: `0x1234...5678`
pub fn shorten_address(address: &str, start_len: usize, end_len: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= start_len + end_len {
        return address.to_string();
    }

    let start: String = chars[..start_len].iter().collect();
    let end: String = chars[chars.len() - end_len..].iter().collect();
    format!("{}...{}", start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWallet(ChainFamily);

    #[async_trait]
    impl WalletCapability for FixedWallet {
        fn family(&self) -> ChainFamily {
            self.0
        }

        async fn is_connected(&self) -> bool {
            true
        }

        async fn address(&self) -> Option<String> {
            None
        }

        async fn sign_and_submit(&self, _order: &SwapOrder) -> Result<String> {
            Ok(String::new())
        }
    }

    #[test]
    fn test_wallet_set_dispatch() {
        let set = WalletSet::new(
            Arc::new(FixedWallet(ChainFamily::Solana)),
            Arc::new(FixedWallet(ChainFamily::Evm)),
        );

        assert_eq!(set.for_chain(ChainId::Solana).family(), ChainFamily::Solana);
        assert_eq!(set.for_chain(ChainId::Base).family(), ChainFamily::Evm);
        assert_eq!(set.for_chain(ChainId::Bsc).family(), ChainFamily::Evm);
    }

    #[test]
    fn test_shorten_address() {
        assert_eq!(
            shorten_address("0x1234567890abcdef1234567890abcdef12345678", 6, 4),
            "0x1234...5678"
        );
        assert_eq!(shorten_address("", 6, 4), "");
        assert_eq!(shorten_address("0x12", 6, 4), "0x12");
    }
}
