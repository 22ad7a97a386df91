//! Supported chains and their wallet families

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Supported networks, one per chain the aggregator can route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Solana,
    Ethereum,
    Bsc,
    Avalanche,
    Polygon,
    Arbitrum,
    Optimism,
    Base,
}

impl ChainId {
    /// Every supported chain, in display order
    pub const ALL: [ChainId; 8] = [
        ChainId::Solana,
        ChainId::Ethereum,
        ChainId::Bsc,
        ChainId::Avalanche,
        ChainId::Polygon,
        ChainId::Arbitrum,
        ChainId::Optimism,
        ChainId::Base,
    ];

    /// Wire identifier used by the quote aggregator
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Solana => "solana",
            ChainId::Ethereum => "ethereum",
            ChainId::Bsc => "bsc",
            ChainId::Avalanche => "avalanche",
            ChainId::Polygon => "polygon",
            ChainId::Arbitrum => "arbitrum",
            ChainId::Optimism => "optimism",
            ChainId::Base => "base",
        }
    }

    /// Human-readable chain name
    pub fn display_name(&self) -> &'static str {
        match self {
            ChainId::Solana => "Solana",
            ChainId::Ethereum => "Ethereum",
            ChainId::Bsc => "Binance Smart Chain",
            ChainId::Avalanche => "Avalanche",
            ChainId::Polygon => "Polygon",
            ChainId::Arbitrum => "Arbitrum",
            ChainId::Optimism => "Optimism",
            ChainId::Base => "Base",
        }
    }

    /// Symbol of the chain's gas asset
    pub fn native_symbol(&self) -> &'static str {
        match self {
            ChainId::Solana => "SOL",
            ChainId::Bsc => "BNB",
            ChainId::Avalanche => "AVAX",
            ChainId::Polygon => "MATIC",
            ChainId::Ethereum | ChainId::Arbitrum | ChainId::Optimism | ChainId::Base => "ETH",
        }
    }

    /// Wallet family that signs for this chain
    pub fn family(&self) -> ChainFamily {
        family_of(*self)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ChainId::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| Error::Validation(format!("Unsupported chain: {}", s)))
    }
}

/// Group of chains sharing a wallet/signing model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainFamily {
    Solana,
    Evm,
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainFamily::Solana => write!(f, "Solana"),
            ChainFamily::Evm => write!(f, "EVM"),
        }
    }
}

/// Map a chain to the wallet family that owns it
pub fn family_of(chain: ChainId) -> ChainFamily {
    match chain {
        ChainId::Solana => ChainFamily::Solana,
        _ => ChainFamily::Evm,
    }
}
