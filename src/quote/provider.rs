//! Capability interfaces for the quote aggregator

use async_trait::async_trait;

use crate::error::Result;

use super::types::{QuoteRequest, QuoteResult, SwapOrder};

/// Fetches priced routes for a swap
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Returns quotes in provider order; an empty list means no route
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<QuoteResult>>;
}

/// Unsigned transaction for the source chain, ready for the wallet to sign
#[derive(Debug, Clone, PartialEq)]
pub enum UnsignedSwap {
    Solana {
        /// Base64 bincode-serialized versioned transaction
        transaction: String,
    },
    Evm {
        to: String,
        data: String,
        /// Hex-encoded wei amount
        value: Option<String>,
        chain_id: Option<u64>,
    },
}

/// Turns a selected quote into a transaction for the source chain
#[async_trait]
pub trait SwapTransactionBuilder: Send + Sync {
    async fn build_swap(&self, order: &SwapOrder) -> Result<UnsignedSwap>;
}
