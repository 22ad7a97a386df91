//! Quote aggregator capability
//!
//! - `types`: request parameters and the canonical `QuoteResult`
//! - `provider`: traits the swap workflow and wallets depend on
//! - `aggregator`: REST implementation of those traits

pub mod aggregator;
pub mod provider;
pub mod types;

pub use aggregator::AggregatorClient;
pub use provider::{QuoteProvider, SwapTransactionBuilder, UnsignedSwap};
pub use types::{QuoteRequest, QuoteResult, RawQuote, SwapOrder};
