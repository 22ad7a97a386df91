//! Cross-chain swap workflow
//!
//! Holds the user's chain/token/amount selection, fetches quotes through a
//! `QuoteProvider` and submits through the `WalletCapability` that owns the
//! source chain.

pub mod types;
pub mod workflow;

pub use types::{
    parse_amount, validate_address, SwapExecutionResult, SwapPhase, SwapSelection, SwapSnapshot,
};
pub use workflow::{SwapSettings, SwapWorkflow};
