//! Swap selection and workflow state types

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::quote::QuoteResult;
use crate::registry::{native_token, ChainFamily, ChainId, NetworkMode, TokenDescriptor};

lazy_static::lazy_static! {
    /// Plain positive decimal: digits with an optional fractional part
    static ref AMOUNT_RE: Regex =
        Regex::new(r"^(\d+(\.\d*)?|\.\d+)$").expect("Invalid amount pattern");
    static ref EVM_ADDRESS_RE: Regex =
        Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("Invalid EVM address pattern");
}

/// Message shown for an amount that is not a positive decimal
pub const INVALID_AMOUNT_MESSAGE: &str = "Please enter a valid amount";

/// Parse a user-entered amount, accepting only positive finite decimals
pub fn parse_amount(text: &str) -> Result<f64> {
    let text = text.trim();
    if !AMOUNT_RE.is_match(text) {
        return Err(Error::Validation(INVALID_AMOUNT_MESSAGE.to_string()));
    }

    match text.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(Error::Validation(INVALID_AMOUNT_MESSAGE.to_string())),
    }
}

/// Check an address is well-formed for the given chain family
pub fn validate_address(family: ChainFamily, address: &str) -> Result<()> {
    let valid = match family {
        ChainFamily::Evm => EVM_ADDRESS_RE.is_match(address),
        ChainFamily::Solana => Pubkey::from_str(address).is_ok(),
    };

    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("Invalid {} address: {}", family, address)))
    }
}

/// User's chain/token/amount selection
///
/// Each token always belongs to its chain's registry entry for the active
/// network mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapSelection {
    pub source_chain: ChainId,
    pub destination_chain: ChainId,
    pub source_token: TokenDescriptor,
    pub destination_token: TokenDescriptor,
    /// Raw text as entered; validated when a quote is requested
    pub amount: String,
}

impl SwapSelection {
    /// Selection with both sides set to the chains' native assets
    pub fn new(
        source_chain: ChainId,
        destination_chain: ChainId,
        mode: NetworkMode,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            source_chain,
            destination_chain,
            source_token: native_token(source_chain, mode),
            destination_token: native_token(destination_chain, mode),
            amount: amount.into(),
        }
    }

    /// Exchange source and destination, chain and token together
    pub fn reverse(&mut self) {
        std::mem::swap(&mut self.source_chain, &mut self.destination_chain);
        std::mem::swap(&mut self.source_token, &mut self.destination_token);
    }

    pub fn is_cross_family(&self) -> bool {
        self.source_chain.family() != self.destination_chain.family()
    }
}

/// Workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapPhase {
    #[default]
    Idle,
    QuoteLoading,
    QuoteReady,
    ExecuteLoading,
    ExecuteSucceeded,
    ExecuteFailed,
}

impl SwapPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, SwapPhase::QuoteLoading | SwapPhase::ExecuteLoading)
    }
}

impl fmt::Display for SwapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SwapPhase::Idle => "idle",
            SwapPhase::QuoteLoading => "fetching quote",
            SwapPhase::QuoteReady => "quote ready",
            SwapPhase::ExecuteLoading => "executing",
            SwapPhase::ExecuteSucceeded => "succeeded",
            SwapPhase::ExecuteFailed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Outcome of a successful submission
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapExecutionResult {
    /// Signature (Solana) or transaction hash (EVM)
    pub transaction_reference: String,
    pub submitted_at: DateTime<Utc>,
}

impl SwapExecutionResult {
    pub fn new(transaction_reference: impl Into<String>) -> Self {
        Self {
            transaction_reference: transaction_reference.into(),
            submitted_at: Utc::now(),
        }
    }
}

/// Point-in-time copy of the workflow state for presentation
///
/// A selection change clears `quote`, `quotes`, `execution` and `error` but
/// leaves a settled `phase` alone, so `ExecuteSucceeded` can appear with
/// `execution: None`. Read the result from `execution`, not from `phase`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapSnapshot {
    pub selection: SwapSelection,
    pub phase: SwapPhase,
    /// Selected quote (first in provider order)
    pub quote: Option<QuoteResult>,
    /// Every quote the provider returned, in provider order
    pub quotes: Vec<QuoteResult>,
    /// Last submitted swap; cleared by any later selection change
    pub execution: Option<SwapExecutionResult>,
    pub error: Option<String>,
}
