//! Swap quote/execute state machine
//!
//! ```text
//! Idle -> QuoteLoading -> QuoteReady -> ExecuteLoading -> ExecuteSucceeded
//!              ^               |                      \-> ExecuteFailed
//!              +---------------+------ re-quote ----------------+
//! ```
//!
//! Every mutation of the selection bumps a generation counter. Quote
//! responses and execution completions carry the generation they were
//! issued under and are dropped when it is no longer current.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::quote::{QuoteProvider, QuoteRequest, QuoteResult, SwapOrder};
use crate::registry::{find_token, native_token, ChainFamily, ChainId, NetworkMode};
use crate::wallet::WalletSet;

use super::types::{
    parse_amount, validate_address, SwapExecutionResult, SwapPhase, SwapSelection, SwapSnapshot,
};

/// Network and pricing parameters injected into the workflow
#[derive(Debug, Clone)]
pub struct SwapSettings {
    pub network_mode: NetworkMode,
    pub slippage_bps: u32,
    pub gas_drop: f64,
    pub quote_timeout: Duration,
    pub execute_timeout: Duration,
    pub referrer: Option<String>,
}

impl SwapSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            network_mode: config.network.mode,
            slippage_bps: config.quote.slippage_bps,
            gas_drop: config.quote.gas_drop,
            quote_timeout: Duration::from_millis(config.quote.timeout_ms),
            execute_timeout: Duration::from_millis(config.swap.execute_timeout_ms),
            referrer: config.quote.referrer.clone(),
        }
    }
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Explicit destination for cross-family swaps
#[derive(Debug, Clone)]
struct Recipient {
    family: ChainFamily,
    address: String,
}

#[derive(Debug)]
struct SwapState {
    selection: SwapSelection,
    phase: SwapPhase,
    quote: Option<QuoteResult>,
    quotes: Vec<QuoteResult>,
    execution: Option<SwapExecutionResult>,
    error: Option<String>,
    recipient: Option<Recipient>,
}

impl SwapState {
    fn clear_results(&mut self) {
        self.quote = None;
        self.quotes.clear();
        self.execution = None;
        self.error = None;
    }
}

/// Cross-chain swap workflow
pub struct SwapWorkflow {
    quoter: Arc<dyn QuoteProvider>,
    wallets: WalletSet,
    settings: SwapSettings,
    state: RwLock<SwapState>,
    generation: AtomicU64,
}

impl SwapWorkflow {
    pub fn new(
        quoter: Arc<dyn QuoteProvider>,
        wallets: WalletSet,
        settings: SwapSettings,
        selection: SwapSelection,
    ) -> Self {
        Self {
            quoter,
            wallets,
            settings,
            state: RwLock::new(SwapState {
                selection,
                phase: SwapPhase::Idle,
                quote: None,
                quotes: Vec::new(),
                execution: None,
                error: None,
                recipient: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    /// Workflow seeded with the configured default route and amount
    pub fn from_config(quoter: Arc<dyn QuoteProvider>, wallets: WalletSet, config: &Config) -> Self {
        let settings = SwapSettings::from_config(config);
        let selection = SwapSelection::new(
            config.swap.default_source_chain,
            config.swap.default_destination_chain,
            settings.network_mode,
            config.swap.default_amount.clone(),
        );
        Self::new(quoter, wallets, settings, selection)
    }

    pub fn settings(&self) -> &SwapSettings {
        &self.settings
    }

    /// Drop any quote or result tied to the previous selection
    fn invalidate(&self, state: &mut SwapState) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        state.clear_results();
        if state.phase == SwapPhase::QuoteLoading {
            state.phase = SwapPhase::Idle;
        }
        debug!("Selection changed, generation {}", generation);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    pub async fn set_source_chain(&self, chain: ChainId) {
        let mut state = self.state.write().await;
        state.selection.source_chain = chain;
        state.selection.source_token = native_token(chain, self.settings.network_mode);
        self.invalidate(&mut state);
    }

    pub async fn set_destination_chain(&self, chain: ChainId) {
        let mut state = self.state.write().await;
        state.selection.destination_chain = chain;
        state.selection.destination_token = native_token(chain, self.settings.network_mode);
        self.invalidate(&mut state);
    }

    /// Pick a source token by display name from the source chain's list
    pub async fn set_source_token(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let chain = state.selection.source_chain;
        state.selection.source_token = find_token(chain, self.settings.network_mode, name)
            .ok_or_else(|| Error::Validation(format!("Unknown token {} on {}", name, chain)))?;
        self.invalidate(&mut state);
        Ok(())
    }

    /// Pick a destination token by display name from the destination chain's list
    pub async fn set_destination_token(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let chain = state.selection.destination_chain;
        state.selection.destination_token = find_token(chain, self.settings.network_mode, name)
            .ok_or_else(|| Error::Validation(format!("Unknown token {} on {}", name, chain)))?;
        self.invalidate(&mut state);
        Ok(())
    }

    /// Store the amount as typed; it is validated on `request_quote`
    pub async fn set_amount(&self, amount: impl Into<String>) {
        let mut state = self.state.write().await;
        state.selection.amount = amount.into();
        self.invalidate(&mut state);
    }

    pub async fn swap_direction(&self) {
        let mut state = self.state.write().await;
        state.selection.reverse();
        self.invalidate(&mut state);
    }

    /// Set (or clear) the destination address used when the destination
    /// chain's wallet is not connected. Validated against the current
    /// destination chain's family. A quote taken before the change is dropped.
    pub async fn set_recipient(&self, address: Option<&str>) -> Result<()> {
        let mut state = self.state.write().await;
        state.recipient = match address.map(str::trim).filter(|a| !a.is_empty()) {
            Some(address) => {
                let family = state.selection.destination_chain.family();
                validate_address(family, address)?;
                Some(Recipient {
                    family,
                    address: address.to_string(),
                })
            }
            None => None,
        };
        self.invalidate(&mut state);
        Ok(())
    }

    pub async fn snapshot(&self) -> SwapSnapshot {
        let state = self.state.read().await;
        SwapSnapshot {
            selection: state.selection.clone(),
            phase: state.phase,
            quote: state.quote.clone(),
            quotes: state.quotes.clone(),
            execution: state.execution.clone(),
            error: state.error.clone(),
        }
    }

    /// Whether `execute_swap` would do anything right now
    pub async fn can_execute(&self) -> bool {
        let (source_chain, ready) = {
            let state = self.state.read().await;
            (
                state.selection.source_chain,
                state.quote.is_some() && !state.phase.is_loading(),
            )
        };
        ready && self.wallets.for_chain(source_chain).is_connected().await
    }

    /// Fetch quotes for the current selection and select the first one
    pub async fn request_quote(&self) -> Result<QuoteResult> {
        let (generation, request) = {
            let mut state = self.state.write().await;
            if state.phase == SwapPhase::ExecuteLoading {
                return Err(Error::SwapInProgress);
            }

            let amount = match parse_amount(&state.selection.amount) {
                Ok(amount) => amount,
                Err(e) => {
                    self.invalidate(&mut state);
                    state.phase = SwapPhase::Idle;
                    state.error = Some(e.to_string());
                    return Err(e);
                }
            };

            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.clear_results();
            state.phase = SwapPhase::QuoteLoading;

            let selection = &state.selection;
            let request = QuoteRequest {
                amount,
                from_token: selection.source_token.contract_reference.to_string(),
                to_token: selection.destination_token.contract_reference.to_string(),
                from_chain: selection.source_chain,
                to_chain: selection.destination_chain,
                slippage_bps: self.settings.slippage_bps,
                gas_drop: self.settings.gas_drop,
                is_testnet: None,
                network: None,
            }
            .for_network(self.settings.network_mode);

            (generation, request)
        };

        info!(
            "Requesting quote #{}: {} {} ({}) -> {} ({})",
            generation,
            request.amount,
            request.from_token,
            request.from_chain,
            request.to_token,
            request.to_chain
        );

        let outcome = with_timeout(
            "Quote request",
            self.settings.quote_timeout,
            self.quoter.fetch_quotes(&request),
        )
        .await;

        let mut state = self.state.write().await;
        if !self.is_current(generation) {
            debug!("Discarding stale quote response #{}", generation);
            return Err(Error::QuoteSuperseded);
        }

        match outcome {
            Ok(quotes) => {
                state.phase = SwapPhase::QuoteReady;
                match quotes.first().cloned() {
                    Some(quote) => {
                        info!(
                            "Quote #{} ready: {} route(s), selected {} ({} bps)",
                            generation,
                            quotes.len(),
                            quote.route_type,
                            quote.slippage_bps
                        );
                        state.quote = Some(quote.clone());
                        state.quotes = quotes;
                        Ok(quote)
                    }
                    None => {
                        warn!("Quote #{} returned no routes", generation);
                        state.error = Some(Error::NoRoute.to_string());
                        Err(Error::NoRoute)
                    }
                }
            }
            Err(e) => {
                let message = e.quote_message();
                error!("Quote #{} failed: {}", generation, message);
                state.phase = SwapPhase::Idle;
                state.error = Some(message.clone());
                Err(Error::QuoteProvider(message))
            }
        }
    }

    /// Sign and submit a swap for the selected quote
    ///
    /// Returns `Ok(None)` without calling any capability when there is no
    /// selected quote or the source chain's wallet is not connected.
    pub async fn execute_swap(&self) -> Result<Option<SwapExecutionResult>> {
        let (generation, selection, quote, recipient) = {
            let state = self.state.read().await;
            if state.phase == SwapPhase::ExecuteLoading {
                return Err(Error::SwapInProgress);
            }
            let Some(quote) = state.quote.clone() else {
                debug!("Execute skipped: no quote selected");
                return Ok(None);
            };
            (
                self.generation.load(Ordering::SeqCst),
                state.selection.clone(),
                quote,
                state.recipient.clone(),
            )
        };

        let wallet = self.wallets.for_chain(selection.source_chain).clone();
        if !wallet.is_connected().await {
            debug!("Execute skipped: {} wallet not connected", wallet.family());
            return Ok(None);
        }
        let sender = wallet
            .address()
            .await
            .ok_or(Error::WalletNotConnected(wallet.family()))?;

        let recipient = match self.resolve_recipient(&selection, &sender, recipient).await {
            Ok(recipient) => recipient,
            Err(e) => {
                let mut state = self.state.write().await;
                if self.is_current(generation) {
                    state.error = Some(e.to_string());
                }
                return Err(e);
            }
        };

        {
            let mut state = self.state.write().await;
            if !self.is_current(generation) || state.phase == SwapPhase::ExecuteLoading {
                debug!("Execute skipped: selection changed before submission");
                return Err(Error::QuoteSuperseded);
            }
            state.phase = SwapPhase::ExecuteLoading;
            state.execution = None;
            state.error = None;
        }

        let execution_id = Uuid::new_v4();
        info!(
            "[{}] Executing swap {} -> {} from {} to {}",
            execution_id,
            selection.source_chain,
            selection.destination_chain,
            sender,
            recipient
        );

        let order = SwapOrder {
            quote,
            source_chain: selection.source_chain,
            destination_chain: selection.destination_chain,
            sender,
            recipient,
            referrer: self.settings.referrer.clone(),
        };

        let outcome = with_timeout(
            "Swap execution",
            self.settings.execute_timeout,
            wallet.sign_and_submit(&order),
        )
        .await;

        let mut state = self.state.write().await;
        if !self.is_current(generation) {
            // Submission already happened; record it even though the quote is gone
            warn!(
                "[{}] Swap completed after selection changed (generation {})",
                execution_id, generation
            );
        }

        match outcome {
            Ok(reference) => {
                info!("[{}] Swap submitted: {}", execution_id, reference);
                let result = SwapExecutionResult::new(reference);
                state.phase = SwapPhase::ExecuteSucceeded;
                state.execution = Some(result.clone());
                Ok(Some(result))
            }
            Err(e) => {
                let message = e.execution_message();
                error!("[{}] Swap failed: {}", execution_id, message);
                state.phase = SwapPhase::ExecuteFailed;
                state.error = Some(message.clone());
                Err(Error::Execution(message))
            }
        }
    }

    /// Destination address for the order
    ///
    /// Same-family swaps go back to the sender. Cross-family swaps use the
    /// destination wallet when connected, then an explicit recipient.
    async fn resolve_recipient(
        &self,
        selection: &SwapSelection,
        sender: &str,
        recipient: Option<Recipient>,
    ) -> Result<String> {
        if !selection.is_cross_family() {
            return Ok(sender.to_string());
        }

        let destination = self.wallets.for_chain(selection.destination_chain);
        if let Some(address) = destination.address().await {
            return Ok(address);
        }

        recipient
            .filter(|r| r.family == selection.destination_chain.family())
            .map(|r| r.address)
            .ok_or(Error::DestinationUnresolved {
                chain: selection.destination_chain,
            })
    }
}

/// Bound a capability call, mapping expiry to `Error::Timeout`
async fn with_timeout<T, F>(operation: &str, limit: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout {
            operation: operation.to_string(),
            limit,
        }),
    }
}
