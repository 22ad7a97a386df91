//! EVM-family wallet over an injected provider
//!
//! Connection state is whatever the provider reports for `eth_accounts`,
//! unless the user disconnected locally. Submission asks the aggregator for
//! calldata and hands it to `eth_sendTransaction`.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::quote::{SwapOrder, SwapTransactionBuilder, UnsignedSwap};
use crate::registry::ChainFamily;

use super::provider::{Eip1193Provider, CODE_REQUEST_PENDING, CODE_USER_REJECTED};
use super::WalletCapability;

/// Local connection bookkeeping
#[derive(Debug, Default)]
struct EvmSession {
    account: Option<String>,
    /// Set by `disconnect`; the provider itself has no disconnect method
    disconnected: bool,
}

/// EVM wallet backed by an injected provider
pub struct EvmWallet {
    provider: Option<Arc<dyn Eip1193Provider>>,
    builder: Arc<dyn SwapTransactionBuilder>,
    session: RwLock<EvmSession>,
}

impl EvmWallet {
    /// `provider` is `None` when no wallet is injected
    pub fn new(
        provider: Option<Arc<dyn Eip1193Provider>>,
        builder: Arc<dyn SwapTransactionBuilder>,
    ) -> Self {
        Self {
            provider,
            builder,
            session: RwLock::new(EvmSession::default()),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Authorized accounts as reported by the provider
    async fn accounts(&self) -> Result<Vec<String>> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| Error::Execution("Ethereum provider not found".to_string()))?;

        let value = provider.request("eth_accounts", json!([])).await?;
        Ok(parse_accounts(&value))
    }

    /// Ask the user to authorize an account (`eth_requestAccounts`)
    pub async fn connect(&self) -> Result<String> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| Error::WalletNotConnected(ChainFamily::Evm))?;

        info!("Requesting EVM account access");
        let value = provider
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(connection_error)?;

        let account = parse_accounts(&value)
            .into_iter()
            .next()
            .ok_or_else(|| Error::Auth("No accounts found".to_string()))?;

        let mut session = self.session.write().await;
        session.account = Some(account.clone());
        session.disconnected = false;
        info!("Connected EVM account {}", super::shorten_address(&account, 6, 4));
        Ok(account)
    }

    /// Forget the connected account locally
    pub async fn disconnect(&self) {
        let mut session = self.session.write().await;
        session.account = None;
        session.disconnected = true;
        info!("Disconnected EVM wallet");
    }

    /// Re-query the provider and update the cached account
    async fn refresh(&self) -> Option<String> {
        if self.session.read().await.disconnected {
            return None;
        }

        let account = match self.accounts().await {
            Ok(accounts) => accounts.into_iter().next(),
            Err(e) => {
                warn!("EVM account check failed: {}", e);
                None
            }
        };

        self.session.write().await.account = account.clone();
        account
    }
}

/// Map provider error codes to user-facing connection errors
fn connection_error(error: Error) -> Error {
    match error {
        Error::Provider { code, .. } if code == CODE_USER_REJECTED => {
            Error::Auth("Connection request rejected".to_string())
        }
        Error::Provider { code, .. } if code == CODE_REQUEST_PENDING => {
            Error::Auth("Request already in progress".to_string())
        }
        other => {
            debug!("EVM connection error: {}", other);
            Error::Auth("Connection failed".to_string())
        }
    }
}

fn parse_accounts(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|accounts| {
            accounts
                .iter()
                .filter_map(|a| a.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Extract a transaction reference from whatever `eth_sendTransaction` returned
fn transaction_reference(result: &Value) -> String {
    match result {
        Value::String(hash) => hash.clone(),
        Value::Object(map) => match map.get("hash").and_then(Value::as_str) {
            Some(hash) => hash.to_string(),
            None => result.to_string().chars().take(64).collect(),
        },
        other => other.to_string().chars().take(64).collect(),
    }
}

#[async_trait]
impl WalletCapability for EvmWallet {
    fn family(&self) -> ChainFamily {
        ChainFamily::Evm
    }

    async fn is_connected(&self) -> bool {
        self.refresh().await.is_some()
    }

    async fn address(&self) -> Option<String> {
        self.refresh().await
    }

    async fn sign_and_submit(&self, order: &SwapOrder) -> Result<String> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| Error::Execution("Ethereum provider not found".to_string()))?;

        let from = self
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Execution("Cannot access Ethereum account".to_string()))?;

        debug!("EVM wallet address: {}", from);

        let (to, data, value) = match self.builder.build_swap(order).await? {
            UnsignedSwap::Evm { to, data, value, .. } => (to, data, value),
            UnsignedSwap::Solana { .. } => {
                return Err(Error::Execution(
                    "Aggregator returned a Solana transaction for an EVM source chain".to_string(),
                ))
            }
        };

        let mut tx = json!({ "from": from, "to": to, "data": data });
        if let Some(value) = value {
            tx["value"] = Value::String(value);
        }

        info!("Submitting EVM swap from {} on {}", from, order.source_chain);
        let result = provider
            .request("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|e| match e {
                Error::Provider { message, .. } => Error::Execution(message),
                other => other,
            })?;

        Ok(transaction_reference(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quote::QuoteResult;
    use crate::registry::ChainId;
    use std::sync::Mutex;

    /// Provider answering from a fixed script and recording calls
    struct ScriptedProvider {
        accounts: Vec<String>,
        request_accounts_error: Option<i64>,
        send_result: Value,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedProvider {
        fn with_accounts(accounts: &[&str]) -> Self {
            Self {
                accounts: accounts.iter().map(|a| a.to_string()).collect(),
                request_accounts_error: None,
                send_result: json!("0xhash"),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Eip1193Provider for ScriptedProvider {
        async fn request(&self, method: &str, params: Value) -> Result<Value> {
            self.calls.lock().unwrap().push((method.to_string(), params));
            match method {
                "eth_accounts" => Ok(json!(self.accounts)),
                "eth_requestAccounts" => match self.request_accounts_error {
                    Some(code) => Err(Error::Provider {
                        code,
                        message: "nope".to_string(),
                    }),
                    None => Ok(json!(self.accounts)),
                },
                "eth_sendTransaction" => Ok(self.send_result.clone()),
                _ => Err(Error::Provider {
                    code: -32601,
                    message: "method not found".to_string(),
                }),
            }
        }
    }

    struct EvmBuilder;

    #[async_trait]
    impl SwapTransactionBuilder for EvmBuilder {
        async fn build_swap(&self, _order: &SwapOrder) -> Result<UnsignedSwap> {
            Ok(UnsignedSwap::Evm {
                to: "0xrouter".to_string(),
                data: "0xdeadbeef".to_string(),
                value: Some("0x2386f26fc10000".to_string()),
                chain_id: Some(1),
            })
        }
    }

    fn order() -> SwapOrder {
        SwapOrder {
            quote: QuoteResult {
                slippage_bps: 300,
                fee_amount: None,
                eta_seconds: None,
                route_type: "SWIFT".to_string(),
                expected_amount_out: None,
                min_amount_out: None,
                raw: json!({}),
            },
            source_chain: ChainId::Ethereum,
            destination_chain: ChainId::Base,
            sender: "0xabc".to_string(),
            recipient: "0xabc".to_string(),
            referrer: None,
        }
    }

    #[tokio::test]
    async fn test_connection_from_accounts() {
        let wallet = EvmWallet::new(
            Some(Arc::new(ScriptedProvider::with_accounts(&["0xabc"]))),
            Arc::new(EvmBuilder),
        );
        assert!(wallet.is_connected().await);
        assert_eq!(wallet.address().await.as_deref(), Some("0xabc"));

        wallet.disconnect().await;
        assert!(!wallet.is_connected().await);

        let empty = EvmWallet::new(
            Some(Arc::new(ScriptedProvider::with_accounts(&[]))),
            Arc::new(EvmBuilder),
        );
        assert!(!empty.is_connected().await);

        let missing = EvmWallet::new(None, Arc::new(EvmBuilder));
        assert!(!missing.is_connected().await);
        assert!(!missing.has_provider());
    }

    #[tokio::test]
    async fn test_connect_error_codes() {
        for (code, expected) in [
            (CODE_USER_REJECTED, "Connection request rejected"),
            (CODE_REQUEST_PENDING, "Request already in progress"),
            (-32000, "Connection failed"),
        ] {
            let mut provider = ScriptedProvider::with_accounts(&["0xabc"]);
            provider.request_accounts_error = Some(code);
            let wallet = EvmWallet::new(Some(Arc::new(provider)), Arc::new(EvmBuilder));

            match wallet.connect().await {
                Err(Error::Auth(message)) => assert_eq!(message, expected),
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_sign_and_submit_sends_transaction() {
        let provider = Arc::new(ScriptedProvider::with_accounts(&["0xabc"]));
        let wallet = EvmWallet::new(Some(provider.clone()), Arc::new(EvmBuilder));

        let reference = wallet.sign_and_submit(&order()).await.unwrap();
        assert_eq!(reference, "0xhash");

        let calls = provider.calls.lock().unwrap();
        let (method, params) = calls.last().unwrap();
        assert_eq!(method, "eth_sendTransaction");
        assert_eq!(params[0]["from"], "0xabc");
        assert_eq!(params[0]["to"], "0xrouter");
        assert_eq!(params[0]["value"], "0x2386f26fc10000");
    }

    #[test]
    fn test_transaction_reference_shapes() {
        assert_eq!(transaction_reference(&json!("0x1")), "0x1");
        assert_eq!(transaction_reference(&json!({"hash": "0x2"})), "0x2");
        let long = json!({"receipt": "x".repeat(100)});
        assert_eq!(transaction_reference(&long).len(), 64);
    }
}
