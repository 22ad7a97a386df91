//! Swap aggregator HTTP client
//!
//! Implements both quoting and transaction building against the
//! aggregator's REST API. Quotes come from `GET {api}/quote`, unsigned
//! source-chain transactions from `POST {api}/swap`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::QuoteConfig;
use crate::error::{Error, Result};
use crate::registry::ChainFamily;

use super::provider::{QuoteProvider, SwapTransactionBuilder, UnsignedSwap};
use super::types::{QuoteRequest, QuoteResult, RawQuote, SwapOrder};

/// Quote listing, in any of the shapes the API answers with
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuoteEnvelope {
    Wrapped { quotes: Vec<serde_json::Value> },
    Failure { message: String },
    Bare(Vec<serde_json::Value>),
}

/// Body for the transaction build endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BuildSwapRequest<'a> {
    quote: &'a serde_json::Value,
    from_chain: String,
    to_chain: String,
    user_wallet: &'a str,
    dest_address: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    referrer: Option<&'a str>,
}

/// Transaction build response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildSwapResponse {
    /// Base64 serialized Solana transaction
    transaction: Option<String>,
    to: Option<String>,
    data: Option<String>,
    value: Option<String>,
    chain_id: Option<u64>,
    error: Option<String>,
}

/// Aggregator REST client
pub struct AggregatorClient {
    client: Client,
    api_url: String,
}

impl AggregatorClient {
    /// Create a client for the configured aggregator endpoint
    pub fn new(config: &QuoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    /// Check the aggregator answers at all (used by `health`)
    pub async fn ping(&self) -> Result<Duration> {
        let start = std::time::Instant::now();
        self.client
            .head(&self.api_url)
            .send()
            .await
            .map_err(|e| Error::RpcConnection(e.to_string()))?;
        Ok(start.elapsed())
    }
}

/// Turn a response body into canonical quotes
fn parse_quotes(body: &str, requested_slippage_bps: u32) -> Result<Vec<QuoteResult>> {
    let envelope: QuoteEnvelope = serde_json::from_str(body)
        .map_err(|e| Error::Deserialization(format!("Failed to parse quotes: {}", e)))?;

    let values = match envelope {
        QuoteEnvelope::Wrapped { quotes } | QuoteEnvelope::Bare(quotes) => quotes,
        QuoteEnvelope::Failure { message } => return Err(Error::QuoteProvider(message)),
    };

    values
        .into_iter()
        .map(|value| {
            let raw: RawQuote = serde_json::from_value(value.clone())
                .map_err(|e| Error::Deserialization(format!("Malformed quote: {}", e)))?;
            Ok(raw.normalize(value, requested_slippage_bps))
        })
        .collect()
}

#[async_trait]
impl QuoteProvider for AggregatorClient {
    async fn fetch_quotes(&self, request: &QuoteRequest) -> Result<Vec<QuoteResult>> {
        debug!(
            "Requesting quote: {} {} -> {} ({} -> {})",
            request.amount, request.from_token, request.to_token, request.from_chain, request.to_chain
        );

        let response = self
            .client
            .get(self.endpoint("quote"))
            .query(request)
            .send()
            .await
            .map_err(|e| Error::QuoteProvider(format!("Quote request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::QuoteProvider(format!("Failed to read quote response: {}", e)))?;

        if !status.is_success() {
            warn!("Quote API returned {}", status);
            // Prefer the API's own message when it sends one
            return match parse_quotes(&body, request.slippage_bps) {
                Err(Error::QuoteProvider(message)) => Err(Error::QuoteProvider(message)),
                _ => Err(Error::QuoteProvider(format!("Quote API returned {}", status))),
            };
        }

        let quotes = parse_quotes(&body, request.slippage_bps)?;
        info!("Received {} quote(s)", quotes.len());
        Ok(quotes)
    }
}

#[async_trait]
impl SwapTransactionBuilder for AggregatorClient {
    async fn build_swap(&self, order: &SwapOrder) -> Result<UnsignedSwap> {
        let family = order.source_chain.family();
        let request = BuildSwapRequest {
            quote: &order.quote.raw,
            from_chain: order.source_chain.to_string(),
            to_chain: order.destination_chain.to_string(),
            user_wallet: &order.sender,
            dest_address: &order.recipient,
            referrer: order.referrer.as_deref(),
        };

        debug!("Building {} swap transaction for {}", family, order.sender);

        let response = self
            .client
            .post(self.endpoint("swap"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Execution(format!("Swap build request failed: {}", e)))?;

        let built: BuildSwapResponse = response
            .json()
            .await
            .map_err(|e| Error::Deserialization(format!("Failed to parse swap response: {}", e)))?;

        into_unsigned(family, built)
    }
}

fn into_unsigned(family: ChainFamily, built: BuildSwapResponse) -> Result<UnsignedSwap> {
    if let Some(error) = built.error {
        return Err(Error::Execution(error));
    }

    match family {
        ChainFamily::Solana => built
            .transaction
            .map(|transaction| UnsignedSwap::Solana { transaction })
            .ok_or_else(|| Error::Execution("No transaction in swap response".to_string())),
        ChainFamily::Evm => match (built.to, built.data) {
            (Some(to), Some(data)) => Ok(UnsignedSwap::Evm {
                to,
                data,
                value: built.value,
                chain_id: built.chain_id,
            }),
            _ => Err(Error::Execution(
                "Swap response is missing transaction target or calldata".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_and_bare() {
        let wrapped = r#"{"quotes":[{"type":"SWIFT","slippageBps":300,"etaSeconds":12}]}"#;
        let quotes = parse_quotes(wrapped, 300).unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].route_type, "SWIFT");
        assert_eq!(quotes[0].eta_seconds, Some(12));

        let bare = r#"[{"type":"MCTP","fee":0.1},{"type":"WH"}]"#;
        let quotes = parse_quotes(bare, 300).unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].fee_amount, Some(0.1));
        assert_eq!(quotes[1].slippage_bps, 300);
    }

    #[test]
    fn test_parse_empty_and_failure() {
        assert!(parse_quotes(r#"{"quotes":[]}"#, 300).unwrap().is_empty());

        let failure = r#"{"code":"AMOUNT_TOO_SMALL","message":"Amount too small"}"#;
        match parse_quotes(failure, 300) {
            Err(Error::QuoteProvider(message)) => assert_eq!(message, "Amount too small"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_into_unsigned() {
        let solana = BuildSwapResponse {
            transaction: Some("AQAB".to_string()),
            ..Default::default()
        };
        assert_eq!(
            into_unsigned(ChainFamily::Solana, solana).unwrap(),
            UnsignedSwap::Solana {
                transaction: "AQAB".to_string()
            }
        );

        let evm_missing = BuildSwapResponse {
            to: Some("0xabc".to_string()),
            ..Default::default()
        };
        assert!(into_unsigned(ChainFamily::Evm, evm_missing).is_err());

        let rejected = BuildSwapResponse {
            error: Some("Quote expired".to_string()),
            ..Default::default()
        };
        match into_unsigned(ChainFamily::Evm, rejected) {
            Err(Error::Execution(message)) => assert_eq!(message, "Quote expired"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_build_request_serialization() {
        let quote = serde_json::json!({"type": "SWIFT"});
        let request = BuildSwapRequest {
            quote: &quote,
            from_chain: "solana".to_string(),
            to_chain: "ethereum".to_string(),
            user_wallet: "sender",
            dest_address: "0xdest",
            referrer: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"userWallet\":\"sender\""));
        assert!(json.contains("\"destAddress\":\"0xdest\""));
        assert!(!json.contains("referrer"));
    }
}
