//! Quote request/response types
//!
//! Aggregator payloads come in several shapes (the ETA alone can arrive as
//! `eta`, `etaSeconds` or a `clientEta` string). They are normalized once,
//! here, into a canonical `QuoteResult`.

use serde::{Deserialize, Serialize};

use crate::registry::{ChainId, NetworkMode};

/// Route tag the aggregator uses for its no-fee intent-based path
pub const ROUTE_SWIFT: &str = "SWIFT";

/// ETA shown when the provider does not report one
pub const DEFAULT_ETA_SECONDS: u64 = 10;

/// Parameters sent to the quoting capability
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub amount: f64,
    pub from_token: String,
    pub to_token: String,
    pub from_chain: ChainId,
    pub to_chain: ChainId,
    pub slippage_bps: u32,
    /// Native amount delivered on the destination chain for gas
    pub gas_drop: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_testnet: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
}

impl QuoteRequest {
    /// Append the test-network markers only when running against testnets
    pub fn for_network(mut self, mode: NetworkMode) -> Self {
        if mode.is_test() {
            self.is_testnet = Some(true);
            self.network = Some("testnet".to_string());
        } else {
            self.is_testnet = None;
            self.network = None;
        }
        self
    }
}

/// Canonical quote, produced only at the capability boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResult {
    pub slippage_bps: u32,
    pub fee_amount: Option<f64>,
    pub eta_seconds: Option<u64>,
    pub route_type: String,
    pub expected_amount_out: Option<f64>,
    pub min_amount_out: Option<f64>,
    /// Provider payload, handed back untouched when building the swap
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl QuoteResult {
    /// Slippage as a percentage (300 bps -> 3.0)
    pub fn slippage_percent(&self) -> f64 {
        self.slippage_bps as f64 / 100.0
    }

    /// Fee line as displayed next to the source token symbol
    pub fn fee_display(&self, symbol: &str) -> String {
        match self.fee_amount {
            Some(fee) => format!("{} {}", fee, symbol),
            None if self.route_type.eq_ignore_ascii_case(ROUTE_SWIFT) => "No fee".to_string(),
            None => format!("0 {}", symbol),
        }
    }

    /// Estimated completion time in seconds, defaulting when unreported
    pub fn eta_display(&self) -> String {
        format!("{} seconds", self.eta_seconds.unwrap_or(DEFAULT_ETA_SECONDS))
    }
}

/// Quote payload exactly as the aggregator sends it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuote {
    #[serde(rename = "type")]
    pub route_type: Option<String>,
    pub slippage_bps: Option<u32>,
    pub fee: Option<f64>,
    pub eta: Option<f64>,
    pub eta_seconds: Option<f64>,
    pub client_eta: Option<String>,
    pub expected_amount_out: Option<f64>,
    pub min_amount_out: Option<f64>,
}

/// Where the ETA was found in the payload
#[derive(Debug, Clone, PartialEq)]
enum ReportedEta {
    Seconds(f64),
    Client(String),
    Missing,
}

impl RawQuote {
    fn reported_eta(&self) -> ReportedEta {
        match (self.eta, self.eta_seconds, &self.client_eta) {
            (Some(eta), _, _) if eta > 0.0 => ReportedEta::Seconds(eta),
            (_, Some(secs), _) if secs > 0.0 => ReportedEta::Seconds(secs),
            (_, _, Some(client)) if !client.trim().is_empty() => {
                ReportedEta::Client(client.clone())
            }
            _ => ReportedEta::Missing,
        }
    }

    /// Collapse this payload into a canonical quote
    ///
    /// `requested_slippage_bps` is used when the provider omits the field.
    pub fn normalize(self, raw: serde_json::Value, requested_slippage_bps: u32) -> QuoteResult {
        let eta_seconds = match self.reported_eta() {
            ReportedEta::Seconds(secs) => Some(secs.round() as u64),
            ReportedEta::Client(text) => text.trim().trim_end_matches('s').trim().parse().ok(),
            ReportedEta::Missing => None,
        };

        QuoteResult {
            slippage_bps: self.slippage_bps.unwrap_or(requested_slippage_bps),
            fee_amount: self.fee,
            eta_seconds,
            route_type: self.route_type.unwrap_or_else(|| "UNKNOWN".to_string()),
            expected_amount_out: self.expected_amount_out,
            min_amount_out: self.min_amount_out,
            raw,
        }
    }
}

/// Everything a wallet needs to sign and submit a swap
#[derive(Debug, Clone)]
pub struct SwapOrder {
    pub quote: QuoteResult,
    pub source_chain: ChainId,
    pub destination_chain: ChainId,
    pub sender: String,
    pub recipient: String,
    pub referrer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: serde_json::Value) -> QuoteResult {
        let raw: RawQuote = serde_json::from_value(value.clone()).unwrap();
        raw.normalize(value, 300)
    }

    #[test]
    fn test_eta_shapes() {
        assert_eq!(normalize(json!({"eta": 42})).eta_seconds, Some(42));
        assert_eq!(normalize(json!({"etaSeconds": 18})).eta_seconds, Some(18));
        assert_eq!(normalize(json!({"clientEta": "12s"})).eta_seconds, Some(12));
        // zero falls through to the next shape
        assert_eq!(
            normalize(json!({"eta": 0, "etaSeconds": 7})).eta_seconds,
            Some(7)
        );
        assert_eq!(normalize(json!({})).eta_seconds, None);
        assert_eq!(normalize(json!({"clientEta": "soon"})).eta_seconds, None);
    }

    #[test]
    fn test_slippage_fallback() {
        assert_eq!(normalize(json!({"slippageBps": 100})).slippage_bps, 100);
        assert_eq!(normalize(json!({})).slippage_bps, 300);
    }

    #[test]
    fn test_fee_display() {
        let swift = normalize(json!({"type": "SWIFT"}));
        assert_eq!(swift.fee_display("SOL"), "No fee");

        let mctp = normalize(json!({"type": "MCTP"}));
        assert_eq!(mctp.fee_display("SOL"), "0 SOL");

        let paid = normalize(json!({"type": "WH", "fee": 0.002}));
        assert_eq!(paid.fee_display("ETH"), "0.002 ETH");
        assert_eq!(paid.eta_display(), "10 seconds");
        assert_eq!(paid.slippage_percent(), 3.0);
    }

    #[test]
    fn test_request_network_fields() {
        let request = QuoteRequest {
            amount: 0.01,
            from_token: "a".to_string(),
            to_token: "b".to_string(),
            from_chain: ChainId::Solana,
            to_chain: ChainId::Ethereum,
            slippage_bps: 300,
            gas_drop: 0.001,
            is_testnet: None,
            network: None,
        };

        let main = serde_json::to_value(request.clone().for_network(NetworkMode::Main)).unwrap();
        assert!(main.get("isTestnet").is_none());
        assert!(main.get("network").is_none());
        assert_eq!(main["fromChain"], "solana");
        assert_eq!(main["gasDrop"], 0.001);

        let test = serde_json::to_value(request.for_network(NetworkMode::Test)).unwrap();
        assert_eq!(test["isTestnet"], true);
        assert_eq!(test["network"], "testnet");
    }
}
