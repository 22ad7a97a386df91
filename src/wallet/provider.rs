//! Injected EVM provider
//!
//! `Eip1193Provider` is the `request({ method, params })` surface a browser
//! wallet injects. `JsonRpcProvider` speaks the same methods over HTTP
//! JSON-RPC to a local signer (Frame, a node with unlocked accounts, ...).

use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::RpcConfig;
use crate::error::{Error, Result};

/// User rejected the request
pub const CODE_USER_REJECTED: i64 = 4001;

/// A request of the same type is already pending in the wallet
pub const CODE_REQUEST_PENDING: i64 = -32002;

/// Methods safe to retry: they only read wallet state
const READ_ONLY_METHODS: &[&str] = &["eth_accounts", "eth_chainId"];

/// EIP-1193 style request surface
#[async_trait]
pub trait Eip1193Provider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// HTTP JSON-RPC implementation of the injected provider
pub struct JsonRpcProvider {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl JsonRpcProvider {
    pub fn new(config: &RpcConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.evm_endpoint.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    /// Single request attempt
    async fn send(&self, method: &str, params: &Value) -> Result<Value> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response: JsonRpcResponse = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| Error::Deserialization(format!("Invalid JSON-RPC response: {}", e)))?;

        match (response.result, response.error) {
            (_, Some(error)) => Err(Error::Provider {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl Eip1193Provider for JsonRpcProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        debug!("EVM provider request: {}", method);

        if !READ_ONLY_METHODS.contains(&method) {
            return self.send(method, &params).await;
        }

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_millis(400),
            max_elapsed_time: Some(Duration::from_secs(2)),
            ..Default::default()
        };

        retry(backoff, || async {
            match self.send(method, &params).await {
                Ok(value) => Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!("Retryable provider error on {}: {}", method, e);
                    Err(backoff::Error::transient(e))
                }
                Err(e) => Err(backoff::Error::permanent(e)),
            }
        })
        .await
    }
}
