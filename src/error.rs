//! Error types for the wallet core

use std::time::Duration;
use thiserror::Error;

use crate::registry::{ChainFamily, ChainId};

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback shown when a quote capability fails without a message
pub const QUOTE_FALLBACK_MESSAGE: &str = "Failed to fetch quote";

/// Fallback shown when a swap capability fails without a message
pub const EXECUTION_FALLBACK_MESSAGE: &str = "Swap execution failed";

/// Main error type for the wallet core
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    #[error("Insecure keypair permissions: {0}")]
    InsecureKeypair(String),

    // Swap workflow errors
    #[error("{0}")]
    Validation(String),

    #[error("No quotes available for this route")]
    NoRoute,

    #[error("{0}")]
    QuoteProvider(String),

    #[error("{0}")]
    Execution(String),

    #[error("A swap is already being executed")]
    SwapInProgress,

    #[error("Quote response superseded by a newer request")]
    QuoteSuperseded,

    #[error("No destination address available on {chain}")]
    DestinationUnresolved { chain: ChainId },

    #[error("{0} wallet is not connected")]
    WalletNotConnected(ChainFamily),

    #[error("{operation} timed out after {}", format_limit(*limit))]
    Timeout { operation: String, limit: Duration },

    // RPC / provider errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC connection failed: {0}")]
    RpcConnection(String),

    #[error("Provider error {code}: {message}")]
    Provider { code: i64, message: String },

    // Identity errors
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Login method not allowed: {0}")]
    LoginMethodNotAllowed(String),

    // Discovery errors
    #[error("{0}")]
    Bluetooth(String),

    #[error("Bluetooth is not supported by this browser")]
    BluetoothUnsupported,

    #[error("Device not found")]
    DeviceNotFound(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Rpc(_) | Error::RpcConnection(_) | Error::Timeout { .. }
        )
    }

    /// Check if this error came from bad user input rather than a capability
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::DestinationUnresolved { .. }
        )
    }

    /// Message surfaced to the user for quote failures
    pub fn quote_message(&self) -> String {
        non_empty_or(self.to_string(), QUOTE_FALLBACK_MESSAGE)
    }

    /// Message surfaced to the user for execution failures
    pub fn execution_message(&self) -> String {
        non_empty_or(self.to_string(), EXECUTION_FALLBACK_MESSAGE)
    }
}

/// Whole seconds as "30s", anything finer as "250ms"
fn format_limit(limit: Duration) -> String {
    if limit.subsec_millis() == 0 && limit.as_secs() > 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

// Conversion from solana_client errors
impl From<solana_client::client_error::ClientError> for Error {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        Error::Rpc(e.to_string())
    }
}

// Conversion from reqwest errors
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Error::RpcConnection(e.to_string())
        } else {
            Error::Rpc(e.to_string())
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_messages() {
        assert_eq!(
            Error::QuoteProvider(String::new()).quote_message(),
            QUOTE_FALLBACK_MESSAGE
        );
        assert_eq!(
            Error::Execution("  ".to_string()).execution_message(),
            EXECUTION_FALLBACK_MESSAGE
        );
        assert_eq!(
            Error::Execution("User rejected the request".to_string()).execution_message(),
            "User rejected the request"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(Error::Rpc("503".to_string()).is_retryable());
        assert!(Error::Timeout {
            operation: "quote".to_string(),
            limit: Duration::from_secs(30)
        }
        .is_retryable());
        assert!(!Error::NoRoute.is_retryable());
        assert!(!Error::Validation("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_timeout_message_keeps_subsecond_limits() {
        let timeout = |limit| Error::Timeout {
            operation: "Quote request".to_string(),
            limit,
        };
        assert_eq!(
            timeout(Duration::from_secs(30)).to_string(),
            "Quote request timed out after 30s"
        );
        assert_eq!(
            timeout(Duration::from_millis(250)).to_string(),
            "Quote request timed out after 250ms"
        );
        assert_eq!(
            timeout(Duration::from_millis(1500)).to_string(),
            "Quote request timed out after 1500ms"
        );
    }
}
