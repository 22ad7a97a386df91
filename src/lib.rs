//! BLIP wallet core
//!
//! Cross-chain swap workflow over pluggable wallet and quote capabilities,
//! plus the identity gate, nearby-user discovery and social feed that make
//! up the rest of the app shell.

pub mod auth;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod feed;
pub mod quote;
pub mod registry;
pub mod swap;
pub mod wallet;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
