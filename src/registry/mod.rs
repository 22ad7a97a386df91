//! Static chain and token catalogue
//!
//! Chains are a closed set; tokens are looked up per (chain, network mode).
//! Nothing in here performs I/O or mutates after startup.

pub mod chain;
pub mod tokens;

pub use chain::{family_of, ChainFamily, ChainId};
pub use tokens::{
    find_token, native_token, tokens_for, verify_tables, NetworkMode, TokenDescriptor, EVM_NATIVE_SENTINEL,
    SOLANA_NATIVE_SENTINEL,
};
