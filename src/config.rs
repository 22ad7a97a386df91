//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::auth::{EmbeddedWalletPolicy, OAuthProvider};
use crate::registry::{ChainId, NetworkMode};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    pub rpc: RpcConfig,
    pub quote: QuoteConfig,
    #[serde(default)]
    pub swap: SwapConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

/// Main vs test network toggle
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetworkConfig {
    #[serde(default)]
    pub mode: NetworkMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_solana_endpoint")]
    pub solana_endpoint: String,
    /// JSON-RPC endpoint of the injected EVM wallet (e.g. a local signer)
    #[serde(default = "default_evm_endpoint")]
    pub evm_endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteConfig {
    #[serde(default = "default_quote_api_url")]
    pub api_url: String,
    /// 300 = 3%
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u32,
    /// Native amount delivered on the destination chain for gas
    #[serde(default = "default_gas_drop")]
    pub gas_drop: f64,
    #[serde(default = "default_request_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapConfig {
    #[serde(default = "default_request_timeout_ms")]
    pub execute_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub require_confirmation: bool,
    #[serde(default = "default_amount")]
    pub default_amount: String,
    #[serde(default = "default_source_chain")]
    pub default_source_chain: ChainId,
    #[serde(default = "default_destination_chain")]
    pub default_destination_chain: ChainId,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            execute_timeout_ms: default_request_timeout_ms(),
            require_confirmation: true,
            default_amount: default_amount(),
            default_source_chain: default_source_chain(),
            default_destination_chain: default_destination_chain(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Allowed OAuth providers; exactly one is supported
    #[serde(default = "default_login_methods")]
    pub login_methods: Vec<OAuthProvider>,
    #[serde(default)]
    pub embedded_wallets: EmbeddedWalletPolicy,
    #[serde(default = "default_login_route")]
    pub login_route: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_methods: default_login_methods(),
            embedded_wallets: EmbeddedWalletPolicy::default(),
            login_route: default_login_route(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Use the simulated adapter instead of a real radio
    #[serde(default)]
    pub simulation: bool,
    #[serde(default = "default_scan_delay_ms")]
    pub scan_delay_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            simulation: false,
            scan_delay_ms: default_scan_delay_ms(),
        }
    }
}

/// User-facing settings page toggles
#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesConfig {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            dark_mode: false,
            notifications: true,
            language: default_language(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_solana_endpoint() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_evm_endpoint() -> String {
    "http://127.0.0.1:1248".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_quote_api_url() -> String {
    "https://price-api.mayan.finance/v3".to_string()
}

fn default_slippage_bps() -> u32 {
    300
}

fn default_gas_drop() -> f64 {
    0.001
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_amount() -> String {
    "0.01".to_string()
}

fn default_source_chain() -> ChainId {
    ChainId::Solana
}

fn default_destination_chain() -> ChainId {
    ChainId::Ethereum
}

fn default_login_methods() -> Vec<OAuthProvider> {
    vec![OAuthProvider::Google]
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_scan_delay_ms() -> u64 {
    2_000
}

fn default_language() -> String {
    "en".to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.solana_endpoint", default_solana_endpoint())?
            .set_default("rpc.evm_endpoint", default_evm_endpoint())?
            .set_default("rpc.timeout_ms", default_timeout_ms() as i64)?
            .set_default("quote.api_url", default_quote_api_url())?
            .set_default("quote.slippage_bps", default_slippage_bps() as i64)?
            .set_default("quote.gas_drop", default_gas_drop())?
            .set_default("quote.timeout_ms", default_request_timeout_ms() as i64)?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix BLIP__)
            .add_source(
                config::Environment::with_prefix("BLIP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.quote.slippage_bps > 10000 {
            anyhow::bail!("slippage_bps cannot exceed 10000 (100%)");
        }

        if !(self.quote.gas_drop > 0.0) {
            anyhow::bail!("gas_drop must be positive");
        }

        if self.quote.timeout_ms == 0 || self.swap.execute_timeout_ms == 0 || self.rpc.timeout_ms == 0 {
            anyhow::bail!("timeouts must be positive");
        }

        for (name, value) in [
            ("rpc.solana_endpoint", &self.rpc.solana_endpoint),
            ("rpc.evm_endpoint", &self.rpc.evm_endpoint),
            ("quote.api_url", &self.quote.api_url),
        ] {
            url::Url::parse(value).with_context(|| format!("Invalid {}: {}", name, mask_url(value)))?;
        }

        if self.auth.login_methods.len() != 1 {
            anyhow::bail!(
                "Exactly one login method must be configured, got {}",
                self.auth.login_methods.len()
            );
        }

        if !self.auth.login_route.starts_with('/') {
            anyhow::bail!("login_route must be an absolute path");
        }

        if self.network.mode.is_test() {
            tracing::warn!("Running against TEST networks - token table and quotes use testnet assets");
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Network:
    mode: {}
  RPC:
    solana: {}
    evm: {}
    timeout: {}ms
  Quote:
    api_url: {}
    slippage: {}bps
    gas_drop: {}
    timeout: {}ms
    referrer: {}
  Swap:
    execute_timeout: {}ms
    require_confirmation: {}
    default_route: {} -> {} ({})
  Auth:
    login_methods: {:?}
    embedded_wallets: {:?}
  Discovery:
    simulation: {}
  Preferences:
    dark_mode: {}
    notifications: {}
    language: {}
"#,
            self.network.mode,
            mask_url(&self.rpc.solana_endpoint),
            mask_url(&self.rpc.evm_endpoint),
            self.rpc.timeout_ms,
            mask_url(&self.quote.api_url),
            self.quote.slippage_bps,
            self.quote.gas_drop,
            self.quote.timeout_ms,
            self.quote.referrer.as_deref().unwrap_or("(not set)"),
            self.swap.execute_timeout_ms,
            self.swap.require_confirmation,
            self.swap.default_source_chain,
            self.swap.default_destination_chain,
            self.swap.default_amount,
            self.auth.login_methods,
            self.auth.embedded_wallets,
            self.discovery.simulation,
            self.preferences.dark_mode,
            self.preferences.notifications,
            self.preferences.language,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
pub fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            rpc: RpcConfig {
                solana_endpoint: default_solana_endpoint(),
                evm_endpoint: default_evm_endpoint(),
                timeout_ms: default_timeout_ms(),
            },
            quote: QuoteConfig {
                api_url: default_quote_api_url(),
                slippage_bps: default_slippage_bps(),
                gas_drop: default_gas_drop(),
                timeout_ms: default_request_timeout_ms(),
                referrer: None,
            },
            swap: SwapConfig::default(),
            auth: AuthConfig::default(),
            discovery: DiscoveryConfig::default(),
            preferences: PreferencesConfig::default(),
        }
    }
}
