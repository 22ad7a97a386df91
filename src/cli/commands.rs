//! CLI command implementations

use anyhow::Result;
use dialoguer::Confirm;
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::discovery::{BluetoothAdapter, NearbyScanner, SimulatedAdapter, UnsupportedAdapter};
use crate::quote::{AggregatorClient, QuoteResult};
use crate::registry::{tokens_for, ChainId};
use crate::swap::SwapWorkflow;
use crate::wallet::{
    load_keypair, shorten_address, Eip1193Provider, EvmWallet, JsonRpcProvider, SolanaWallet,
    WalletSet,
};

/// Route and amount as given on the command line
#[derive(Debug, Clone)]
pub struct RouteArgs {
    pub from: Option<ChainId>,
    pub to: Option<ChainId>,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub amount: Option<String>,
}

/// Wallets built from config and `KEYPAIR_PATH`
fn build_wallets(config: &Config, aggregator: Arc<AggregatorClient>) -> Result<WalletSet> {
    let solana = match std::env::var("KEYPAIR_PATH") {
        Ok(path) => {
            let keypair = load_keypair(&path)?;
            SolanaWallet::with_signer(&config.rpc, aggregator.clone(), keypair)
        }
        Err(_) => {
            warn!("KEYPAIR_PATH not set; Solana wallet is not connected");
            SolanaWallet::new(&config.rpc, aggregator.clone())
        }
    };

    let provider: Arc<dyn Eip1193Provider> = Arc::new(JsonRpcProvider::new(&config.rpc)?);
    let evm = EvmWallet::new(Some(provider), aggregator);

    Ok(WalletSet::new(Arc::new(solana), Arc::new(evm)))
}

/// Workflow seeded from config, then overridden by the command line
async fn build_workflow(config: &Config, route: &RouteArgs) -> Result<SwapWorkflow> {
    let aggregator = Arc::new(AggregatorClient::new(&config.quote)?);
    let wallets = build_wallets(config, aggregator.clone())?;
    let workflow = SwapWorkflow::from_config(aggregator, wallets, config);

    if let Some(chain) = route.from {
        workflow.set_source_chain(chain).await;
    }
    if let Some(chain) = route.to {
        workflow.set_destination_chain(chain).await;
    }
    if let Some(token) = &route.from_token {
        workflow.set_source_token(token).await?;
    }
    if let Some(token) = &route.to_token {
        workflow.set_destination_token(token).await?;
    }
    if let Some(amount) = &route.amount {
        workflow.set_amount(amount.clone()).await;
    }

    Ok(workflow)
}

fn print_quote(quote: &QuoteResult, source_symbol: &str, destination_symbol: &str) {
    println!("  Route:      {}", quote.route_type);
    println!("  Fee:        {}", quote.fee_display(source_symbol));
    println!("  ETA:        {}", quote.eta_display());
    println!("  Slippage:   {}%", quote.slippage_percent());
    if let Some(out) = quote.expected_amount_out {
        println!("  Expected:   {} {}", out, destination_symbol);
    }
    if let Some(min) = quote.min_amount_out {
        println!("  Minimum:    {} {}", min, destination_symbol);
    }
}

/// List tradable tokens for one chain or all of them
pub fn tokens(config: &Config, chain: Option<ChainId>) -> Result<()> {
    let mode = config.network.mode;
    let chains: Vec<ChainId> = match chain {
        Some(chain) => vec![chain],
        None => ChainId::ALL.to_vec(),
    };

    println!("\n=== TOKENS ({}) ===", mode);
    for chain in chains {
        println!("\n{} [{}]", chain.display_name(), chain.family());
        for token in tokens_for(chain, mode) {
            let marker = if token.is_native() { " (native)" } else { "" };
            println!("  {:<8} {}{}", token.display_name, token.contract_reference, marker);
        }
    }
    Ok(())
}

/// Fetch and print quotes for a route
pub async fn quote(config: &Config, route: RouteArgs) -> Result<()> {
    let workflow = build_workflow(config, &route).await?;
    let selection = workflow.snapshot().await.selection;

    info!(
        "Quote: {} {} ({}) -> {} ({})",
        selection.amount,
        selection.source_token.display_name,
        selection.source_chain,
        selection.destination_token.display_name,
        selection.destination_chain
    );

    workflow.request_quote().await?;
    let snapshot = workflow.snapshot().await;

    println!(
        "\n=== QUOTE: {} {} ({}) -> {} ({}) ===\n",
        selection.amount,
        selection.source_token.display_name,
        selection.source_chain.display_name(),
        selection.destination_token.display_name,
        selection.destination_chain.display_name()
    );
    for (i, quote) in snapshot.quotes.iter().enumerate() {
        let marker = if i == 0 { " (selected)" } else { "" };
        println!("#{}{}", i + 1, marker);
        print_quote(
            quote,
            selection.source_token.display_name,
            selection.destination_token.display_name,
        );
        println!();
    }

    Ok(())
}

/// Quote, confirm and submit a swap
pub async fn swap(
    config: &Config,
    route: RouteArgs,
    recipient: Option<String>,
    force: bool,
    dry_run: bool,
) -> Result<()> {
    let workflow = build_workflow(config, &route).await?;
    workflow.set_recipient(recipient.as_deref()).await?;

    let quote = workflow.request_quote().await?;
    let selection = workflow.snapshot().await.selection;

    println!(
        "\nSwap {} {} on {} for {} on {}",
        selection.amount,
        selection.source_token.display_name,
        selection.source_chain.display_name(),
        selection.destination_token.display_name,
        selection.destination_chain.display_name()
    );
    print_quote(
        &quote,
        selection.source_token.display_name,
        selection.destination_token.display_name,
    );

    if dry_run {
        info!("DRY-RUN: Would submit swap via {} route", quote.route_type);
        return Ok(());
    }

    if !workflow.can_execute().await {
        anyhow::bail!(
            "Connect a {} wallet before swapping",
            selection.source_chain.family()
        );
    }

    // Confirmation prompt (unless --force)
    if config.swap.require_confirmation && !force {
        let confirmed = Confirm::new()
            .with_prompt("Submit this swap? This cannot be undone.")
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Swap cancelled by user");
            return Ok(());
        }
    }

    match workflow.execute_swap().await {
        Ok(Some(result)) => {
            println!("\nSwap submitted!");
            println!("Transaction: {}", result.transaction_reference);
            Ok(())
        }
        Ok(None) => anyhow::bail!("Swap not executed: no quote or wallet available"),
        Err(e) => {
            if e.is_user_input() {
                warn!("Swap not submitted: {}", e);
            } else {
                error!("Swap failed: {}", e);
            }
            Err(e.into())
        }
    }
}

/// Scan for nearby users
pub async fn scan(config: &Config, count: usize) -> Result<()> {
    let adapter: Arc<dyn BluetoothAdapter> = if config.discovery.simulation {
        Arc::new(SimulatedAdapter::new(Duration::from_millis(
            config.discovery.scan_delay_ms,
        )))
    } else {
        Arc::new(UnsupportedAdapter)
    };
    let scanner = NearbyScanner::new(adapter);

    if !scanner.is_supported() {
        anyhow::bail!(
            "{} (enable discovery.simulation to use simulated users)",
            scanner.error().await.unwrap_or_default()
        );
    }

    println!("\nScanning for nearby users...");
    for _ in 0..count.max(1) {
        if let Err(e) = scanner.start_scan().await {
            warn!("Scan stopped: {}", e);
            break;
        }
    }

    let devices = scanner.devices().await;
    println!("\n=== NEARBY ({}) ===\n", devices.len());
    for device in devices {
        println!(
            "  {:<12} {:<16} {}",
            device.id,
            device.name,
            device.distance.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check system health
pub async fn health(config: &Config) -> Result<()> {
    println!("\n=== SYSTEM HEALTH CHECK ===\n");

    let mut all_healthy = true;

    print!("Solana RPC... ");
    match check_solana_rpc(config).await {
        Ok(latency) => println!("OK ({}ms)", latency),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    print!("Swap aggregator... ");
    match AggregatorClient::new(&config.quote)?.ping().await {
        Ok(latency) => println!("OK ({}ms)", latency.as_millis()),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    print!("EVM provider... ");
    match check_evm_provider(config).await {
        Ok(chain_id) => println!("OK (chain id {})", chain_id),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    print!("Keypair... ");
    match std::env::var("KEYPAIR_PATH") {
        Ok(path) => match load_keypair(&path) {
            Ok(keypair) => {
                use solana_sdk::signer::Signer;
                println!("OK ({})", shorten_address(&keypair.pubkey().to_string(), 4, 4));
            }
            Err(e) => {
                println!("FAILED: {}", e);
                all_healthy = false;
            }
        },
        Err(_) => println!("NOT SET (Solana swaps disabled)"),
    }

    println!();
    if all_healthy {
        println!("All systems healthy!");
    } else {
        println!("Some systems are unhealthy. Check the errors above.");
    }

    Ok(())
}

async fn check_solana_rpc(config: &Config) -> Result<u64> {
    let client = RpcClient::new_with_timeout(
        config.rpc.solana_endpoint.clone(),
        Duration::from_millis(config.rpc.timeout_ms),
    );

    let start = Instant::now();
    client.get_slot().await?;
    Ok(start.elapsed().as_millis() as u64)
}

async fn check_evm_provider(config: &Config) -> Result<u64> {
    let provider = JsonRpcProvider::new(&config.rpc)?;
    let value = provider.request("eth_chainId", json!([])).await?;
    let hex = value.as_str().unwrap_or_default().trim_start_matches("0x");
    u64::from_str_radix(hex, 16)
        .map_err(|e| anyhow::anyhow!("Unexpected chain id {}: {}", value, e))
}
