//! BLIP - cross-chain swap wallet CLI
//!
//! # WARNING
//! - Swaps move real funds on mainnet. Use `network.mode = "test"` first.
//! - Cross-chain routes can take minutes to settle on the destination chain.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use blip::cli::commands::{self, RouteArgs};
use blip::config::Config;
use blip::registry::{verify_tables, ChainId};

/// BLIP - cross-chain swap wallet
#[derive(Parser)]
#[command(name = "blip")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct RouteOpts {
    /// Source chain (defaults to swap.default_source_chain)
    #[arg(long)]
    from: Option<ChainId>,

    /// Destination chain (defaults to swap.default_destination_chain)
    #[arg(long)]
    to: Option<ChainId>,

    /// Source token name (defaults to the chain's native asset)
    #[arg(long)]
    from_token: Option<String>,

    /// Destination token name (defaults to the chain's native asset)
    #[arg(long)]
    to_token: Option<String>,

    /// Amount of the source token (defaults to swap.default_amount)
    #[arg(short, long)]
    amount: Option<String>,
}

impl From<RouteOpts> for RouteArgs {
    fn from(opts: RouteOpts) -> Self {
        RouteArgs {
            from: opts.from,
            to: opts.to,
            from_token: opts.from_token,
            to_token: opts.to_token,
            amount: opts.amount,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List tradable tokens
    Tokens {
        /// Only show this chain
        chain: Option<ChainId>,
    },

    /// Fetch quotes for a route
    Quote {
        #[command(flatten)]
        route: RouteOpts,
    },

    /// Quote and submit a swap
    Swap {
        #[command(flatten)]
        route: RouteOpts,

        /// Destination address when the destination wallet is not connected
        #[arg(long)]
        recipient: Option<String>,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,

        /// Quote only, don't submit
        #[arg(long)]
        dry_run: bool,
    },

    /// Scan for nearby users
    Scan {
        /// Number of scan rounds
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,
    },

    /// Show current configuration (secrets masked)
    Config,

    /// Check system health (RPC, aggregator, EVM provider, keypair)
    Health,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("blip=info".parse().unwrap());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(cli.json);

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Perform startup checks
    if let Err(e) = startup_checks(&config) {
        error!("Startup checks failed: {}", e);
        std::process::exit(1);
    }

    // Execute command
    let result = match cli.command {
        Commands::Tokens { chain } => commands::tokens(&config, chain),
        Commands::Quote { route } => commands::quote(&config, route.into()).await,
        Commands::Swap {
            route,
            recipient,
            force,
            dry_run,
        } => commands::swap(&config, route.into(), recipient, force, dry_run).await,
        Commands::Scan { count } => commands::scan(&config, count).await,
        Commands::Config => commands::show_config(&config),
        Commands::Health => commands::health(&config).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Perform startup safety checks
fn startup_checks(config: &Config) -> Result<()> {
    info!("Performing startup checks...");

    verify_tables()?;

    if config.network.mode.is_test() {
        warn!("Test network mode: quotes and tokens use testnet assets");
    } else if !config.swap.require_confirmation {
        warn!("Swap confirmation disabled on mainnet");
    }

    info!("Startup checks passed");
    Ok(())
}
