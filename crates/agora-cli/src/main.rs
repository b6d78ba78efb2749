//! Agora - simulated book-trading market
//!
//! Boots a set of seller agents and one buyer agent per requested title on
//! an in-process bus, then reports every negotiation.
//!
//! # Usage
//!
//! ```bash
//! # Sellers from config/default.toml, one buyer looking for "Dune"
//! agora run Dune
//!
//! # Ad-hoc sellers and a faster schedule
//! agora run Dune Emma --sell alice:Dune=100 --sell bob:Emma=40 --tick 5
//!
//! # Environment overrides
//! AGORA__MARKET__SEED=7 AGORA__LOGGING__FORMAT=json agora run Dune
//! ```

mod config;
mod market;

use std::time::Duration;

use agora_agents::{BuyerExit, Outcome};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{AgoraConfig, LoggingConfig};
use crate::market::{run_market, Listing, MarketSummary};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Agora - autonomous agents haggling over books
#[derive(Parser, Debug)]
#[command(name = "agora")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, global = true, env = "AGORA_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AGORA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, global = true, env = "AGORA_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the market and run until every buyer is done (or Ctrl+C)
    Run {
        /// Titles to buy, one buyer each
        items: Vec<String>,

        /// Add a title to a seller's catalogue (SELLER:TITLE=PRICE)
        #[arg(long = "sell", value_name = "SELLER:TITLE=PRICE")]
        listings: Vec<Listing>,

        /// Seconds between negotiation rounds
        #[arg(long, value_name = "SECS")]
        tick: Option<f64>,

        /// Seconds to wait for replies in each phase (0 waits forever)
        #[arg(long, value_name = "SECS")]
        phase_timeout: Option<f64>,

        /// Seed for reproducible discounts
        #[arg(long)]
        seed: Option<u64>,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut agora_config = AgoraConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        agora_config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        agora_config.logging.format = format;
    }

    init_logging(&agora_config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Agora");

    match cli.command {
        Commands::Run {
            items,
            listings,
            tick,
            phase_timeout,
            seed,
        } => {
            if let Some(secs) = tick {
                agora_config.buyer.tick_interval_secs = secs;
            }
            if let Some(seed) = seed {
                agora_config.market.seed = Some(seed);
            }
            if let Some(secs) = phase_timeout {
                agora_config.buyer.negotiation.phase_timeout = (secs > 0.0 && secs.is_finite())
                    .then(|| Duration::from_secs_f64(secs));
            }
            agora_config.validate()?;

            let summary = run_market(&agora_config, &items, listings, shutdown_signal()).await?;
            print_summary(&summary);
        }
    }

    Ok(())
}

/// Initialize logging
fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .try_init()?;
        }
        _ => {
            subscriber
                .with(fmt::layer().pretty().with_target(true))
                .try_init()?;
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

fn print_summary(summary: &MarketSummary) {
    println!();
    println!("Negotiations: {}", summary.reports.len());
    for report in &summary.reports {
        println!(
            "  {} [{}] {} seller(s): {}",
            report.negotiation_id,
            report.item,
            report.sellers.len(),
            describe(&report.outcome)
        );
    }

    println!("Buyers:");
    for (buyer, exit) in &summary.exits {
        let line = match exit {
            BuyerExit::Purchased { seller, price } => {
                format!("bought from {seller} for {price}")
            }
            BuyerExit::NoTarget => "no target title".to_string(),
            BuyerExit::Shutdown => "stopped before buying".to_string(),
        };
        println!("  {buyer}: {line}");
    }
}

fn describe(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Purchased { seller, price } => {
            format!("purchased from {seller} at {price}")
        }
        other => match other.seller() {
            Some(seller) => format!("{} ({seller})", other.reason()),
            None => other.reason().to_string(),
        },
    }
}
