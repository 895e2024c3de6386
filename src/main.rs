mod app;
mod config;
mod connection;
mod dashboard;
mod errors;
mod types;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::Session;
use crate::config::{LoggingSettings, RuntimeConfig};

#[derive(Parser)]
#[command(name = "tradesim")]
#[command(version = "0.1.0")]
#[command(about = "Terminal client for the trade simulator cost backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "tradesim.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Backend WebSocket URL (overrides the config file)
    #[arg(short, long, global = true)]
    url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard (default)
    Run,
    /// Connect, send parameters once and print the resulting metrics
    Quote {
        /// Number of metrics messages to wait for
        #[arg(short = 'n', long, default_value = "1")]
        count: u64,
        /// Order quantity in USD
        #[arg(long)]
        qty: Option<String>,
        /// Volatility
        #[arg(long)]
        vol: Option<String>,
        /// Fee tier, by index or name
        #[arg(long)]
        tier: Option<String>,
    },
    /// List the configured fee tiers
    Tiers,
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = config::load(&cli.config)?;
    if let Some(url) = cli.url {
        config.backend.url = url;
    }

    init_logging(&config.logging, cli.verbose)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Trade simulator client v0.1.0, backend {}", config.backend.url);
            app::run_interactive(&config).await?;
        }
        Commands::Quote {
            count,
            qty,
            vol,
            tier,
        } => {
            let mut session = Session::new(&config);
            if let Some(qty) = qty {
                session.form.set_quantity(&qty);
            }
            if let Some(vol) = vol {
                session.form.set_volatility(&vol);
            }
            if let Some(tier) = tier {
                session.form.select_tier(&tier)?;
            }

            let dashboard = app::run_quote(&config, session, count).await?;
            print!("{}", dashboard);
        }
        Commands::Tiers => {
            print_tiers(&config);
        }
        Commands::Config => {
            print!("{}", config::to_toml(&config)?);
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries the dashboard. `RUST_LOG` wins over
/// both the config file and `--verbose`.
fn init_logging(settings: &LoggingSettings, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { settings.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let result = if settings.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow!("failed to initialise logging: {}", e))
}

fn print_tiers(config: &RuntimeConfig) {
    println!("\n=== Fee Tiers ===");
    for (i, preset) in config.fee_tiers.iter().enumerate() {
        let marker = if i == config.form.fee_tier { "*" } else { " " };
        println!("{} {}: {}", marker, i, preset.describe());
    }
}
