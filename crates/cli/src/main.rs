//! Meli Pulse CLI - compute seller metrics from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Sales snapshot for the last 30 days under the configured rule
//! pulse-cli sales
//!
//! # Hourly trend for the last day, revenue from order totals
//! pulse-cli trend --days 1 --rule order_total
//!
//! # Question engagement
//! pulse-cli questions
//!
//! # Unanswered questions with their listings
//! pulse-cli inbox --status unanswered
//!
//! # Listing summaries with stock and price distributions
//! pulse-cli products
//!
//! # Raw orders for the last week
//! pulse-cli orders --days 7
//! ```
//!
//! Configuration is read from the environment (and `.env`), the same as
//! the dashboard server. Results are printed to stdout as pretty JSON.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use meli_pulse_core::{AccountingRule, QuestionFilter};

mod commands;

#[derive(Parser)]
#[command(name = "pulse-cli")]
#[command(author, version, about = "Meli Pulse CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sales snapshot for a window
    Sales(WindowArgs),
    /// Sales trend for a window
    Trend(WindowArgs),
    /// Pack-resolved sales with SKUs
    SalesList {
        /// Days back from now
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },
    /// Question engagement snapshot
    Questions,
    /// Question inbox with listing titles and SKUs
    Inbox {
        /// `answered` or `unanswered`; every question when absent
        #[arg(short, long)]
        status: Option<QuestionFilter>,
    },
    /// Listing summaries with stock and price distributions
    Products,
    /// Orders listed by the marketplace
    Orders {
        /// Days back from now
        #[arg(short, long, default_value_t = 30)]
        days: u32,
    },
}

#[derive(Args)]
struct WindowArgs {
    /// Days back from now
    #[arg(short, long, default_value_t = 30)]
    days: u32,

    /// Accounting rule (`computed`, `payment`, `order_total`)
    #[arg(short, long)]
    rule: Option<AccountingRule>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meli_pulse_dashboard=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let engine = commands::engine()?;

    match cli.command {
        Commands::Sales(args) => commands::metrics::sales(&engine, args.days, args.rule).await?,
        Commands::Trend(args) => commands::metrics::trend(&engine, args.days, args.rule).await?,
        Commands::SalesList { days } => commands::metrics::sales_list(&engine, days).await?,
        Commands::Orders { days } => commands::metrics::orders(&engine, days).await?,
        Commands::Questions => commands::catalog::questions(&engine).await?,
        Commands::Inbox { status } => commands::catalog::inbox(&engine, status).await?,
        Commands::Products => commands::catalog::products(&engine).await?,
    }
    Ok(())
}
