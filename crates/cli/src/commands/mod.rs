//! CLI subcommands.
//!
//! # Environment Variables
//!
//! Same as the dashboard server: `ML_CLIENT_ID`, `ML_CLIENT_SECRET` and
//! `ML_SELLER_ID` are required, the `PULSE_*` settings are optional.

pub mod catalog;
pub mod metrics;

use meli_pulse_core::DateWindow;
use meli_pulse_dashboard::config::{ConfigError, DashboardConfig};
use meli_pulse_dashboard::engine::{EngineOptions, MetricsEngine};
use meli_pulse_dashboard::mercadolibre::{MarketplaceError, MercadoLibreClient};
use serde::Serialize;
use thiserror::Error;

/// Longest window accepted on the command line.
const MAX_DAYS: u32 = 365;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Marketplace client could not be created.
    #[error("Marketplace error: {0}")]
    Marketplace(#[from] MarketplaceError),

    /// Output could not be serialized.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Engine over the live marketplace client.
pub type Engine = MetricsEngine<MercadoLibreClient>;

/// Build the engine from environment configuration.
///
/// # Errors
///
/// Returns `CommandError` if configuration is missing or invalid.
pub fn engine() -> Result<Engine, CommandError> {
    let config = DashboardConfig::from_env()?;
    let client = MercadoLibreClient::new(&config.marketplace)?;

    tracing::info!(seller_id = %config.marketplace.seller_id, "Configuration loaded");

    Ok(MetricsEngine::new(client, EngineOptions::from_config(&config)))
}

/// The window covering the last `days` days.
fn window(engine: &Engine, days: u32) -> Result<DateWindow, CommandError> {
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(CommandError::InvalidArgument(format!(
            "--days must be between 1 and {MAX_DAYS}"
        )));
    }
    Ok(engine.options().last_days(days))
}

/// Print a value as pretty JSON on stdout.
#[allow(clippy::print_stdout)]
fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
