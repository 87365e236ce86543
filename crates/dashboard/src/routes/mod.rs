//! HTTP route handlers for the dashboard API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Health check
//!
//! # Metrics
//! GET  /api/metrics/sales?days=&rule=   - Sales snapshot
//! GET  /api/metrics/trend?days=&rule=   - Sales trend (hourly for 1 day, else daily)
//! GET  /api/metrics/questions           - Question engagement snapshot
//!
//! # Sales
//! GET  /api/sales?days=                 - Pack-resolved sales with SKUs
//!
//! # Products
//! GET  /api/products                    - Listing summaries, stock and price distributions
//!
//! # Questions
//! GET  /api/questions?status=&offset=&limit= - Question inbox with listing titles
//! POST /api/questions/answer            - Answer a buyer question
//! ```
//!
//! Every read endpoint responds with the computed value and the diagnostics
//! gathered while computing it.

pub mod metrics;
pub mod products;
pub mod questions;
pub mod sales;

use axum::{Router, routing::get};
use chrono::{DateTime, FixedOffset};
use meli_pulse_core::{AccountingRule, DateWindow};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Window length used when `days` is not given.
pub const DEFAULT_DAYS: u32 = 30;

/// Longest window accepted from clients.
pub const MAX_DAYS: u32 = 365;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(metrics::router())
        .merge(sales::router())
        .merge(products::router())
        .merge(questions::router())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the marketplace.
async fn health() -> &'static str {
    "ok"
}

/// Window and rule query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    /// Days back from now.
    pub days: Option<u32>,
    /// Accounting rule; the configured default when absent.
    pub rule: Option<AccountingRule>,
}

impl WindowQuery {
    /// The requested window ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if `days` is outside `1..=365`.
    pub fn window(&self, now: DateTime<FixedOffset>) -> Result<DateWindow, AppError> {
        let days = self.days.unwrap_or(DEFAULT_DAYS);
        if !(1..=MAX_DAYS).contains(&days) {
            return Err(AppError::BadRequest(format!(
                "days must be between 1 and {MAX_DAYS}"
            )));
        }
        Ok(DateWindow::last_days(days, now))
    }

    /// The requested rule, or `default`.
    #[must_use]
    pub fn rule_or(&self, default: AccountingRule) -> AccountingRule {
        self.rule.unwrap_or(default)
    }
}

/// Current time in the seller's offset.
fn seller_now(state: &AppState) -> DateTime<FixedOffset> {
    chrono::Utc::now().with_timezone(&state.engine().options().utc_offset)
}
