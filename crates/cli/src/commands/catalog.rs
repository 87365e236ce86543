//! Question and listing commands.

use meli_pulse_core::QuestionFilter;
use meli_pulse_dashboard::engine::{PRICE_BINS, price_distribution, stock_distribution};
use serde_json::json;

use super::{CommandError, Engine, print_json};

/// Print question engagement metrics.
///
/// # Errors
///
/// Returns `CommandError` if output fails.
pub async fn questions(engine: &Engine) -> Result<(), CommandError> {
    print_json(&engine.questions_metrics_report().await)
}

/// Print the question inbox.
///
/// # Errors
///
/// Returns `CommandError` if output fails.
pub async fn inbox(engine: &Engine, status: Option<QuestionFilter>) -> Result<(), CommandError> {
    print_json(&engine.get_questions(status).await)
}

/// Print listing summaries with their stock and price distributions.
///
/// # Errors
///
/// Returns `CommandError` if output fails.
pub async fn products(engine: &Engine) -> Result<(), CommandError> {
    let report = engine.get_products().await;
    let stock: Vec<_> = stock_distribution(&report.value)
        .bands
        .into_iter()
        .map(|(band, listings)| json!({ "band": band, "label": band.label(), "listings": listings }))
        .collect();
    let prices = price_distribution(&report.value, PRICE_BINS);

    print_json(&json!({
        "products": report.value,
        "stock": stock,
        "prices": prices.bins,
        "diagnostics": report.diagnostics,
    }))
}
