//! Sales commands.

use meli_pulse_core::AccountingRule;

use super::{CommandError, Engine, print_json, window};

/// Print the sales snapshot.
///
/// # Errors
///
/// Returns `CommandError` if `days` is out of range or output fails.
pub async fn sales(
    engine: &Engine,
    days: u32,
    rule: Option<AccountingRule>,
) -> Result<(), CommandError> {
    let window = window(engine, days)?;
    let rule = rule.unwrap_or(engine.options().accounting_rule);

    tracing::info!(days, %rule, "Computing sales metrics");
    print_json(&engine.sales_metrics_report(window, rule).await)
}

/// Print the sales trend.
///
/// # Errors
///
/// Returns `CommandError` if `days` is out of range or output fails.
pub async fn trend(
    engine: &Engine,
    days: u32,
    rule: Option<AccountingRule>,
) -> Result<(), CommandError> {
    let window = window(engine, days)?;
    let rule = rule.unwrap_or(engine.options().accounting_rule);

    tracing::info!(days, %rule, "Computing sales trend");
    print_json(&engine.sales_trend_report(window, rule).await)
}

/// Print pack-resolved sales.
///
/// # Errors
///
/// Returns `CommandError` if `days` is out of range or output fails.
pub async fn sales_list(engine: &Engine, days: u32) -> Result<(), CommandError> {
    let window = window(engine, days)?;
    print_json(&engine.get_sales(window).await)
}

/// Print the raw order listing.
///
/// # Errors
///
/// Returns `CommandError` if `days` is out of range or output fails.
pub async fn orders(engine: &Engine, days: u32) -> Result<(), CommandError> {
    let window = window(engine, days)?;
    print_json(&engine.get_orders(window).await)
}
