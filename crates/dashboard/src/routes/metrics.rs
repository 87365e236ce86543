//! Metrics API handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use meli_pulse_core::{MetricSnapshot, QuestionSnapshot, TrendPoint};
use tracing::instrument;

use super::{WindowQuery, seller_now};
use crate::{engine::Report, error::AppError, state::AppState};

/// Build the metrics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/metrics/sales", get(sales_metrics))
        .route("/api/metrics/trend", get(sales_trend))
        .route("/api/metrics/questions", get(questions_metrics))
}

/// Sales snapshot for the requested window.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the window is out of range.
#[instrument(skip(state))]
pub async fn sales_metrics(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Report<MetricSnapshot>>, AppError> {
    let window = query.window(seller_now(&state))?;
    let rule = query.rule_or(state.engine().options().accounting_rule);

    Ok(Json(state.engine().sales_metrics_report(window, rule).await))
}

/// Sales trend for the requested window.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the window is out of range.
#[instrument(skip(state))]
pub async fn sales_trend(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Report<Vec<TrendPoint>>>, AppError> {
    let window = query.window(seller_now(&state))?;
    let rule = query.rule_or(state.engine().options().accounting_rule);

    Ok(Json(state.engine().sales_trend_report(window, rule).await))
}

/// Question engagement snapshot.
#[instrument(skip(state))]
pub async fn questions_metrics(State(state): State<AppState>) -> Json<Report<QuestionSnapshot>> {
    Json(state.engine().questions_metrics_report().await)
}
