//! Sales API handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use meli_pulse_core::SaleRecord;
use tracing::instrument;

use super::{WindowQuery, seller_now};
use crate::{engine::Report, error::AppError, state::AppState};

/// Build the sales router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/sales", get(list_sales))
}

/// Pack-resolved sales in the requested window.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the window is out of range.
#[instrument(skip(state))]
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Report<Vec<SaleRecord>>>, AppError> {
    let window = query.window(seller_now(&state))?;

    Ok(Json(state.engine().get_sales(window).await))
}
