//! Products API handlers.

use axum::{Json, Router, extract::State, routing::get};
use meli_pulse_core::{PriceBin, ProductSummary, StockBand, StockDistribution};
use serde::Serialize;
use tracing::instrument;

use crate::{
    engine::{Diagnostics, PRICE_BINS, price_distribution, stock_distribution},
    state::AppState,
};

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/products", get(list_products))
}

/// Listing summaries with their stock and price distributions.
#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<ProductSummary>,
    pub stock: Vec<StockBandView>,
    pub prices: Vec<PriceBin>,
    pub diagnostics: Diagnostics,
}

/// One stock band for display.
#[derive(Debug, Serialize)]
pub struct StockBandView {
    pub band: StockBand,
    pub label: &'static str,
    pub listings: u64,
}

fn band_views(distribution: &StockDistribution) -> Vec<StockBandView> {
    distribution
        .bands
        .iter()
        .map(|(band, listings)| StockBandView {
            band: *band,
            label: band.label(),
            listings: *listings,
        })
        .collect()
}

/// Every listing of the seller.
#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Json<ProductsResponse> {
    let report = state.engine().get_products().await;
    let stock = band_views(&stock_distribution(&report.value));
    let prices = price_distribution(&report.value, PRICE_BINS).bins;

    Json(ProductsResponse {
        products: report.value,
        stock,
        prices,
        diagnostics: report.diagnostics,
    })
}
