//! Listing summaries with their stock and price distributions.

use meli_pulse_core::{
    ItemId, Price, PriceDistribution, Product, ProductSummary, StockDistribution,
};
use rust_decimal::Decimal;

use super::fetcher::fetch_all;
use super::sku::resolve_product_sku;
use super::{Diagnostics, MetricsEngine, Report};
use crate::mercadolibre::MarketplaceApi;

/// Bins in the price histogram.
pub const PRICE_BINS: usize = 10;

impl<A: MarketplaceApi> MetricsEngine<A> {
    /// Summaries of every listing the seller has.
    ///
    /// Listings whose product record fails to load are left out. When prices
    /// fail to load the listing price is used with no promotion.
    pub async fn get_products(&self) -> Report<Vec<ProductSummary>> {
        self.within_deadline("get_products", Vec::new(), async {
            let Report {
                value: item_ids,
                mut diagnostics,
            } = self.list_item_ids().await;

            let mut summaries = Vec::with_capacity(item_ids.len());
            for item_id in &item_ids {
                let product = match self.api.get_item(item_id).await {
                    Ok(product) => product,
                    Err(e) => {
                        tracing::warn!(item_id = %item_id, error = %e, "Item fetch failed, skipping listing");
                        diagnostics.failed_item_fetches += 1;
                        continue;
                    }
                };

                let summary = match self.api.get_item_prices(item_id).await {
                    Ok(prices) => summarize_product(&product, prices.standard(), prices.promotional()),
                    Err(e) => {
                        tracing::warn!(item_id = %item_id, error = %e, "Price fetch failed, using listing price");
                        diagnostics.failed_price_fetches += 1;
                        summarize_product(&product, None, None)
                    }
                };
                summaries.push(summary);
            }

            Report::new(summaries, diagnostics)
        })
        .await
    }

    async fn list_item_ids(&self) -> Report<Vec<ItemId>> {
        let api = &self.api;
        let seller_id = self.options.seller_id.as_str();

        let fetched = fetch_all(self.options.page_size, move |offset, limit| {
            api.list_item_ids(seller_id, offset, limit)
        })
        .await;

        Report::new(
            fetched.items,
            Diagnostics {
                failed_pages: fetched.failed_pages,
                ..Diagnostics::default()
            },
        )
    }
}

/// Build a listing summary.
///
/// The standard price from the prices resource wins over the listing price.
/// A promotion is kept only when it is below the resulting price.
fn summarize_product(
    product: &Product,
    standard: Option<Decimal>,
    promotional: Option<Decimal>,
) -> ProductSummary {
    let currency = product.currency_id;
    let price = Price::new(standard.unwrap_or(product.price), currency);
    let promotional_price = promotional
        .filter(|amount| *amount < price.amount)
        .map(|amount| Price::new(amount, currency));

    ProductSummary {
        id: product.id.clone(),
        title: product.title.clone(),
        sku: resolve_product_sku(product),
        status: product.status,
        available_quantity: product.available_quantity,
        price,
        promotional_price,
    }
}

/// Count listings per stock band.
#[must_use]
pub fn stock_distribution(products: &[ProductSummary]) -> StockDistribution {
    StockDistribution::from_products(products)
}

/// Count listings per price range, over `bins` equal-width ranges.
#[must_use]
pub fn price_distribution(products: &[ProductSummary], bins: usize) -> PriceDistribution {
    PriceDistribution::from_products(products, bins)
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;
    use meli_pulse_core::{ItemPrices, ListingStatus, StockBand};
    use serde_json::json;

    use super::*;
    use crate::engine::EngineOptions;
    use crate::engine::testing::{FakeApi, product};

    fn engine(api: FakeApi) -> MetricsEngine<FakeApi> {
        MetricsEngine::new(
            api,
            EngineOptions::new("98765", FixedOffset::west_opt(3 * 3600).unwrap()),
        )
    }

    #[test]
    fn test_promotion_must_undercut_price() {
        let listing = product(json!({"id": "MLA1", "price": 1000, "available_quantity": 3}));

        let summary = summarize_product(&listing, None, Some(Decimal::new(800, 0)));
        assert_eq!(summary.effective_price().amount, Decimal::new(800, 0));

        let summary = summarize_product(&listing, Some(Decimal::new(900, 0)), Some(Decimal::new(950, 0)));
        assert_eq!(summary.price.amount, Decimal::new(900, 0));
        assert!(summary.promotional_price.is_none());
    }

    #[tokio::test]
    async fn test_get_products_with_prices_and_failures() {
        let mut api = FakeApi::default();
        api.items.insert(
            ItemId::new("MLA1"),
            product(json!({
                "id": "MLA1",
                "title": "Bombilla de alpaca",
                "price": 1000,
                "available_quantity": 0,
                "status": "active",
                "attributes": [{"id": "SELLER_SKU", "value_name": "BOMB-01"}]
            })),
        );
        api.items.insert(
            ItemId::new("MLA2"),
            product(json!({"id": "MLA2", "price": 500, "available_quantity": 8})),
        );
        api.prices.insert(
            ItemId::new("MLA1"),
            serde_json::from_value::<ItemPrices>(json!({
                "prices": [
                    {"type": "standard", "amount": 1000},
                    {"type": "promotion", "amount": 850, "regular_amount": 1000}
                ]
            }))
            .unwrap(),
        );

        let report = engine(api).get_products().await;
        let products = &report.value;

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].sku, "BOMB-01");
        assert_eq!(products[0].status, ListingStatus::Active);
        assert_eq!(products[0].effective_price().amount, Decimal::new(850, 0));
        assert_eq!(products[1].sku, "ML2");
        assert_eq!(products[1].effective_price().amount, Decimal::new(500, 0));
        assert_eq!(report.diagnostics.failed_price_fetches, 1);

        let distribution = stock_distribution(products);
        assert_eq!(distribution.count(StockBand::OutOfStock), 1);
        assert_eq!(distribution.count(StockBand::SixToTen), 1);

        let prices = price_distribution(products, 2);
        assert_eq!(prices.bins.len(), 2);
        assert_eq!(prices.bins[0].from, Decimal::new(500, 0));
        assert_eq!(prices.bins[1].to, Decimal::new(850, 0));
        assert_eq!(prices.total(), 2);
    }
}
