//! Snapshots, trends, SKUs and listings through the metrics engine.

use meli_pulse_core::{AccountingRule, DateWindow, ItemPrices, StockBand};
use meli_pulse_dashboard::engine::{PRICE_BINS, price_distribution, stock_distribution};
use meli_pulse_integration_tests::{FakeMarketplace, at, engine, line, order, product};
use rust_decimal::Decimal;
use serde_json::json;

fn month() -> DateWindow {
    DateWindow::last_days(30, at("2024-03-15T12:00:00-03:00"))
}

fn afternoon_sale() -> FakeMarketplace {
    FakeMarketplace::new().with_orders([
        order(
            "3001",
            "2024-03-01T14:30:00.000-03:00",
            None,
            vec![line("MLA10", 2, 500)],
            Some(1000),
        ),
        order(
            "3002",
            "2024-03-01T14:55:00.000-03:00",
            None,
            vec![line("MLA11", 1, 250)],
            Some(250),
        ),
    ])
}

#[tokio::test]
async fn test_single_day_window_buckets_by_hour() {
    let day = DateWindow::last_days(1, at("2024-03-01T23:00:00-03:00"));
    let engine = engine(afternoon_sale(), 50);

    let trend = engine.get_sales_trend(day, AccountingRule::Payment).await;

    assert_eq!(trend.len(), 24);
    let bucket = trend.iter().find(|p| p.bucket_label == "14:00").unwrap();
    assert_eq!(bucket.items, 3);
    assert_eq!(bucket.revenue, Decimal::new(1250, 0));
    let others: u64 = trend
        .iter()
        .filter(|p| p.bucket_label != "14:00")
        .map(|p| p.items)
        .sum();
    assert_eq!(others, 0);
}

#[tokio::test]
async fn test_month_window_buckets_by_date() {
    let engine = engine(afternoon_sale(), 50);

    let trend = engine.get_sales_trend(month(), AccountingRule::Payment).await;

    // 2024-02-14 through 2024-03-15
    assert_eq!(trend.len(), 31);
    assert_eq!(trend[0].bucket_label, "2024-02-14");
    let bucket = trend.iter().find(|p| p.bucket_label == "2024-03-01").unwrap();
    assert_eq!(bucket.items, 3);
    assert_eq!(bucket.revenue, Decimal::new(1250, 0));
}

#[tokio::test]
async fn test_empty_window_gives_zero_snapshot() {
    let engine = engine(FakeMarketplace::new(), 50);

    let snapshot = engine
        .get_sales_metrics(month(), AccountingRule::Payment)
        .await;

    assert_eq!(snapshot.total_sales, 0);
    assert_eq!(snapshot.total_items, 0);
    assert_eq!(snapshot.avg_price, Decimal::ZERO);
}

#[tokio::test]
async fn test_accounting_rules_differ_on_discounted_order() {
    let discounted = order(
        "3100",
        "2024-03-10T11:00:00.000-03:00",
        None,
        vec![line("MLA10", 2, 500)],
        Some(900),
    );
    let engine = engine(FakeMarketplace::new().with_orders([discounted]), 50);

    let payment = engine
        .get_sales_metrics(month(), AccountingRule::Payment)
        .await;
    let computed = engine
        .get_sales_metrics(month(), AccountingRule::Computed)
        .await;

    assert_eq!(payment.total_revenue, Decimal::new(900, 0));
    assert_eq!(payment.avg_price, Decimal::new(450, 0));
    assert_eq!(computed.total_revenue, Decimal::new(1000, 0));
}

#[tokio::test]
async fn test_overflowing_line_total_contributes_zero() {
    let mut huge = line("MLA40", 2, 0);
    huge["unit_price"] = json!("79228162514264337593543950335");
    let api = FakeMarketplace::new().with_orders([
        order("3400", "2024-03-10T11:00:00.000-03:00", None, vec![huge], Some(100)),
        order(
            "3401",
            "2024-03-10T12:00:00.000-03:00",
            None,
            vec![line("MLA41", 1, 250)],
            Some(250),
        ),
    ]);
    let engine = engine(api, 50);

    let report = engine
        .sales_metrics_report(month(), AccountingRule::Computed)
        .await;

    assert_eq!(report.value.total_sales, 2);
    assert_eq!(report.value.total_items, 3);
    assert_eq!(report.value.total_revenue, Decimal::new(250, 0));
    assert_eq!(report.diagnostics.overflowed_amounts, 1);
    assert!(report.diagnostics.is_degraded());
}

#[tokio::test]
async fn test_overflowing_payments_contribute_zero() {
    let orders: Vec<_> = ["3500", "3501"]
        .into_iter()
        .map(|id| {
            let mut o = order(id, "2024-03-10T11:00:00.000-03:00", None, vec![line("MLA50", 1, 1)], Some(1));
            o.payments[0].transaction_amount = Decimal::MAX;
            o
        })
        .collect();
    let engine = engine(FakeMarketplace::new().with_orders(orders), 50);

    let report = engine
        .sales_metrics_report(month(), AccountingRule::Payment)
        .await;
    let trend = engine
        .sales_trend_report(month(), AccountingRule::Payment)
        .await;

    assert_eq!(report.value.total_sales, 2);
    assert_eq!(report.value.total_revenue, Decimal::MAX);
    assert_eq!(report.diagnostics.overflowed_amounts, 1);

    let bucket = trend
        .value
        .iter()
        .find(|p| p.bucket_label == "2024-03-10")
        .unwrap();
    assert_eq!(bucket.items, 2);
    assert_eq!(bucket.revenue, Decimal::MAX);
    assert_eq!(trend.diagnostics.overflowed_amounts, 1);
}

#[tokio::test]
async fn test_line_seller_sku_beats_attribute() {
    let mut with_sku = line("MLA20", 1, 100);
    with_sku["item"]["seller_sku"] = json!("LINE-SKU");
    let api = FakeMarketplace::new()
        .with_orders([
            order("3201", "2024-03-10T11:00:00.000-03:00", None, vec![with_sku], Some(100)),
            order(
                "3202",
                "2024-03-10T12:00:00.000-03:00",
                None,
                vec![line("MLA20", 1, 100)],
                Some(100),
            ),
        ])
        .with_item(product(json!({
            "id": "MLA20",
            "title": "Yerba mate 1kg",
            "price": 100,
            "attributes": [{"id": "SELLER_SKU", "value_name": "ATTR-SKU"}]
        })));
    let engine = engine(api, 50);

    let sales = engine.get_sales(month()).await.value;

    assert_eq!(sales[0].lines[0].sku.as_deref(), Some("LINE-SKU"));
    assert_eq!(sales[1].lines[0].sku.as_deref(), Some("ATTR-SKU"));
    // The listing is fetched once for both lines
    assert_eq!(engine.api().calls().items.len(), 1);
}

#[tokio::test]
async fn test_unresolvable_sku_falls_back_to_listing_id() {
    let api = FakeMarketplace::new().with_orders([order(
        "3301",
        "2024-03-10T11:00:00.000-03:00",
        None,
        vec![line("MLA123456", 1, 100)],
        Some(100),
    )]);
    let engine = engine(api, 50);

    let report = engine.get_sales(month()).await;

    assert_eq!(report.value[0].lines[0].sku.as_deref(), Some("ML123456"));
    assert_eq!(report.diagnostics.failed_item_fetches, 1);
}

#[tokio::test]
async fn test_products_with_promotions_stock_bands_and_price_bins() {
    let prices: ItemPrices = serde_json::from_value(json!({
        "prices": [
            {"type": "standard", "amount": 2000},
            {"type": "promotion", "amount": 1600, "regular_amount": 2000}
        ]
    }))
    .unwrap();
    let api = FakeMarketplace::new()
        .with_item(product(json!({
            "id": "MLA30",
            "title": "Termo acero 1L",
            "price": 2100,
            "available_quantity": 4,
            "status": "active",
            "seller_custom_field": "TERMO-1L"
        })))
        .with_item(product(json!({
            "id": "MLA31",
            "title": "Bombilla",
            "price": 300,
            "available_quantity": 0,
            "status": "paused"
        })))
        .with_prices("MLA30", prices);
    let engine = engine(api, 50);

    let report = engine.get_products().await;
    let products = &report.value;

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].sku, "TERMO-1L");
    assert_eq!(products[0].price.amount, Decimal::new(2000, 0));
    assert_eq!(products[0].effective_price().amount, Decimal::new(1600, 0));
    assert_eq!(products[1].sku, "ML31");
    assert_eq!(products[1].effective_price().amount, Decimal::new(300, 0));
    assert_eq!(report.diagnostics.failed_price_fetches, 1);

    let distribution = stock_distribution(products);
    assert_eq!(distribution.count(StockBand::OutOfStock), 1);
    assert_eq!(distribution.count(StockBand::OneToFive), 1);

    // The promotional price of MLA30 sets the top of the histogram
    let histogram = price_distribution(products, PRICE_BINS);
    assert_eq!(histogram.bins.len(), PRICE_BINS);
    assert_eq!(histogram.bins[0].from, Decimal::new(300, 0));
    assert_eq!(histogram.bins[0].listings, 1);
    assert_eq!(histogram.bins[PRICE_BINS - 1].to, Decimal::new(1600, 0));
    assert_eq!(histogram.bins[PRICE_BINS - 1].listings, 1);
}
