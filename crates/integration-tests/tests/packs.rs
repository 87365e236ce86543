//! Pack merging through the metrics engine.

use meli_pulse_core::{AccountingRule, DateWindow};
use meli_pulse_integration_tests::{FakeMarketplace, at, engine, line, order};
use rust_decimal::Decimal;

fn window() -> DateWindow {
    DateWindow::last_days(30, at("2024-03-15T12:00:00-03:00"))
}

const CREATED: &str = "2024-03-05T16:20:00.000-03:00";

/// Two orders of pack 5001 that both carry MLA1, plus an order outside any pack.
fn split_checkout() -> FakeMarketplace {
    FakeMarketplace::new()
        .with_orders([
            order(
                "2001",
                CREATED,
                Some("5001"),
                vec![line("MLA1", 2, 1500), line("MLA2", 1, 800)],
                Some(3800),
            ),
            order(
                "2002",
                CREATED,
                Some("5001"),
                vec![line("MLA1", 2, 1500), line("MLA3", 3, 100)],
                Some(300),
            ),
            order("2003", CREATED, None, vec![line("MLA9", 1, 2000)], Some(2000)),
        ])
        .with_pack("5001", &["2001", "2002"])
}

#[tokio::test]
async fn test_shared_item_across_pack_counts_once() {
    let engine = engine(split_checkout(), 50);

    let snapshot = engine
        .get_sales_metrics(window(), AccountingRule::Payment)
        .await;

    // MLA1 x2 once, MLA2 x1, MLA3 x3, MLA9 x1
    assert_eq!(snapshot.total_items, 7);
    assert_eq!(snapshot.total_sales, 2);
    assert_eq!(snapshot.total_revenue, Decimal::new(6100, 0));
}

#[tokio::test]
async fn test_pack_appears_once_in_sales() {
    let engine = engine(split_checkout(), 50);

    let report = engine.get_sales(window()).await;
    let sales = &report.value;

    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0].id, "5001");
    assert_eq!(sales[0].order_ids.len(), 2);
    assert_eq!(sales[0].lines.len(), 3);
    assert_eq!(sales[1].id, "2003");
    assert_eq!(report.diagnostics.duplicate_items, 1);
    assert_eq!(report.diagnostics.skipped_orders, 1);
}

#[tokio::test]
async fn test_computed_rule_uses_deduplicated_lines() {
    let engine = engine(split_checkout(), 50);

    let snapshot = engine
        .get_sales_metrics(window(), AccountingRule::Computed)
        .await;

    // 2*1500 + 800 + 3*100 + 2000
    assert_eq!(snapshot.total_revenue, Decimal::new(6100, 0));
    assert_eq!(snapshot.avg_price, Decimal::new(6100, 0) / Decimal::from(7));
}

#[tokio::test]
async fn test_failed_pack_fetch_counts_each_order_alone() {
    let engine = engine(split_checkout().failing_pack("5001"), 50);

    let report = engine
        .sales_metrics_report(window(), AccountingRule::Payment)
        .await;

    // Both members are counted alone with their own lines
    assert_eq!(report.value.total_sales, 3);
    assert_eq!(report.value.total_items, 2 + 1 + 2 + 3 + 1);
    assert_eq!(report.diagnostics.failed_pack_fetches, 2);
}

#[tokio::test]
async fn test_failed_sibling_fetch_keeps_trigger_lines() {
    let api = FakeMarketplace::new()
        .with_orders([order(
            "2001",
            CREATED,
            Some("5001"),
            vec![line("MLA1", 2, 1500)],
            Some(3000),
        )])
        .with_pack("5001", &["2001", "2002"])
        .failing_order("2002");
    let engine = engine(api, 50);

    let report = engine
        .sales_metrics_report(window(), AccountingRule::Payment)
        .await;

    assert_eq!(report.value.total_sales, 1);
    assert_eq!(report.value.total_items, 2);
    assert_eq!(report.value.total_revenue, Decimal::new(3000, 0));
    assert_eq!(report.diagnostics.failed_order_fetches, 1);
}

#[tokio::test]
async fn test_sibling_outside_window_is_fetched() {
    let api = FakeMarketplace::new()
        .with_orders([
            order("2001", CREATED, Some("5001"), vec![line("MLA1", 1, 100)], Some(100)),
            order(
                "2002",
                "2024-01-02T10:00:00.000-03:00",
                Some("5001"),
                vec![line("MLA2", 4, 50)],
                Some(200),
            ),
        ])
        .with_pack("5001", &["2001", "2002"]);
    let engine = engine(api, 50);

    let snapshot = engine
        .get_sales_metrics(window(), AccountingRule::Payment)
        .await;

    assert_eq!(snapshot.total_sales, 1);
    assert_eq!(snapshot.total_items, 5);
    assert_eq!(snapshot.total_revenue, Decimal::new(300, 0));
    assert_eq!(
        engine.api().calls().orders,
        vec![meli_pulse_core::OrderId::new("2002")]
    );
}
