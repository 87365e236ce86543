//! Sales aggregation, snapshots and trends.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Timelike;
use meli_pulse_core::{
    AccountingRule, DateWindow, MetricSnapshot, Order, OrderId, SaleRecord, SalesCountBasis,
    TrendPoint,
};
use rust_decimal::Decimal;

use super::fetcher::fetch_all;
use super::items::ItemCache;
use super::pack::PackResolver;
use super::sku::resolve_sku;
use super::{Diagnostics, MetricsEngine, Report};
use crate::mercadolibre::{MarketplaceApi, OrderQuery};

impl<A: MarketplaceApi> MetricsEngine<A> {
    /// Orders created in the window, as listed by the marketplace.
    pub async fn get_orders(&self, window: DateWindow) -> Report<Vec<Order>> {
        self.within_deadline("get_orders", Vec::new(), self.list_window_orders(window))
            .await
    }

    /// Pack-resolved sales in the window, with a SKU on every line.
    pub async fn get_sales(&self, window: DateWindow) -> Report<Vec<SaleRecord>> {
        self.within_deadline("get_sales", Vec::new(), async {
            let mut report = self.collect_sales(window).await;
            let failed_items = self.attach_skus(&mut report.value).await;
            report.diagnostics.failed_item_fetches += failed_items;
            report
        })
        .await
    }

    /// Sales snapshot for the window under `rule`.
    pub async fn get_sales_metrics(&self, window: DateWindow, rule: AccountingRule) -> MetricSnapshot {
        self.sales_metrics_report(window, rule).await.value
    }

    /// Sales snapshot with diagnostics.
    pub async fn sales_metrics_report(
        &self,
        window: DateWindow,
        rule: AccountingRule,
    ) -> Report<MetricSnapshot> {
        let basis = self.options.sales_count_basis;
        self.within_deadline("sales_metrics", MetricSnapshot::zero(), async {
            self.collect_sales(window)
                .await
                .and_then(|sales| summarize_sales(&sales, rule, basis))
        })
        .await
    }

    /// Sales trend for the window under `rule`.
    pub async fn get_sales_trend(&self, window: DateWindow, rule: AccountingRule) -> Vec<TrendPoint> {
        self.sales_trend_report(window, rule).await.value
    }

    /// Sales trend with diagnostics.
    ///
    /// On timeout the empty buckets of the window are returned.
    pub async fn sales_trend_report(
        &self,
        window: DateWindow,
        rule: AccountingRule,
    ) -> Report<Vec<TrendPoint>> {
        self.within_deadline("sales_trend", bucket_trend(&[], window, rule).value, async {
            self.collect_sales(window)
                .await
                .and_then(|sales| bucket_trend(&sales, window, rule))
        })
        .await
    }

    async fn list_window_orders(&self, window: DateWindow) -> Report<Vec<Order>> {
        let query = OrderQuery {
            seller_id: &self.options.seller_id,
            status: self.options.order_status,
            date_from: window.from,
            date_to: window.to,
        };
        let api = &self.api;
        let query = &query;

        let fetched = fetch_all(self.options.page_size, move |offset, limit| {
            api.list_orders(query, offset, limit)
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

    /// List the window's orders and resolve packs, in listing order.
    async fn collect_sales(&self, window: DateWindow) -> Report<Vec<SaleRecord>> {
        let Report {
            value: orders,
            mut diagnostics,
        } = self.list_window_orders(window).await;

        let in_hand: HashMap<&OrderId, &Order> = orders.iter().map(|o| (&o.id, o)).collect();
        let mut resolver = PackResolver::new(&self.api);
        let mut sales = Vec::with_capacity(orders.len());

        for order in &orders {
            if let Some(record) = resolver.resolve(order, &in_hand).await {
                sales.push(record);
            }
        }

        diagnostics.merge(&resolver.into_diagnostics());
        tracing::debug!(
            orders = orders.len(),
            sales = sales.len(),
            "Resolved sales for window"
        );

        Report::new(sales, diagnostics)
    }

    /// Resolve a SKU for every line, fetching each listing at most once.
    ///
    /// Returns the number of listings whose product record failed to load.
    async fn attach_skus(&self, sales: &mut [SaleRecord]) -> u32 {
        let mut items = ItemCache::new(&self.api);

        for line in sales.iter_mut().flat_map(|s| s.lines.iter_mut()) {
            let product = items.get(&line.item_id).await;
            line.sku = Some(resolve_sku(line, product));
        }

        items.failed()
    }
}

/// Compute a sales snapshot.
///
/// `total_items` sums the quantities of the (deduplicated) lines and
/// `total_revenue` applies `rule` to each sale. A sale whose revenue
/// overflows contributes zero and is counted in `overflowed_amounts`.
#[must_use]
pub fn summarize_sales(
    sales: &[SaleRecord],
    rule: AccountingRule,
    basis: SalesCountBasis,
) -> Report<MetricSnapshot> {
    let total_sales = match basis {
        SalesCountBasis::Packs => sales.len() as u64,
        SalesCountBasis::Orders => sales
            .iter()
            .flat_map(|s| &s.order_ids)
            .collect::<HashSet<_>>()
            .len() as u64,
    };
    let total_items = sales.iter().map(SaleRecord::item_count).sum();

    let mut diagnostics = Diagnostics::default();
    let mut total_revenue = Decimal::ZERO;
    for sale in sales {
        add_revenue(&mut total_revenue, sale, rule, &mut diagnostics);
    }

    Report::new(
        MetricSnapshot::new(total_sales, total_items, total_revenue),
        diagnostics,
    )
}

/// Bucket sales into a trend series.
///
/// A single-day window yields 24 hourly buckets labelled `"HH:00"`; any
/// other window yields one `YYYY-MM-DD` bucket per calendar date. Both use
/// each sale's own local timestamp, and empty buckets are included. Sales
/// without a creation time are left out.
#[must_use]
pub fn bucket_trend(
    sales: &[SaleRecord],
    window: DateWindow,
    rule: AccountingRule,
) -> Report<Vec<TrendPoint>> {
    let labels: Vec<String> = if window.is_single_day() {
        (0..24).map(hour_label).collect()
    } else {
        window.dates().iter().map(ToString::to_string).collect()
    };
    let mut buckets: BTreeMap<String, TrendPoint> = labels
        .into_iter()
        .map(|label| (label.clone(), TrendPoint::empty(label)))
        .collect();
    let mut diagnostics = Diagnostics::default();

    for sale in sales {
        let Some(created) = sale.date_created else {
            continue;
        };
        let label = if window.is_single_day() {
            hour_label(created.hour())
        } else {
            created.date_naive().to_string()
        };

        let bucket = buckets
            .entry(label)
            .or_insert_with_key(|label| TrendPoint::empty(label.clone()));
        bucket.items += sale.item_count();
        add_revenue(&mut bucket.revenue, sale, rule, &mut diagnostics);
    }

    Report::new(buckets.into_values().collect(), diagnostics)
}

/// Add a sale's revenue to `total`, leaving it unchanged on overflow.
fn add_revenue(
    total: &mut Decimal,
    sale: &SaleRecord,
    rule: AccountingRule,
    diagnostics: &mut Diagnostics,
) {
    if let Some(sum) = sale.revenue(rule).and_then(|r| total.checked_add(r)) {
        *total = sum;
    } else {
        tracing::warn!(sale_id = %sale.id, %rule, "Revenue overflowed, sale contributes zero");
        diagnostics.overflowed_amounts += 1;
    }
}

fn hour_label(hour: u32) -> String {
    format!("{hour:02}:00")
}
