//! Order aggregation and metrics computation.
//!
//! # Architecture
//!
//! - [`fetcher`] drains a paginated endpoint into one result set
//! - [`pack`] merges multi-order packs into deduplicated sale records
//! - [`sku`] resolves a SKU per line item through an ordered rule chain
//! - [`metrics`], [`questions`] and [`products`] turn the result sets into
//!   snapshots and trends
//!
//! # Failure semantics
//!
//! Engine operations never fail. A failed sub-fetch degrades to an empty
//! input for that part of the computation and is counted in [`Diagnostics`],
//! which travels with every result inside a [`Report`]. When a computation
//! exceeds its deadline the zero value is returned with
//! [`Diagnostics::timed_out`] set.

pub mod fetcher;
pub mod items;
pub mod metrics;
pub mod pack;
pub mod products;
pub mod questions;
pub mod sku;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use meli_pulse_core::{AccountingRule, DateWindow, OrderStatus, SalesCountBasis};
use serde::Serialize;

use crate::config::{DashboardConfig, EngineSettings};
use crate::mercadolibre::MarketplaceApi;

pub use fetcher::{Fetched, fetch_all};
pub use metrics::{bucket_trend, summarize_sales};
pub use pack::PackResolver;
pub use products::{PRICE_BINS, price_distribution, stock_distribution};
pub use questions::summarize_questions;
pub use sku::{SkuSource, resolve_product_sku, resolve_sku, resolve_with_source};

/// Settings for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Seller whose data is aggregated.
    pub seller_id: String,
    /// Page size for paginated endpoints.
    pub page_size: u32,
    /// Rule used when a caller does not pick one.
    pub accounting_rule: AccountingRule,
    /// What `total_sales` counts.
    pub sales_count_basis: SalesCountBasis,
    /// Order status filter for order listings.
    pub order_status: OrderStatus,
    /// Deadline for one computation.
    pub deadline: Duration,
    /// Seller's UTC offset, used to build query windows.
    pub utc_offset: FixedOffset,
}

impl EngineOptions {
    /// Options with default settings for a seller.
    #[must_use]
    pub fn new(seller_id: impl Into<String>, utc_offset: FixedOffset) -> Self {
        Self::with_settings(seller_id, utc_offset, &EngineSettings::default())
    }

    /// Options from loaded configuration.
    #[must_use]
    pub fn from_config(config: &DashboardConfig) -> Self {
        Self::with_settings(
            config.marketplace.seller_id.clone(),
            config.marketplace.utc_offset,
            &config.engine,
        )
    }

    fn with_settings(
        seller_id: impl Into<String>,
        utc_offset: FixedOffset,
        settings: &EngineSettings,
    ) -> Self {
        Self {
            seller_id: seller_id.into(),
            page_size: settings.page_size,
            accounting_rule: settings.accounting_rule,
            sales_count_basis: settings.sales_count_basis,
            order_status: settings.order_status,
            deadline: settings.deadline,
            utc_offset,
        }
    }

    /// The window covering the last `days` days up to now, in seller time.
    #[must_use]
    pub fn last_days(&self, days: u32) -> DateWindow {
        DateWindow::last_days(days, self.now())
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset)
    }
}

/// Degradation counters for one computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Pages that failed to load (pagination stopped there).
    pub failed_pages: u32,
    /// Pack lookups that failed; the order was counted alone.
    pub failed_pack_fetches: u32,
    /// Pack member orders that could not be fetched.
    pub failed_order_fetches: u32,
    /// Listings whose product record could not be fetched.
    pub failed_item_fetches: u32,
    /// Listings whose prices could not be fetched.
    pub failed_price_fetches: u32,
    /// Orders skipped because a pack already included them.
    pub skipped_orders: u32,
    /// Line items dropped by pack deduplication.
    pub duplicate_items: u32,
    /// Amounts left out because adding or multiplying them overflowed.
    pub overflowed_amounts: u32,
    /// The computation exceeded its deadline.
    pub timed_out: bool,
}

impl Diagnostics {
    /// True when a sub-fetch failed, an amount overflowed or the deadline was hit.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        self.failed_pages > 0
            || self.failed_pack_fetches > 0
            || self.failed_order_fetches > 0
            || self.failed_item_fetches > 0
            || self.failed_price_fetches > 0
            || self.overflowed_amounts > 0
            || self.timed_out
    }

    /// Add another set of counters into this one.
    pub const fn merge(&mut self, other: &Self) {
        self.failed_pages += other.failed_pages;
        self.failed_pack_fetches += other.failed_pack_fetches;
        self.failed_order_fetches += other.failed_order_fetches;
        self.failed_item_fetches += other.failed_item_fetches;
        self.failed_price_fetches += other.failed_price_fetches;
        self.skipped_orders += other.skipped_orders;
        self.duplicate_items += other.duplicate_items;
        self.overflowed_amounts += other.overflowed_amounts;
        self.timed_out |= other.timed_out;
    }
}

/// A computed value with the diagnostics gathered while computing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report<T> {
    /// The result. Always structurally valid, possibly partial.
    pub value: T,
    /// What degraded along the way.
    pub diagnostics: Diagnostics,
}

impl<T> Report<T> {
    /// Wrap a value.
    #[must_use]
    pub const fn new(value: T, diagnostics: Diagnostics) -> Self {
        Self { value, diagnostics }
    }

    /// Transform the value, keeping the diagnostics.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Report<U> {
        Report {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    /// Chain a computation that reports its own diagnostics, merging both.
    #[must_use]
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Report<U>) -> Report<U> {
        let mut next = f(self.value);
        let mut diagnostics = self.diagnostics;
        diagnostics.merge(&next.diagnostics);
        next.diagnostics = diagnostics;
        next
    }
}

/// Metrics engine over a marketplace API.
#[derive(Debug, Clone)]
pub struct MetricsEngine<A> {
    api: A,
    options: EngineOptions,
}

impl<A: MarketplaceApi> MetricsEngine<A> {
    /// Create an engine.
    #[must_use]
    pub const fn new(api: A, options: EngineOptions) -> Self {
        Self { api, options }
    }

    /// The underlying API.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The engine settings.
    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run a computation under the configured deadline.
    ///
    /// On timeout the `fallback` value is returned with `timed_out` set.
    async fn within_deadline<T, F>(&self, operation: &'static str, fallback: T, work: F) -> Report<T>
    where
        F: Future<Output = Report<T>>,
    {
        if let Ok(report) = tokio::time::timeout(self.options.deadline, work).await {
            if report.diagnostics.is_degraded() {
                tracing::warn!(
                    operation,
                    diagnostics = ?report.diagnostics,
                    "Computation completed with degraded inputs"
                );
            }
            report
        } else {
            tracing::warn!(
                operation,
                deadline_secs = self.options.deadline.as_secs(),
                "Computation exceeded its deadline"
            );
            Report::new(
                fallback,
                Diagnostics {
                    timed_out: true,
                    ..Diagnostics::default()
                },
            )
        }
    }
}
