//! Integration tests for Meli Pulse.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p meli-pulse-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `pagination` - exhaustive fetching through the engine
//! - `packs` - pack merging, deduplication and failure handling
//! - `metrics` - snapshots, accounting rules, trends and SKUs
//! - `questions` - question engagement metrics
//!
//! The tests drive the public engine API against [`FakeMarketplace`], an
//! in-memory implementation of the marketplace API.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset};
use meli_pulse_core::{
    ItemId, ItemPrices, Order, OrderId, Pack, PackId, PackMember, Product, Question,
    QuestionFilter,
};
use meli_pulse_dashboard::engine::{EngineOptions, MetricsEngine};
use meli_pulse_dashboard::mercadolibre::{MarketplaceApi, MarketplaceError, OrderQuery, Page};
use serde_json::{Value, json};

/// Seller used by every fixture.
pub const SELLER_ID: &str = "98765";

/// In-memory marketplace.
///
/// Serves fixed records through the same offset/limit contract as the real
/// API. Individual records can be marked as failing.
#[derive(Default)]
pub struct FakeMarketplace {
    orders: Vec<Order>,
    packs: HashMap<PackId, Pack>,
    items: HashMap<ItemId, Product>,
    prices: HashMap<ItemId, ItemPrices>,
    questions: Vec<Question>,
    report_total: bool,
    failing_orders: HashSet<OrderId>,
    failing_packs: HashSet<PackId>,
    failing_order_offsets: HashSet<u64>,
    calls: Mutex<Calls>,
}

/// Requests the fake has served.
#[derive(Debug, Default, Clone)]
pub struct Calls {
    /// `list_orders` offsets, in call order.
    pub order_pages: Vec<u64>,
    /// `get_order` IDs, in call order.
    pub orders: Vec<OrderId>,
    /// `get_item` IDs, in call order.
    pub items: Vec<ItemId>,
}

impl FakeMarketplace {
    /// An empty marketplace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add orders, in listing order.
    #[must_use]
    pub fn with_orders(mut self, orders: impl IntoIterator<Item = Order>) -> Self {
        self.orders.extend(orders);
        self
    }

    /// Add a pack with the given member orders.
    #[must_use]
    pub fn with_pack(mut self, pack_id: &str, members: &[&str]) -> Self {
        let id = PackId::new(pack_id);
        self.packs.insert(
            id.clone(),
            Pack {
                id,
                orders: members
                    .iter()
                    .map(|m| PackMember {
                        id: OrderId::new(*m),
                    })
                    .collect(),
            },
        );
        self
    }

    /// Add a listing.
    #[must_use]
    pub fn with_item(mut self, product: Product) -> Self {
        self.items.insert(product.id.clone(), product);
        self
    }

    /// Add price records for a listing.
    #[must_use]
    pub fn with_prices(mut self, item_id: &str, prices: ItemPrices) -> Self {
        self.prices.insert(ItemId::new(item_id), prices);
        self
    }

    /// Add questions, newest first.
    #[must_use]
    pub fn with_questions(mut self, questions: impl IntoIterator<Item = Question>) -> Self {
        self.questions.extend(questions);
        self
    }

    /// Report `paging.total` on listings.
    #[must_use]
    pub const fn reporting_totals(mut self) -> Self {
        self.report_total = true;
        self
    }

    /// Make `get_order` fail for an order.
    #[must_use]
    pub fn failing_order(mut self, order_id: &str) -> Self {
        self.failing_orders.insert(OrderId::new(order_id));
        self
    }

    /// Make `get_pack` fail for a pack.
    #[must_use]
    pub fn failing_pack(mut self, pack_id: &str) -> Self {
        self.failing_packs.insert(PackId::new(pack_id));
        self
    }

    /// Make the order listing fail at an offset.
    #[must_use]
    pub fn failing_order_page(mut self, offset: u64) -> Self {
        self.failing_order_offsets.insert(offset);
        self
    }

    /// Requests served so far.
    #[must_use]
    pub fn calls(&self) -> Calls {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, f: impl FnOnce(&mut Calls)) {
        if let Ok(mut calls) = self.calls.lock() {
            f(&mut calls);
        }
    }

    fn page<T: Clone>(&self, all: &[T], offset: u64, limit: u32) -> Page<T> {
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(all.len());
        let end = start.saturating_add(limit as usize).min(all.len());
        let items = all.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
        if self.report_total {
            Page::with_total(items, all.len() as u64)
        } else {
            Page::new(items)
        }
    }
}

fn not_found(what: &str) -> MarketplaceError {
    MarketplaceError::NotFound(what.to_string())
}

impl MarketplaceApi for FakeMarketplace {
    async fn list_orders(
        &self,
        query: &OrderQuery<'_>,
        offset: u64,
        limit: u32,
    ) -> Result<Page<Order>, MarketplaceError> {
        self.record(|c| c.order_pages.push(offset));
        if self.failing_order_offsets.contains(&offset) {
            return Err(MarketplaceError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        let in_window: Vec<Order> = self
            .orders
            .iter()
            .filter(|o| {
                o.date_created
                    .is_none_or(|d| d >= query.date_from && d < query.date_to)
            })
            .cloned()
            .collect();
        Ok(self.page(&in_window, offset, limit))
    }

    async fn get_order(&self, order_id: &OrderId) -> Result<Order, MarketplaceError> {
        self.record(|c| c.orders.push(order_id.clone()));
        if self.failing_orders.contains(order_id) {
            return Err(MarketplaceError::Api {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        self.orders
            .iter()
            .find(|o| &o.id == order_id)
            .cloned()
            .ok_or_else(|| not_found(order_id.as_str()))
    }

    async fn get_pack(&self, pack_id: &PackId) -> Result<Pack, MarketplaceError> {
        if self.failing_packs.contains(pack_id) {
            return Err(MarketplaceError::RateLimited(60));
        }
        self.packs
            .get(pack_id)
            .cloned()
            .ok_or_else(|| not_found(pack_id.as_str()))
    }

    async fn get_item(&self, item_id: &ItemId) -> Result<Product, MarketplaceError> {
        self.record(|c| c.items.push(item_id.clone()));
        self.items
            .get(item_id)
            .cloned()
            .ok_or_else(|| not_found(item_id.as_str()))
    }

    async fn list_questions(
        &self,
        _seller_id: &str,
        filter: Option<QuestionFilter>,
        offset: u64,
        limit: u32,
    ) -> Result<Page<Question>, MarketplaceError> {
        let matching: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| match filter {
                Some(QuestionFilter::Answered) => q.is_answered(),
                Some(QuestionFilter::Unanswered) => !q.is_answered(),
                None => true,
            })
            .cloned()
            .collect();
        Ok(self.page(&matching, offset, limit))
    }

    async fn get_item_prices(&self, item_id: &ItemId) -> Result<ItemPrices, MarketplaceError> {
        self.prices
            .get(item_id)
            .cloned()
            .ok_or_else(|| not_found(item_id.as_str()))
    }

    async fn list_item_ids(
        &self,
        _seller_id: &str,
        offset: u64,
        limit: u32,
    ) -> Result<Page<ItemId>, MarketplaceError> {
        let mut ids: Vec<ItemId> = self.items.keys().cloned().collect();
        ids.sort();
        Ok(self.page(&ids, offset, limit))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// The seller's offset (Argentina, UTC-3).
///
/// # Panics
///
/// Never: the offset is in range.
#[must_use]
pub fn seller_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("UTC-3 is a valid offset")
}

/// Parse an RFC 3339 timestamp.
///
/// # Panics
///
/// Panics if `s` is not a valid timestamp.
#[must_use]
pub fn at(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).expect("valid RFC 3339 timestamp")
}

/// Engine over the fake with default options and the given page size.
#[must_use]
pub fn engine(api: FakeMarketplace, page_size: u32) -> MetricsEngine<FakeMarketplace> {
    let mut options = EngineOptions::new(SELLER_ID, seller_offset());
    options.page_size = page_size;
    MetricsEngine::new(api, options)
}

/// A line item as the marketplace reports it.
#[must_use]
pub fn line(item_id: &str, quantity: u32, unit_price: i64) -> Value {
    json!({
        "item": {"id": item_id, "title": format!("Publicación {item_id}"), "variation_id": null},
        "quantity": quantity,
        "unit_price": unit_price,
        "currency_id": "ARS"
    })
}

/// An order as the marketplace reports it.
///
/// # Panics
///
/// Panics if the fixture does not deserialize.
#[must_use]
pub fn order(
    id: &str,
    created: &str,
    pack_id: Option<&str>,
    lines: Vec<Value>,
    paid: Option<i64>,
) -> Order {
    let payments: Vec<Value> = paid
        .map(|amount| json!({"id": format!("P{id}"), "transaction_amount": amount, "status": "approved"}))
        .into_iter()
        .collect();
    let total: i64 = paid.unwrap_or_default();

    serde_json::from_value(json!({
        "id": id.parse::<u64>().map_or_else(|_| Value::from(id), Value::from),
        "date_created": created,
        "status": "paid",
        "buyer": {"id": 4444, "nickname": "COMPRADOR_TEST"},
        "pack_id": pack_id.map(|p| p.parse::<u64>().map_or_else(|_| Value::from(p), Value::from)),
        "order_items": lines,
        "payments": payments,
        "total_amount": total,
        "currency_id": "ARS"
    }))
    .expect("valid order fixture")
}

/// A listing as the marketplace reports it.
///
/// # Panics
///
/// Panics if `json` is not a valid listing.
#[must_use]
pub fn product(json: Value) -> Product {
    serde_json::from_value(json).expect("valid product fixture")
}

/// A question, answered `answered_after_minutes` after it was asked.
///
/// # Panics
///
/// Panics if the fixture does not deserialize.
#[must_use]
pub fn question(id: u64, asked: &str, answered_after_minutes: Option<i64>) -> Question {
    let asked_at = at(asked);
    let answer = answered_after_minutes.map_or(Value::Null, |minutes| {
        json!({
            "text": "Hola, sí. Saludos!",
            "status": "ACTIVE",
            "date_created": (asked_at + chrono::TimeDelta::minutes(minutes)).to_rfc3339()
        })
    });

    serde_json::from_value(json!({
        "id": id,
        "text": "Hola, ¿tenés stock?",
        "date_created": asked,
        "item_id": "MLA100",
        "status": if answered_after_minutes.is_some() { "ANSWERED" } else { "UNANSWERED" },
        "answer": answer
    }))
    .expect("valid question fixture")
}
