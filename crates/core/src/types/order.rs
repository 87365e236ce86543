//! Orders, line items, payments and packs as fetched from the marketplace.
//!
//! Records are immutable snapshots of a remote transaction. Fields other
//! than the id are parsed leniently: see [`super::lenient`].

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ItemId, OrderId, PackId};
use super::lenient;
use super::status::OrderStatus;

/// A single marketplace order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// When the order was created (seller-local offset).
    #[serde(default, deserialize_with = "lenient::value")]
    pub date_created: Option<DateTime<FixedOffset>>,
    /// Current order status.
    #[serde(default, deserialize_with = "lenient::value")]
    pub status: OrderStatus,
    /// The buyer who placed the order.
    #[serde(default, deserialize_with = "lenient::value")]
    pub buyer: Option<Buyer>,
    /// Line items as reported on this order only.
    #[serde(default, deserialize_with = "lenient::list")]
    pub order_items: Vec<LineItem>,
    /// Pack (multi-order checkout) this order belongs to, if any.
    #[serde(default, deserialize_with = "lenient::value")]
    pub pack_id: Option<PackId>,
    /// Payments; only the first is authoritative.
    #[serde(default, deserialize_with = "lenient::list")]
    pub payments: Vec<Payment>,
    /// Shipment summary.
    #[serde(default, deserialize_with = "lenient::value")]
    pub shipping: Option<Shipping>,
    /// Coarse order-level total.
    #[serde(default, deserialize_with = "lenient::value")]
    pub total_amount: Option<Decimal>,
    /// Currency of the amounts (e.g., "ARS").
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub currency_id: Option<String>,
}

impl Order {
    /// The authoritative payment for this order.
    #[must_use]
    pub fn first_payment(&self) -> Option<&Payment> {
        self.payments.first()
    }
}

/// Buyer reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    /// Buyer user ID.
    #[serde(deserialize_with = "lenient::id_string")]
    pub id: String,
    /// Public nickname.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub nickname: Option<String>,
}

/// A line item on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// The listing this line refers to.
    pub item: ItemRef,
    /// Units purchased.
    #[serde(default, deserialize_with = "lenient::value")]
    pub quantity: u32,
    /// Price per unit.
    #[serde(default, deserialize_with = "lenient::value")]
    pub unit_price: Decimal,
}

/// Listing reference embedded in a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    /// Listing ID (e.g., `MLA123456`).
    pub id: ItemId,
    /// Listing title at the time of purchase.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
    /// SKU inlined by the marketplace, when the seller set one.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub seller_sku: Option<String>,
    /// Purchased variation, if the listing has variations.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub variation_id: Option<String>,
}

/// A payment attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    /// Amount charged to the buyer.
    #[serde(default, deserialize_with = "lenient::value")]
    pub transaction_amount: Decimal,
    /// Tax portion of the transaction.
    #[serde(default, deserialize_with = "lenient::value")]
    pub taxes_amount: Decimal,
    /// Fee retained by the marketplace.
    #[serde(default, deserialize_with = "lenient::value")]
    pub marketplace_fee: Decimal,
    /// Payment status (e.g., "approved").
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
}

/// Shipment summary on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipping {
    /// Shipment ID.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    /// Shipment status.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub status: Option<String>,
}

/// A pack: one buyer checkout split into several orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    /// Pack ID.
    pub id: PackId,
    /// Member orders.
    #[serde(default, deserialize_with = "lenient::list")]
    pub orders: Vec<PackMember>,
}

/// Reference to a member order of a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMember {
    /// Member order ID.
    pub id: OrderId,
}
