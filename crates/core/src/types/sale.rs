//! Pack-resolved sale records and the revenue accounting rules applied to them.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{ItemId, OrderId, PackId};
use super::status::ParseEnumError;

/// One purchase as the buyer made it: a single order, or every order of a pack
/// merged with line items deduplicated by item id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    /// Pack ID when the sale came from a pack, else the order ID.
    pub id: String,
    /// Pack ID, if the sale came from a pack.
    pub pack_id: Option<PackId>,
    /// Member orders that contributed to this sale.
    pub order_ids: Vec<OrderId>,
    /// Creation time of the order that triggered the resolution.
    pub date_created: Option<DateTime<FixedOffset>>,
    /// Deduplicated line items.
    pub lines: Vec<SaleLine>,
    /// Sum of each member order's first payment; `None` when none had a payment.
    pub payment_amount: Option<Decimal>,
    /// Sum of member `total_amount` fields; `None` when none reported one.
    pub order_total: Option<Decimal>,
}

impl SaleRecord {
    /// Total units across the deduplicated lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// `Σ unit_price × quantity` over the deduplicated lines.
    ///
    /// `None` when the arithmetic overflows.
    #[must_use]
    pub fn computed_revenue(&self) -> Option<Decimal> {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, line| acc.checked_add(line.line_total()?))
    }

    /// Revenue of this sale under the given rule. Missing inputs count as zero.
    ///
    /// `None` when the arithmetic overflows.
    #[must_use]
    pub fn revenue(&self, rule: AccountingRule) -> Option<Decimal> {
        match rule {
            AccountingRule::Computed => self.computed_revenue(),
            AccountingRule::Payment => Some(self.payment_amount.unwrap_or_default()),
            AccountingRule::OrderTotal => Some(self.order_total.unwrap_or_default()),
        }
    }
}

/// A deduplicated line within a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    /// Listing ID.
    pub item_id: ItemId,
    /// Listing title.
    pub title: Option<String>,
    /// Resolved SKU; empty until SKU resolution has run.
    pub sku: Option<String>,
    /// Seller SKU inlined on the order line, if any.
    pub seller_sku: Option<String>,
    /// Units purchased.
    pub quantity: u32,
    /// Price per unit.
    pub unit_price: Decimal,
}

impl SaleLine {
    /// `unit_price × quantity`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// How revenue is computed from a set of sales.
///
/// The rules disagree whenever discounts or shipping costs are involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountingRule {
    /// `Σ unit_price × quantity` over resolved line items.
    Computed,
    /// `Σ payments[0].transaction_amount` per order.
    #[default]
    Payment,
    /// `Σ order.total_amount` where present.
    OrderTotal,
}

impl AccountingRule {
    /// All rules, in display order.
    pub const ALL: [Self; 3] = [Self::Computed, Self::Payment, Self::OrderTotal];

    /// Canonical name used in config and query strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Computed => "computed",
            Self::Payment => "payment",
            Self::OrderTotal => "order_total",
        }
    }
}

impl std::fmt::Display for AccountingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountingRule {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "computed" => Ok(Self::Computed),
            "payment" => Ok(Self::Payment),
            "order_total" => Ok(Self::OrderTotal),
            _ => Err(ParseEnumError::new("accounting rule", s)),
        }
    }
}

/// What `total_sales` counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SalesCountBasis {
    /// One per sale record (a pack counts once).
    #[default]
    Packs,
    /// One per contributing order.
    Orders,
}

impl std::fmt::Display for SalesCountBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Packs => write!(f, "packs"),
            Self::Orders => write!(f, "orders"),
        }
    }
}

impl std::str::FromStr for SalesCountBasis {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "packs" => Ok(Self::Packs),
            "orders" => Ok(Self::Orders),
            _ => Err(ParseEnumError::new("sales count basis", s)),
        }
    }
}
