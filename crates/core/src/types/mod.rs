//! Core types for Meli Pulse.
//!
//! This module provides type-safe wrappers for the marketplace's domain
//! concepts and the aggregates derived from them.

pub mod id;
pub mod lenient;
pub mod order;
pub mod price;
pub mod product;
pub mod question;
pub mod sale;
pub mod snapshot;
pub mod status;
pub mod window;

pub use id::*;
pub use order::{Buyer, ItemRef, LineItem, Order, Pack, PackMember, Payment, Shipping};
pub use price::{CurrencyCode, Price};
pub use product::{
    Attribute, ItemPrice, ItemPrices, PART_NUMBER_ATTRIBUTE, Product, SELLER_SKU_ATTRIBUTE,
    Variation,
};
pub use question::{Answer, InboxQuestion, Question};
pub use sale::{AccountingRule, SaleLine, SaleRecord, SalesCountBasis};
pub use snapshot::{
    MetricSnapshot, PriceBin, PriceDistribution, ProductSummary, QuestionSnapshot, StockBand,
    StockDistribution, TrendPoint,
};
pub use status::*;
pub use window::DateWindow;
