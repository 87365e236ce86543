//! Listings (products), their attributes and variations, and price records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ItemId;
use super::lenient;
use super::price::CurrencyCode;
use super::status::ListingStatus;

/// Attribute id carrying the seller's SKU.
pub const SELLER_SKU_ATTRIBUTE: &str = "SELLER_SKU";

/// Attribute id carrying the manufacturer part number.
pub const PART_NUMBER_ATTRIBUTE: &str = "PART_NUMBER";

/// A listing on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Listing ID (e.g., `MLA123456`).
    pub id: ItemId,
    /// Listing title.
    #[serde(default, deserialize_with = "lenient::value")]
    pub title: String,
    /// Listing price.
    #[serde(default, deserialize_with = "lenient::value")]
    pub price: Decimal,
    /// Currency of the listing price.
    #[serde(default, deserialize_with = "lenient::value")]
    pub currency_id: CurrencyCode,
    /// Units available for sale.
    #[serde(default, deserialize_with = "lenient::value")]
    pub available_quantity: u32,
    /// Listing status.
    #[serde(default, deserialize_with = "lenient::value")]
    pub status: ListingStatus,
    /// Seller-defined free-form code.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub seller_custom_field: Option<String>,
    /// Listing attributes.
    #[serde(default, deserialize_with = "lenient::list")]
    pub attributes: Vec<Attribute>,
    /// Variations, each with its own attributes.
    #[serde(default, deserialize_with = "lenient::list")]
    pub variations: Vec<Variation>,
    /// Public listing URL.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub permalink: Option<String>,
}

impl Product {
    /// First non-blank value of the attribute with the given id.
    #[must_use]
    pub fn attribute_value(&self, attribute_id: &str) -> Option<&str> {
        find_attribute(&self.attributes, attribute_id)
    }

    /// First non-blank value of the attribute across all variations.
    #[must_use]
    pub fn variation_attribute_value(&self, attribute_id: &str) -> Option<&str> {
        self.variations
            .iter()
            .find_map(|v| find_attribute(&v.attributes, attribute_id))
    }
}

fn find_attribute<'a>(attributes: &'a [Attribute], attribute_id: &str) -> Option<&'a str> {
    attributes
        .iter()
        .filter(|a| a.id == attribute_id)
        .find_map(Attribute::value)
}

/// A key/value attribute on a listing or variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute id (e.g., `SELLER_SKU`).
    #[serde(deserialize_with = "lenient::id_string")]
    pub id: String,
    /// Human-readable attribute name.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    /// Attribute value.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub value_name: Option<String>,
}

impl Attribute {
    /// The attribute value, if non-blank.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value_name.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// A variation of a listing (e.g., a color or size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// Variation ID.
    #[serde(deserialize_with = "lenient::id_string")]
    pub id: String,
    /// Variation price.
    #[serde(default, deserialize_with = "lenient::value")]
    pub price: Option<Decimal>,
    /// Units available for this variation.
    #[serde(default, deserialize_with = "lenient::value")]
    pub available_quantity: u32,
    /// Seller-defined free-form code for the variation.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub seller_custom_field: Option<String>,
    /// Variation attributes.
    #[serde(default, deserialize_with = "lenient::list")]
    pub attributes: Vec<Attribute>,
}

/// Price records for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPrices {
    /// All known prices (standard, promotion, ...).
    #[serde(default, deserialize_with = "lenient::list")]
    pub prices: Vec<ItemPrice>,
}

impl ItemPrices {
    /// The currently active promotional price, if any.
    #[must_use]
    pub fn promotional(&self) -> Option<Decimal> {
        self.by_type("promotion")
    }

    /// The standard (non-promotional) price, if listed.
    #[must_use]
    pub fn standard(&self) -> Option<Decimal> {
        self.by_type("standard")
    }

    fn by_type(&self, price_type: &str) -> Option<Decimal> {
        self.prices
            .iter()
            .find(|p| p.price_type.as_deref() == Some(price_type) && p.amount > Decimal::ZERO)
            .map(|p| p.amount)
    }
}

/// A single price record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPrice {
    /// Price type (`standard`, `promotion`).
    #[serde(rename = "type", default, deserialize_with = "lenient::opt_string")]
    pub price_type: Option<String>,
    /// Price amount.
    #[serde(default, deserialize_with = "lenient::value")]
    pub amount: Decimal,
    /// Strike-through amount shown next to a promotion.
    #[serde(default, deserialize_with = "lenient::value")]
    pub regular_amount: Option<Decimal>,
}
