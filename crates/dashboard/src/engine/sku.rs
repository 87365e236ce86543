//! SKU resolution.
//!
//! Sellers record their own stock-keeping code in different places depending
//! on how a listing was created. The resolver walks an ordered list of rules
//! and takes the first non-blank value, falling back to a code derived from
//! the listing ID so every line gets a SKU.

use meli_pulse_core::{ItemId, PART_NUMBER_ATTRIBUTE, Product, SELLER_SKU_ATTRIBUTE, SaleLine};
use serde::Serialize;

/// Which rule produced a SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkuSource {
    /// `seller_sku` inlined on the order line.
    LineSellerSku,
    /// The listing's `seller_custom_field`.
    SellerCustomField,
    /// The listing's `SELLER_SKU` attribute.
    SellerSkuAttribute,
    /// A `SELLER_SKU` attribute on any of the listing's variations.
    VariationSellerSku,
    /// The listing's `PART_NUMBER` attribute.
    PartNumber,
    /// Derived from the listing ID.
    Fallback,
}

impl SkuSource {
    /// Rule name for logs and API output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LineSellerSku => "line_seller_sku",
            Self::SellerCustomField => "seller_custom_field",
            Self::SellerSkuAttribute => "seller_sku_attribute",
            Self::VariationSellerSku => "variation_seller_sku",
            Self::PartNumber => "part_number",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for SkuSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule can look at.
struct SkuInput<'a> {
    line_sku: Option<&'a str>,
    product: Option<&'a Product>,
}

type Rule = fn(&SkuInput<'_>) -> Option<String>;

/// Rules in priority order. The fallback is applied after these.
const RULES: &[(SkuSource, Rule)] = &[
    (SkuSource::LineSellerSku, |input| non_blank(input.line_sku)),
    (SkuSource::SellerCustomField, |input| {
        non_blank(input.product.and_then(|p| p.seller_custom_field.as_deref()))
    }),
    (SkuSource::SellerSkuAttribute, |input| {
        non_blank(input.product.and_then(|p| p.attribute_value(SELLER_SKU_ATTRIBUTE)))
    }),
    (SkuSource::VariationSellerSku, |input| {
        non_blank(
            input
                .product
                .and_then(|p| p.variation_attribute_value(SELLER_SKU_ATTRIBUTE)),
        )
    }),
    (SkuSource::PartNumber, |input| {
        non_blank(input.product.and_then(|p| p.attribute_value(PART_NUMBER_ATTRIBUTE)))
    }),
];

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// `"ML"` + the listing ID, with a leading `"MLA"` removed.
#[must_use]
pub fn fallback_sku(item_id: &ItemId) -> String {
    let id = item_id.as_str();
    format!("ML{}", id.strip_prefix("MLA").unwrap_or(id))
}

fn resolve(input: &SkuInput<'_>, item_id: &ItemId) -> (String, SkuSource) {
    RULES
        .iter()
        .find_map(|(source, rule)| rule(input).map(|sku| (sku, *source)))
        .unwrap_or_else(|| (fallback_sku(item_id), SkuSource::Fallback))
}

/// Resolve a line's SKU and report which rule matched.
///
/// `product` is `None` when the listing could not be fetched; then only the
/// line's own SKU and the fallback apply.
#[must_use]
pub fn resolve_with_source(line: &SaleLine, product: Option<&Product>) -> (String, SkuSource) {
    let input = SkuInput {
        line_sku: line.seller_sku.as_deref(),
        product,
    };
    resolve(&input, &line.item_id)
}

/// Resolve a line's SKU.
#[must_use]
pub fn resolve_sku(line: &SaleLine, product: Option<&Product>) -> String {
    resolve_with_source(line, product).0
}

/// Resolve the SKU of a listing outside any order.
#[must_use]
pub fn resolve_product_sku(product: &Product) -> String {
    let input = SkuInput {
        line_sku: None,
        product: Some(product),
    };
    resolve(&input, &product.id).0
}
