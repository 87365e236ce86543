//! Derived aggregates handed to presentation adapters.
//!
//! Snapshots are recomputed per query window and never persisted.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::id::ItemId;
use super::price::Price;
use super::status::ListingStatus;

/// Sales metrics for a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Number of sales (packs or orders, per the configured basis).
    pub total_sales: u64,
    /// Total revenue under the chosen accounting rule.
    pub total_revenue: Decimal,
    /// `total_revenue / total_items`, or zero when no items were sold.
    pub avg_price: Decimal,
    /// Units sold across all resolved line items.
    pub total_items: u64,
}

impl MetricSnapshot {
    /// The all-zero snapshot returned when nothing could be computed.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            total_sales: 0,
            total_revenue: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            total_items: 0,
        }
    }

    /// Build a snapshot, deriving the average price.
    #[must_use]
    pub fn new(total_sales: u64, total_items: u64, total_revenue: Decimal) -> Self {
        let avg_price = if total_items > 0 {
            total_revenue / Decimal::from(total_items)
        } else {
            Decimal::ZERO
        };

        Self {
            total_sales,
            total_revenue,
            avg_price,
            total_items,
        }
    }
}

/// Question engagement metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionSnapshot {
    /// All questions received.
    pub total_questions: u64,
    /// Questions with an answer.
    pub answered: u64,
    /// Questions without an answer.
    pub pending: u64,
    /// Mean answer delay in hours over answered questions.
    pub avg_response_time_hours: f64,
}

impl QuestionSnapshot {
    /// The all-zero snapshot returned when nothing could be computed.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            total_questions: 0,
            answered: 0,
            pending: 0,
            avg_response_time_hours: 0.0,
        }
    }
}

/// One bucket of a sales trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// `"HH:00"` for hourly buckets, `YYYY-MM-DD` for daily buckets.
    pub bucket_label: String,
    /// Units sold in the bucket.
    pub items: u64,
    /// Revenue in the bucket, under the same rule as the snapshot.
    pub revenue: Decimal,
}

impl TrendPoint {
    /// An empty bucket.
    #[must_use]
    pub fn empty(bucket_label: impl Into<String>) -> Self {
        Self {
            bucket_label: bucket_label.into(),
            items: 0,
            revenue: Decimal::ZERO,
        }
    }
}

/// A listing summarized for the products view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Listing ID.
    pub id: ItemId,
    /// Listing title.
    pub title: String,
    /// Resolved SKU.
    pub sku: String,
    /// Listing status.
    pub status: ListingStatus,
    /// Units available.
    pub available_quantity: u32,
    /// Listing price.
    pub price: Price,
    /// Active promotional price, if any.
    pub promotional_price: Option<Price>,
}

impl ProductSummary {
    /// The price a buyer pays right now.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        self.promotional_price.unwrap_or(self.price)
    }
}

/// Stock level bands used for the stock distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockBand {
    OutOfStock,
    OneToFive,
    SixToTen,
    ElevenToTwenty,
    MoreThanTwenty,
}

impl StockBand {
    /// All bands, lowest first.
    pub const ALL: [Self; 5] = [
        Self::OutOfStock,
        Self::OneToFive,
        Self::SixToTen,
        Self::ElevenToTwenty,
        Self::MoreThanTwenty,
    ];

    /// The band a stock level falls into.
    #[must_use]
    pub const fn for_quantity(quantity: u32) -> Self {
        match quantity {
            0 => Self::OutOfStock,
            1..=5 => Self::OneToFive,
            6..=10 => Self::SixToTen,
            11..=20 => Self::ElevenToTwenty,
            _ => Self::MoreThanTwenty,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OutOfStock => "Sin stock",
            Self::OneToFive => "1-5",
            Self::SixToTen => "6-10",
            Self::ElevenToTwenty => "11-20",
            Self::MoreThanTwenty => "Más de 20",
        }
    }
}

/// Count of listings per stock band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDistribution {
    /// `(band, listings)` for every band, lowest first.
    pub bands: Vec<(StockBand, u64)>,
}

impl StockDistribution {
    /// Bucket listings by their available quantity.
    #[must_use]
    pub fn from_products(products: &[ProductSummary]) -> Self {
        let bands = StockBand::ALL
            .iter()
            .map(|band| {
                let count = products
                    .iter()
                    .filter(|p| StockBand::for_quantity(p.available_quantity) == *band)
                    .count() as u64;
                (*band, count)
            })
            .collect();

        Self { bands }
    }

    /// Listings in a band.
    #[must_use]
    pub fn count(&self, band: StockBand) -> u64 {
        self.bands
            .iter()
            .find(|(b, _)| *b == band)
            .map_or(0, |(_, count)| *count)
    }
}

/// One price range of the price histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBin {
    /// Lower bound, inclusive.
    pub from: Decimal,
    /// Upper bound; inclusive only for the last bin.
    pub to: Decimal,
    /// Listings priced in the range.
    pub listings: u64,
}

/// Histogram of listings by the price a buyer pays now.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDistribution {
    /// Equal-width bins from the lowest to the highest price.
    pub bins: Vec<PriceBin>,
}

impl PriceDistribution {
    /// Bucket listings by effective price into `bins` equal-width ranges.
    ///
    /// No listings yields no bins. When every listing has the same price,
    /// or the price span cannot be represented, all listings share one bin.
    #[must_use]
    pub fn from_products(products: &[ProductSummary], bins: usize) -> Self {
        let prices: Vec<Decimal> = products.iter().map(|p| p.effective_price().amount).collect();
        let (Some(&min), Some(&max)) = (prices.iter().min(), prices.iter().max()) else {
            return Self::default();
        };

        let count = bins.max(1);
        let width = max
            .checked_sub(min)
            .and_then(|span| span.checked_div(Decimal::from(count)))
            .filter(|width| !width.is_zero());
        let Some(width) = width else {
            return Self {
                bins: vec![PriceBin {
                    from: min,
                    to: max,
                    listings: prices.len() as u64,
                }],
            };
        };

        let mut bins: Vec<PriceBin> = (0..count)
            .map(|i| {
                let from = min + width * Decimal::from(i);
                let to = if i + 1 == count { max } else { from + width };
                PriceBin {
                    from,
                    to,
                    listings: 0,
                }
            })
            .collect();

        for price in prices {
            let index = ((price - min) / width)
                .floor()
                .to_usize()
                .unwrap_or(0)
                .min(count - 1);
            if let Some(bin) = bins.get_mut(index) {
                bin.listings += 1;
            }
        }

        Self { bins }
    }

    /// Listings across all bins.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.bins.iter().map(|bin| bin.listings).sum()
    }
}
