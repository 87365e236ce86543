//! Mercado Libre REST API access.
//!
//! # Architecture
//!
//! - [`MarketplaceApi`] is the seam the metrics engine is written against
//! - [`MercadoLibreClient`] implements it over `reqwest`
//! - Bearer credentials come from the client-credentials grant and are cached
//!   in memory until they expire
//!
//! The client reports every failure as a [`MarketplaceError`]. Deciding what a
//! failure means for a metric is left to the engine.

pub mod auth;
pub mod client;

pub use client::MercadoLibreClient;

use std::future::Future;

use chrono::{DateTime, FixedOffset};
use meli_pulse_core::{
    ItemId, ItemPrices, Order, OrderId, OrderStatus, Pack, PackId, Product, Question,
    QuestionFilter,
};
use thiserror::Error;

/// Errors that can occur when interacting with the marketplace API.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the marketplace.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Credentials were rejected for a data request.
    #[error("Unauthorized - check the application credentials")]
    Unauthorized,

    /// The token endpoint refused to issue a credential.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Total count reported by the server, when it reports one.
    pub total: Option<u64>,
}

impl<T> Page<T> {
    /// A page with no reported total.
    #[must_use]
    pub const fn new(items: Vec<T>) -> Self {
        Self { items, total: None }
    }

    /// A page carrying the server-reported total.
    #[must_use]
    pub const fn with_total(items: Vec<T>, total: u64) -> Self {
        Self {
            items,
            total: Some(total),
        }
    }
}

/// Order search parameters.
#[derive(Debug, Clone)]
pub struct OrderQuery<'a> {
    /// Seller user ID.
    pub seller_id: &'a str,
    /// Order status filter.
    pub status: OrderStatus,
    /// Inclusive window start.
    pub date_from: DateTime<FixedOffset>,
    /// Window end.
    pub date_to: DateTime<FixedOffset>,
}

/// Read access to the marketplace.
///
/// Methods return `Send` futures so the engine can run on a multi-threaded
/// runtime behind an axum handler.
pub trait MarketplaceApi: Send + Sync {
    /// One page of the seller's orders in a date window, newest first.
    fn list_orders(
        &self,
        query: &OrderQuery<'_>,
        offset: u64,
        limit: u32,
    ) -> impl Future<Output = Result<Page<Order>, MarketplaceError>> + Send;

    /// A single order by ID.
    fn get_order(
        &self,
        order_id: &OrderId,
    ) -> impl Future<Output = Result<Order, MarketplaceError>> + Send;

    /// A pack and the IDs of its member orders.
    fn get_pack(
        &self,
        pack_id: &PackId,
    ) -> impl Future<Output = Result<Pack, MarketplaceError>> + Send;

    /// A listing's full product record.
    fn get_item(
        &self,
        item_id: &ItemId,
    ) -> impl Future<Output = Result<Product, MarketplaceError>> + Send;

    /// One page of questions received by the seller, newest first.
    fn list_questions(
        &self,
        seller_id: &str,
        filter: Option<QuestionFilter>,
        offset: u64,
        limit: u32,
    ) -> impl Future<Output = Result<Page<Question>, MarketplaceError>> + Send;

    /// Standard and promotional prices for a listing.
    fn get_item_prices(
        &self,
        item_id: &ItemId,
    ) -> impl Future<Output = Result<ItemPrices, MarketplaceError>> + Send;

    /// One page of the seller's listing IDs.
    fn list_item_ids(
        &self,
        seller_id: &str,
        offset: u64,
        limit: u32,
    ) -> impl Future<Output = Result<Page<ItemId>, MarketplaceError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marketplace_error_display() {
        let err = MarketplaceError::NotFound("/orders/123".to_string());
        assert_eq!(err.to_string(), "Not found: /orders/123");

        let err = MarketplaceError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error (500): boom");

        let err = MarketplaceError::RateLimited(30);
        assert_eq!(err.to_string(), "Rate limited, retry after 30 seconds");
    }

    #[test]
    fn test_page_constructors() {
        let page = Page::with_total(vec![1, 2], 10);
        assert_eq!(page.total, Some(10));
        assert_eq!(Page::<u8>::new(vec![]).total, None);
    }
}
