//! Per-call listing cache.

use std::collections::HashMap;

use meli_pulse_core::{ItemId, Product};

use crate::mercadolibre::MarketplaceApi;

/// Fetches each listing at most once within one computation.
///
/// A failed fetch is remembered as missing, so it is neither retried nor
/// counted twice.
pub struct ItemCache<'a, A> {
    api: &'a A,
    products: HashMap<ItemId, Option<Product>>,
    failed: u32,
}

impl<'a, A: MarketplaceApi> ItemCache<'a, A> {
    #[must_use]
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            products: HashMap::new(),
            failed: 0,
        }
    }

    /// The listing, or `None` if it could not be fetched.
    pub async fn get(&mut self, item_id: &ItemId) -> Option<&Product> {
        if !self.products.contains_key(item_id) {
            let product = match self.api.get_item(item_id).await {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(item_id = %item_id, error = %e, "Item fetch failed");
                    self.failed += 1;
                    None
                }
            };
            self.products.insert(item_id.clone(), product);
        }

        self.products.get(item_id).and_then(Option::as_ref)
    }

    /// Listings that failed to load.
    #[must_use]
    pub const fn failed(&self) -> u32 {
        self.failed
    }
}
