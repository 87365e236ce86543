//! Exhaustive pagination over offset/limit endpoints.

use std::future::Future;

use crate::mercadolibre::{MarketplaceError, Page};

/// Everything a paginated endpoint returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    /// Records in fetch order.
    pub items: Vec<T>,
    /// False when a page failed and `items` is partial.
    pub complete: bool,
    /// Pages that failed (0 or 1: pagination stops at the first failure).
    pub failed_pages: u32,
}

/// Drain an offset/limit endpoint into one result set.
///
/// Starts at offset 0 and advances by `page_size`. Stops on an empty page, a
/// short page, or once a reported total is reached. A page failure stops the
/// walk and returns what was accumulated so far with `complete = false`.
///
/// A `page_size` of 0 is treated as 1.
pub async fn fetch_all<T, F, Fut>(page_size: u32, mut fetch_page: F) -> Fetched<T>
where
    F: FnMut(u64, u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, MarketplaceError>>,
{
    let page_size = page_size.max(1);
    let mut items = Vec::new();
    let mut offset: u64 = 0;

    loop {
        let page = match fetch_page(offset, page_size).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(
                    offset,
                    fetched = items.len(),
                    error = %e,
                    "Page fetch failed, keeping partial results"
                );
                return Fetched {
                    items,
                    complete: false,
                    failed_pages: 1,
                };
            }
        };

        let received = page.items.len();
        if received == 0 {
            break;
        }
        items.extend(page.items);
        offset += u64::from(page_size);

        if received < page_size as usize {
            break;
        }
        if page.total.is_some_and(|total| offset >= total) {
            break;
        }
    }

    tracing::debug!(fetched = items.len(), "Pagination complete");

    Fetched {
        items,
        complete: true,
        failed_pages: 0,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    async fn serve(
        all: &[u32],
        offset: u64,
        limit: u32,
        total: Option<u64>,
    ) -> Result<Page<u32>, MarketplaceError> {
        let start = usize::try_from(offset).unwrap().min(all.len());
        let end = (start + limit as usize).min(all.len());
        Ok(Page {
            items: all[start..end].to_vec(),
            total,
        })
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let all: Vec<u32> = (0..120).collect();
        let calls = AtomicU32::new(0);

        let fetched = fetch_all(50, |offset, limit| {
            calls.fetch_add(1, Ordering::SeqCst);
            serve(&all, offset, limit, None)
        })
        .await;

        assert_eq!(fetched.items, all);
        assert!(fetched.complete);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_empty_page_without_total() {
        let all: Vec<u32> = (0..100).collect();
        let calls = AtomicU32::new(0);

        let fetched = fetch_all(50, |offset, limit| {
            calls.fetch_add(1, Ordering::SeqCst);
            serve(&all, offset, limit, None)
        })
        .await;

        assert_eq!(fetched.items.len(), 100);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_at_reported_total() {
        let all: Vec<u32> = (0..100).collect();
        let calls = AtomicU32::new(0);

        let fetched = fetch_all(50, |offset, limit| {
            calls.fetch_add(1, Ordering::SeqCst);
            serve(&all, offset, limit, Some(100))
        })
        .await;

        assert_eq!(fetched.items.len(), 100);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_reported_total_ends_walk_after_full_page() {
        let all: Vec<u32> = (0..60).collect();

        let fetched = fetch_all(50, |offset, limit| serve(&all, offset, limit, Some(40))).await;

        assert_eq!(fetched.items.len(), 50);
        assert!(fetched.complete);
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_results() {
        let all: Vec<u32> = (0..150).collect();

        let fetched = fetch_all(50, |offset, limit| {
            let all = &all;
            async move {
                if offset == 100 {
                    return Err(MarketplaceError::RateLimited(60));
                }
                serve(all, offset, limit, None).await
            }
        })
        .await;

        assert_eq!(fetched.items.len(), 100);
        assert!(!fetched.complete);
        assert_eq!(fetched.failed_pages, 1);
    }

    #[tokio::test]
    async fn test_zero_page_size_is_clamped() {
        let all: Vec<u32> = vec![7, 8, 9];

        let fetched = fetch_all(0, |offset, limit| {
            assert_eq!(limit, 1);
            serve(&all, offset, limit, None)
        })
        .await;

        assert_eq!(fetched.items, vec![7, 8, 9]);
    }

    #[tokio::test]
    async fn test_empty_first_page() {
        let fetched = fetch_all(50, |offset, limit| serve(&[], offset, limit, Some(0))).await;
        assert!(fetched.items.is_empty());
        assert!(fetched.complete);
    }
}
