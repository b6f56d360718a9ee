//! Bounded concurrent fan-out for list operations

use crate::error::Result;
use crate::kind::ResourceKind;
use futures_util::stream::{self, StreamExt};
use std::fmt::Display;
use std::future::Future;

/// Concurrency used when the caller passes 0
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Run `fetch` once per id with at most `limit` calls in flight.
///
/// Waits for every item. Items whose fetch fails are logged and left out of
/// the result; no error is returned for them. Result order is unspecified.
pub async fn fan_out<I, T, F, Fut>(kind: ResourceKind, ids: Vec<I>, limit: usize, fetch: F) -> Vec<T>
where
    I: Display + Clone,
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let limit = if limit == 0 { DEFAULT_CONCURRENCY } else { limit };
    let total = ids.len();

    let results: Vec<Option<T>> = stream::iter(ids)
        .map(|id| {
            let fut = fetch(id.clone());
            async move {
                match fut.await {
                    Ok(item) => Some(item),
                    Err(e) => {
                        tracing::warn!("skipping {} {}: {}", kind, id, e);
                        None
                    }
                }
            }
        })
        .buffer_unordered(limit)
        .collect()
        .await;

    let items: Vec<T> = results.into_iter().flatten().collect();
    if items.len() < total {
        tracing::info!("{} list: {} of {} items returned", kind, items.len(), total);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconError;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_failed_item_is_omitted() {
        let ids: Vec<u32> = (0..10).collect();

        let mut items = fan_out(ResourceKind::Disk, ids, 4, |i| async move {
            if i == 3 {
                Err(ReconError::not_found(ResourceKind::Disk, i.to_string()))
            } else {
                Ok(i * 10)
            }
        })
        .await;

        items.sort();
        assert_eq!(items.len(), 9);
        assert!(!items.contains(&30));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items = fan_out(ResourceKind::Vm, (0..20).collect::<Vec<u32>>(), 3, |i| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(i)
            }
        })
        .await;

        assert_eq!(items.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let items: Vec<u32> = fan_out(ResourceKind::Disk, Vec::<String>::new(), 0, |_| async {
            Ok(1)
        })
        .await;
        assert!(items.is_empty());
    }
}
