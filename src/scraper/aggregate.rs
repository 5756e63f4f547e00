//! Fan-out across marketplace sources with partial-failure tolerance.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::scraper::ListingSource;
use crate::types::Listing;

/// Query every source concurrently and merge whatever succeeded, in source
/// order. A single source failing (or timing out) is tolerated; the call
/// fails only when every source failed or zero listings came back in total.
/// `limit` caps the combined total, not the per-source count.
pub async fn fetch_listings(
    sources: &[Arc<dyn ListingSource>],
    query: &str,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<Listing>> {
    let calls = sources.iter().map(|source| async move {
        let outcome = tokio::time::timeout(timeout, source.fetch(query, limit)).await;
        let result = match outcome {
            Ok(r) => r,
            Err(_) => Err(AppError::Scrape(format!(
                "{} scraper timed out after {}s",
                source.marketplace(),
                timeout.as_secs()
            ))),
        };
        (source.marketplace(), result)
    });

    let mut listings: Vec<Listing> = Vec::new();
    let mut failures = 0usize;
    let total_sources = sources.len();

    for (marketplace, result) in join_all(calls).await {
        match result {
            Ok(batch) => {
                info!(source = %marketplace, count = batch.len(), "source scrape succeeded");
                listings.extend(batch);
            }
            Err(e) => {
                failures += 1;
                warn!(source = %marketplace, "source scrape failed: {e}");
            }
        }
    }

    if failures == total_sources {
        return Err(AppError::Scrape(
            "all marketplace sources failed".to_string(),
        ));
    }
    if listings.is_empty() {
        return Err(AppError::Scrape(format!(
            "no listings found for \"{query}\""
        )));
    }

    listings.truncate(limit);
    Ok(listings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Marketplace;
    use async_trait::async_trait;

    struct StubSource {
        marketplace: Marketplace,
        outcome: std::result::Result<usize, String>,
    }

    #[async_trait]
    impl ListingSource for StubSource {
        fn marketplace(&self) -> Marketplace {
            self.marketplace
        }

        async fn fetch(&self, query: &str, _limit: usize) -> Result<Vec<Listing>> {
            match &self.outcome {
                Ok(n) => Ok((0..*n)
                    .map(|i| Listing {
                        name: format!("{query} #{i} from {}", self.marketplace),
                        price_raw: "Rp100.000".to_string(),
                        price_numeric: Some(100_000.0),
                        rating: None,
                        image_url: None,
                        product_url: None,
                        shop_location: None,
                        sold_count: None,
                        source: self.marketplace,
                    })
                    .collect()),
                Err(msg) => Err(AppError::Scrape(msg.clone())),
            }
        }
    }

    fn sources(
        tokopedia: std::result::Result<usize, String>,
        blibli: std::result::Result<usize, String>,
    ) -> Vec<Arc<dyn ListingSource>> {
        vec![
            Arc::new(StubSource {
                marketplace: Marketplace::Tokopedia,
                outcome: tokopedia,
            }),
            Arc::new(StubSource {
                marketplace: Marketplace::Blibli,
                outcome: blibli,
            }),
        ]
    }

    #[tokio::test]
    async fn merges_in_source_order() {
        let srcs = sources(Ok(2), Ok(2));
        let listings = fetch_listings(&srcs, "laptop", 10, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(listings.len(), 4);
        assert_eq!(listings[0].source, Marketplace::Tokopedia);
        assert_eq!(listings[3].source, Marketplace::Blibli);
    }

    #[tokio::test]
    async fn one_source_down_is_tolerated() {
        let srcs = sources(Err("connection refused".to_string()), Ok(3));
        let listings = fetch_listings(&srcs, "laptop", 10, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(listings.len(), 3);
        assert!(listings.iter().all(|l| l.source == Marketplace::Blibli));
    }

    #[tokio::test]
    async fn all_sources_down_fails() {
        let srcs = sources(
            Err("connection refused".to_string()),
            Err("timeout".to_string()),
        );
        let err = fetch_listings(&srcs, "laptop", 10, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Scrape(_)));
    }

    #[tokio::test]
    async fn zero_listings_total_fails() {
        let srcs = sources(Ok(0), Ok(0));
        let err = fetch_listings(&srcs, "widget", 10, Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            AppError::Scrape(msg) => assert!(msg.contains("no listings")),
            other => panic!("expected Scrape, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn limit_caps_combined_total() {
        let srcs = sources(Ok(4), Ok(4));
        let listings = fetch_listings(&srcs, "laptop", 5, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(listings.len(), 5);
    }
}
