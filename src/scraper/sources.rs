//! Per-marketplace listing sources.
//!
//! Each source is an HTTP adapter against one scraper-service endpoint.
//! Raw records are validated at this boundary: a listing either normalizes
//! into a fully-typed [`Listing`] or is dropped with a warning; nothing
//! partially-filled flows downstream.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::types::{Listing, Marketplace};

#[async_trait]
pub trait ListingSource: Send + Sync {
    fn marketplace(&self) -> Marketplace;

    /// Fetch up to `limit` raw listings for `query` from this source.
    /// Fails when the source is unreachable or answers unsuccessfully.
    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<Listing>>;
}

// ---------------------------------------------------------------------------
// Scraper-service wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ScraperEnvelope {
    success: bool,
    #[serde(default)]
    data: Vec<RawListing>,
}

#[derive(Debug, Deserialize)]
struct RawListing {
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: String,
    rating: Option<String>,
    image_url: Option<String>,
    product_url: Option<String>,
    shop_location: Option<String>,
    sold: Option<String>,
}

// ---------------------------------------------------------------------------
// HTTP source
// ---------------------------------------------------------------------------

/// A marketplace source backed by the external scraper service.
/// Stateless between calls; one instance per marketplace.
pub struct HttpListingSource {
    client: reqwest::Client,
    base_url: String,
    marketplace: Marketplace,
}

impl HttpListingSource {
    pub fn new(client: reqwest::Client, base_url: &str, marketplace: Marketplace) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            marketplace,
        }
    }
}

#[async_trait]
impl ListingSource for HttpListingSource {
    fn marketplace(&self) -> Marketplace {
        self.marketplace
    }

    async fn fetch(&self, query: &str, limit: usize) -> Result<Vec<Listing>> {
        let url = format!("{}/api/scraper/{}", self.base_url, self.marketplace);
        let resp = self
            .client
            .get(&url)
            .query(&[("query", query), ("limit", &limit.to_string())])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AppError::Scrape(format!(
                "{} scraper returned {}",
                self.marketplace,
                resp.status()
            )));
        }

        let envelope: ScraperEnvelope = resp.json().await?;
        if !envelope.success {
            return Err(AppError::Scrape(format!(
                "{} scraper answered unsuccessfully",
                self.marketplace
            )));
        }

        let raw_count = envelope.data.len();
        let listings: Vec<Listing> = envelope
            .data
            .into_iter()
            .filter_map(|raw| normalize_listing(raw, self.marketplace))
            .collect();

        if listings.len() < raw_count {
            warn!(
                source = %self.marketplace,
                dropped = raw_count - listings.len(),
                "dropped malformed listings at source boundary"
            );
        }
        debug!(source = %self.marketplace, count = listings.len(), "fetched listings");

        Ok(listings)
    }
}

/// Normalize one raw scraper record. Requires a non-empty name and price
/// string; an unparseable price keeps the listing for display with
/// `price_numeric = None`.
fn normalize_listing(raw: RawListing, marketplace: Marketplace) -> Option<Listing> {
    let name = raw.name.trim().to_string();
    let price_raw = raw.price.trim().to_string();
    if name.is_empty() || price_raw.is_empty() {
        return None;
    }
    let price_numeric = parse_price(&price_raw);
    Some(Listing {
        name,
        price_numeric,
        price_raw,
        rating: raw.rating.filter(|s| !s.trim().is_empty()),
        image_url: raw.image_url.filter(|s| !s.trim().is_empty()),
        product_url: raw.product_url.filter(|s| !s.trim().is_empty()),
        shop_location: raw.shop_location.filter(|s| !s.trim().is_empty()),
        sold_count: raw.sold.filter(|s| !s.trim().is_empty()),
        source: marketplace,
    })
}

/// Parse an Indonesian-formatted price string ("Rp1.234.567") into a number.
/// Strips the Rp prefix, whitespace and `.`/`,` separators; the remainder
/// must be all digits. Deterministic, non-negative by construction.
pub fn parse_price(raw: &str) -> Option<f64> {
    let lower = raw.trim().to_lowercase();
    let s = lower
        .strip_prefix("rp")
        .map(|r| r.trim_start_matches('.'))
        .unwrap_or(&lower);

    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != ',')
        .collect();
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    cleaned.parse::<u64>().ok().map(|n| n as f64)
}
