use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Marketplace sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Tokopedia,
    Blibli,
}

impl std::fmt::Display for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Marketplace::Tokopedia => "tokopedia",
            Marketplace::Blibli => "blibli",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Listings
// ---------------------------------------------------------------------------

/// One scraped product offer, normalized from a marketplace source.
/// Held only for the duration of one analysis request; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub name: String,
    /// Source-formatted price string, e.g. "Rp1.234.567".
    #[serde(rename = "price")]
    pub price_raw: String,
    /// Deterministic parse of `price_raw`. None if the string is not a
    /// well-formed price; such listings are displayed but excluded from
    /// statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_numeric: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop_location: Option<String>,
    #[serde(rename = "sold", skip_serializing_if = "Option::is_none")]
    pub sold_count: Option<String>,
    pub source: Marketplace,
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Aggregate over the valid numeric prices of one analysis request.
/// Invariant: min <= q1 <= median <= q3 <= max whenever all are defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceStatistics {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub median: f64,
    /// Median of the lower half. None when the sample is too small to split.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q1: Option<f64>,
    /// Median of the upper half. None when the sample is too small to split.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q3: Option<f64>,
    /// Count of listings with a valid numeric price.
    pub total_products: usize,
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub recommendation: String,
    pub insights: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_price: Option<f64>,
}

// ---------------------------------------------------------------------------
// Top-level result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub query: String,
    /// Present when the pipeline rewrote the query before scraping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized_query: Option<String>,
    /// Insertion order = scrape order.
    pub products: Vec<Listing>,
    pub statistics: PriceStatistics,
    pub analysis: Recommendation,
}

// ---------------------------------------------------------------------------
// Inbound request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub query: String,
    pub limit: Option<usize>,
    pub user_price: Option<f64>,
}

/// A request that passed input validation. Constructed before any I/O begins.
#[derive(Debug, Clone)]
pub struct ValidRequest {
    pub query: String,
    pub limit: usize,
    pub user_price: Option<f64>,
}

impl AnalysisRequest {
    /// Validate caller input synchronously. Empty queries, a zero limit and
    /// non-positive target prices are rejected; limits above the cap are
    /// clamped rather than rejected.
    pub fn validate(self) -> Result<ValidRequest> {
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return Err(AppError::Validation(
                "query must be a non-empty string".to_string(),
            ));
        }

        let limit = match self.limit {
            Some(0) => {
                return Err(AppError::Validation(
                    "limit must be a positive integer".to_string(),
                ))
            }
            Some(n) => n.min(MAX_LIMIT),
            None => DEFAULT_LIMIT,
        };

        if let Some(p) = self.user_price {
            if !p.is_finite() || p <= 0.0 {
                return Err(AppError::Validation(
                    "userPrice must be a positive number".to_string(),
                ));
            }
        }

        Ok(ValidRequest {
            query,
            limit,
            user_price: self.user_price,
        })
    }
}

// ---------------------------------------------------------------------------
// Streaming protocol events
// ---------------------------------------------------------------------------

/// One message on the streaming channel. Serialized with a `type` tag,
/// matching the wire protocol consumed by streaming clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Connected,
    Progress { progress: u8, message: String },
    Complete { data: AnalysisResult },
    Error { message: String },
}

impl StreamEvent {
    pub fn progress(progress: u8, message: impl Into<String>) -> Self {
        StreamEvent::Progress {
            progress,
            message: message.into(),
        }
    }

    /// Terminal events end the session; exactly one is emitted per session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete { .. } | StreamEvent::Error { .. })
    }
}

/// First message a streaming client sends after connecting.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    StartAnalysis(AnalysisRequest),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(query: &str, limit: Option<usize>, user_price: Option<f64>) -> AnalysisRequest {
        AnalysisRequest {
            query: query.to_string(),
            limit,
            user_price,
        }
    }

    #[test]
    fn empty_query_rejected() {
        assert!(matches!(
            req("   ", None, None).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn zero_limit_rejected() {
        assert!(matches!(
            req("laptop", Some(0), None).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn oversized_limit_clamped() {
        let v = req("laptop", Some(500), None).validate().unwrap();
        assert_eq!(v.limit, MAX_LIMIT);
    }

    #[test]
    fn missing_limit_defaults() {
        let v = req("laptop", None, None).validate().unwrap();
        assert_eq!(v.limit, DEFAULT_LIMIT);
        assert_eq!(v.query, "laptop");
    }

    #[test]
    fn negative_user_price_rejected() {
        assert!(matches!(
            req("laptop", None, Some(-5.0)).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn query_whitespace_trimmed() {
        let v = req("  sepatu nike  ", None, Some(250_000.0)).validate().unwrap();
        assert_eq!(v.query, "sepatu nike");
        assert_eq!(v.user_price, Some(250_000.0));
    }

    #[test]
    fn start_analysis_message_parses() {
        let raw = r#"{"type":"start-analysis","query":"laptop","limit":20,"userPrice":1500000}"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        let ClientMessage::StartAnalysis(req) = msg;
        assert_eq!(req.query, "laptop");
        assert_eq!(req.limit, Some(20));
        assert_eq!(req.user_price, Some(1_500_000.0));
    }

    #[test]
    fn stream_event_wire_shape() {
        let ev = StreamEvent::progress(25, "Scraping marketplace listings");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["progress"], 25);
        assert!(!StreamEvent::Connected.is_terminal());
        assert!(StreamEvent::Error { message: "x".into() }.is_terminal());
    }
}
