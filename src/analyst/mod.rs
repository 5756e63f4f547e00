//! Recommendation generation: prompt construction, the chat-completion
//! collaborator, and strict output parsing.

pub mod client;
pub mod parse;
pub mod prompt;

pub use client::{ChatClient, TextGenerator};

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::types::{Listing, PriceStatistics, Recommendation};

pub struct Analyst {
    generator: Arc<dyn TextGenerator>,
}

impl Analyst {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Best-effort query rewrite before scraping. Any failure or a no-op
    /// rewrite falls back to the original query.
    pub async fn optimize_query(&self, query: &str) -> Option<String> {
        let user = prompt::build_optimizer_prompt(query);
        match self
            .generator
            .complete(prompt::OPTIMIZER_SYSTEM_PROMPT, &user)
            .await
        {
            Ok(text) => {
                let optimized = text
                    .lines()
                    .map(|l| l.trim().trim_matches('"'))
                    .find(|l| !l.is_empty())?
                    .to_string();
                if optimized.eq_ignore_ascii_case(query) {
                    None
                } else {
                    debug!(original = query, optimized = %optimized, "query optimized");
                    Some(optimized)
                }
            }
            Err(e) => {
                warn!("query optimization skipped: {e}");
                None
            }
        }
    }

    /// Produce a pricing recommendation from the computed statistics.
    /// Malformed generator output is a hard failure; an out-of-range target
    /// price is always flagged in the insights.
    pub async fn recommend(
        &self,
        query: &str,
        listings: &[Listing],
        stats: &PriceStatistics,
        user_price: Option<f64>,
    ) -> Result<Recommendation> {
        let user = prompt::build_recommendation_prompt(query, listings, stats, user_price);
        let text = self
            .generator
            .complete(prompt::ANALYST_SYSTEM_PROMPT, &user)
            .await?;

        let mut recommendation = parse::parse_generator_output(&text)?;
        parse::flag_budget_position(&mut recommendation, stats, user_price);

        if let Some(suggested) = recommendation.suggested_price {
            if suggested < stats.min || suggested > stats.max {
                warn!(
                    suggested,
                    min = stats.min,
                    max = stats.max,
                    "suggested price falls outside the observed market range"
                );
            }
        }

        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;

    struct FixedGenerator {
        reply: std::result::Result<String, String>,
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            self.reply
                .clone()
                .map_err(AppError::Generation)
        }
    }

    fn analyst(reply: std::result::Result<&str, &str>) -> Analyst {
        Analyst::new(Arc::new(FixedGenerator {
            reply: reply.map(str::to_string).map_err(str::to_string),
        }))
    }

    fn stats() -> PriceStatistics {
        PriceStatistics {
            min: 100_000.0,
            max: 500_000.0,
            average: 300_000.0,
            median: 280_000.0,
            q1: None,
            q3: None,
            total_products: 3,
        }
    }

    #[tokio::test]
    async fn recommend_surfaces_generator_failure() {
        let a = analyst(Err("provider down"));
        let err = a.recommend("laptop", &[], &stats(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }

    #[tokio::test]
    async fn recommend_flags_low_budget() {
        let a = analyst(Ok(
            "RECOMMENDATION: price near median\nINSIGHTS:\n- healthy demand",
        ));
        let rec = a
            .recommend("laptop", &[], &stats(), Some(10_000.0))
            .await
            .unwrap();
        assert!(rec.insights[0].contains("below the observed market range"));
    }

    #[tokio::test]
    async fn optimizer_failure_falls_back_to_none() {
        let a = analyst(Err("provider down"));
        assert_eq!(a.optimize_query("iphone").await, None);
    }

    #[tokio::test]
    async fn optimizer_noop_rewrite_is_dropped() {
        let a = analyst(Ok("  \"laptop asus\"  "));
        assert_eq!(a.optimize_query("laptop asus").await, None);
    }

    #[tokio::test]
    async fn optimizer_takes_first_nonempty_line() {
        let a = analyst(Ok("\niphone smartphone\n"));
        assert_eq!(
            a.optimize_query("iphone").await,
            Some("iphone smartphone".to_string())
        );
    }
}
