//! The per-session analysis pipeline.
//!
//! One [`Pipeline::run`] call serves exactly one analysis request:
//! optimize query → scrape → compute statistics → generate recommendation,
//! with progress reported at each milestone and exactly one terminal
//! `complete`/`error` event. All session state lives on the stack of the
//! run; nothing is shared between concurrent sessions.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::analyst::Analyst;
use crate::config::{milestones, Config};
use crate::error::{AppError, Result};
use crate::pipeline::EventSink;
use crate::scraper::{fetch_listings, ListingSource};
use crate::stats::compute_statistics;
use crate::types::{AnalysisResult, StreamEvent, ValidRequest};

pub struct Pipeline {
    sources: Vec<Arc<dyn ListingSource>>,
    analyst: Analyst,
    scrape_timeout: Duration,
    generation_timeout: Duration,
}

impl Pipeline {
    pub fn new(sources: Vec<Arc<dyn ListingSource>>, analyst: Analyst, cfg: &Config) -> Self {
        Self {
            sources,
            analyst,
            scrape_timeout: Duration::from_secs(cfg.scrape_timeout_secs),
            generation_timeout: Duration::from_secs(cfg.generation_timeout_secs),
        }
    }

    /// Run one analysis session against the given sink. Emits the terminal
    /// `complete`/`error` event itself; returns the result for callers on
    /// the non-streaming path. `Cancelled` means the consumer went away and
    /// nothing further is emitted in that case.
    pub async fn run(&self, req: ValidRequest, sink: &dyn EventSink) -> Result<AnalysisResult> {
        let mut percent = 0u8;
        match self.execute(&req, sink, &mut percent).await {
            Ok(result) => {
                info!(
                    query = %req.query,
                    products = result.products.len(),
                    "analysis complete"
                );
                if sink
                    .emit(StreamEvent::Complete {
                        data: result.clone(),
                    })
                    .await
                {
                    Ok(result)
                } else {
                    Err(AppError::Cancelled)
                }
            }
            Err(AppError::Cancelled) => {
                info!(query = %req.query, "session cancelled by client");
                Err(AppError::Cancelled)
            }
            Err(e) => {
                warn!(query = %req.query, "analysis failed: {e}");
                let _ = sink
                    .emit(StreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        req: &ValidRequest,
        sink: &dyn EventSink,
        percent: &mut u8,
    ) -> Result<AnalysisResult> {
        self.report(sink, percent, milestones::OPTIMIZING, "Optimizing search query")
            .await?;
        let optimized = tokio::time::timeout(
            self.generation_timeout,
            self.analyst.optimize_query(&req.query),
        )
        .await
        .ok()
        .flatten();
        let search_query = optimized.as_deref().unwrap_or(&req.query);

        self.report(
            sink,
            percent,
            milestones::SCRAPING,
            format!("Scraping marketplace listings for \"{search_query}\""),
        )
        .await?;
        let products = fetch_listings(
            &self.sources,
            search_query,
            req.limit,
            self.scrape_timeout,
        )
        .await?;

        self.report(
            sink,
            percent,
            milestones::COMPUTING,
            "Computing price statistics",
        )
        .await?;
        let prices: Vec<f64> = products
            .iter()
            .filter_map(|l| l.price_numeric)
            .filter(|p| p.is_finite() && *p >= 0.0)
            .collect();
        let statistics = compute_statistics(&prices)?;

        self.report(
            sink,
            percent,
            milestones::GENERATING,
            "Generating pricing recommendation",
        )
        .await?;
        let analysis = tokio::time::timeout(
            self.generation_timeout,
            self.analyst
                .recommend(search_query, &products, &statistics, req.user_price),
        )
        .await
        .map_err(|_| {
            AppError::Generation(format!(
                "generation timed out after {}s",
                self.generation_timeout.as_secs()
            ))
        })??;

        self.report(sink, percent, milestones::FINALIZING, "Finalizing analysis")
            .await?;

        Ok(AnalysisResult {
            query: req.query.clone(),
            optimized_query: optimized,
            products,
            statistics,
            analysis,
        })
    }

    /// Emit a progress event, clamping the percentage so it never decreases
    /// within a session.
    async fn report(
        &self,
        sink: &dyn EventSink,
        percent: &mut u8,
        milestone: u8,
        message: impl Into<String>,
    ) -> Result<()> {
        *percent = (*percent).max(milestone);
        if sink.emit(StreamEvent::progress(*percent, message)).await {
            Ok(())
        } else {
            Err(AppError::Cancelled)
        }
    }
}
