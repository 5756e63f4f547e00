mod analyst;
mod api;
mod config;
mod error;
mod pipeline;
mod scraper;
mod stats;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::analyst::{Analyst, ChatClient};
use crate::api::routes::{router, ApiState};
use crate::api::SessionMetrics;
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::scraper::{HttpListingSource, ListingSource};
use crate::types::Marketplace;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    if cfg.ai_api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; analysis requests will fail at the generation step");
    }

    let http = reqwest::Client::new();

    // --- Marketplace sources ---
    let sources: Vec<Arc<dyn ListingSource>> = vec![
        Arc::new(HttpListingSource::new(
            http.clone(),
            &cfg.scraper_url,
            Marketplace::Tokopedia,
        )),
        Arc::new(HttpListingSource::new(
            http.clone(),
            &cfg.scraper_url,
            Marketplace::Blibli,
        )),
    ];
    info!(
        "Configured {} marketplace sources against {}",
        sources.len(),
        cfg.scraper_url
    );

    // --- Analysis pipeline ---
    let analyst = Analyst::new(Arc::new(ChatClient::new(http, &cfg)));
    let pipeline = Arc::new(Pipeline::new(sources, analyst, &cfg));

    // --- HTTP API ---
    let state = ApiState {
        pipeline,
        metrics: Arc::new(SessionMetrics::new()),
    };
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");
    axum::serve(listener, router(state)).await?;

    Ok(())
}
