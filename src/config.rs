use crate::error::{AppError, Result};

pub const SCRAPER_URL: &str = "http://localhost:4103";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Default number of listings analyzed when the caller does not specify one.
pub const DEFAULT_LIMIT: usize = 10;

/// Hard cap on listings per analysis, across all sources combined.
pub const MAX_LIMIT: usize = 50;

/// Channel capacity for per-session progress event delivery.
pub const CHANNEL_CAPACITY: usize = 64;

/// How many listings are included verbatim in the recommendation prompt.
pub const PROMPT_LISTING_SAMPLE: usize = 5;

/// Sampling temperature for the recommendation call.
pub const GENERATION_TEMPERATURE: f32 = 0.7;

/// Token budget for the recommendation call.
pub const GENERATION_MAX_TOKENS: u32 = 1000;

/// Progress milestones emitted by the pipeline (percentages).
/// Must be strictly increasing. The pipeline never reports a lower
/// percentage than one already emitted within the same session.
pub mod milestones {
    pub const OPTIMIZING: u8 = 10;
    pub const SCRAPING: u8 = 25;
    pub const COMPUTING: u8 = 55;
    pub const GENERATING: u8 = 75;
    pub const FINALIZING: u8 = 95;
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the marketplace scraper service (SCRAPER_URL).
    pub scraper_url: String,
    /// Base URL of the OpenAI-compatible chat completions API (OPENAI_API_BASE).
    pub ai_api_base: String,
    /// API key for the LLM provider (OPENAI_API_KEY). An empty key is allowed
    /// at startup; generation calls fail with a descriptive error instead.
    pub ai_api_key: String,
    /// Model name sent to the LLM provider (OPENAI_MODEL).
    pub ai_model: String,
    pub log_level: String,
    pub api_port: u16,
    /// Per-source scrape call upper bound in seconds (SCRAPE_TIMEOUT_SECS).
    pub scrape_timeout_secs: u64,
    /// Generation call upper bound in seconds (GENERATION_TIMEOUT_SECS).
    pub generation_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            scraper_url: std::env::var("SCRAPER_URL")
                .unwrap_or_else(|_| SCRAPER_URL.to_string()),
            ai_api_base: std::env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| OPENAI_API_BASE.to_string()),
            ai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            ai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| {
                    AppError::Config("API_PORT must be a valid port number".to_string())
                })?,
            scrape_timeout_secs: std::env::var("SCRAPE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .unwrap_or(30),
            generation_timeout_secs: std::env::var("GENERATION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse::<u64>()
                .unwrap_or(60),
        })
    }
}
