use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::api::health::SessionMetrics;
use crate::api::stream::stream_handler;
use crate::error::AppError;
use crate::pipeline::{DiscardSink, Pipeline};
use crate::types::{AnalysisRequest, AnalysisResult};

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<Pipeline>,
    pub metrics: Arc<SessionMetrics>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/api/price-analysis", post(post_analysis))
        .route("/api/price-analysis/stream", get(stream_handler))
        .with_state(state)
}

/// Non-streaming fallback: same input as the streaming channel, returns the
/// full result directly. Progress events are discarded.
async fn post_analysis(
    State(state): State<ApiState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let valid = request.validate()?;
    state.metrics.inc_started();
    match state.pipeline.run(valid, &DiscardSink).await {
        Ok(result) => {
            state.metrics.inc_completed();
            Ok(Json(result))
        }
        Err(e) => {
            state.metrics.inc_failed();
            Err(e)
        }
    }
}

async fn get_health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "sessions": {
            "started": state.metrics.started(),
            "completed": state.metrics.completed(),
            "failed": state.metrics.failed(),
            "cancelled": state.metrics.cancelled(),
        }
    }))
}
