use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use fusion::{FusionError, FusionInputError, ModelSuite, ScoreFusion, ScoringPipeline, ScoringResponse, TransactionRequest};
use graph::GraphInput;
use network::{NetworkAssessment, NetworkConfigError, NetworkRiskAnalyzer};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::config::AppConfig;
use crate::metrics::{Metrics, MetricsSnapshot, TimedOperation};

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<ScoringPipeline>,
    metrics: Arc<Metrics>,
    request_timeout: Duration,
    max_body_bytes: usize,
}

/// Configuration the service refuses to start with.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Fusion(#[from] FusionError),

    #[error(transparent)]
    Network(#[from] NetworkConfigError),
}

impl AppState {
    pub fn new(config: &AppConfig, models: ModelSuite) -> Result<Self, StartupError> {
        let fusion = ScoreFusion::new(config.fusion)?;
        let network = NetworkRiskAnalyzer::new(config.network.clone())?;

        Ok(Self {
            pipeline: Arc::new(ScoringPipeline::new(models, network, fusion)),
            metrics: Metrics::new(),
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            max_body_bytes: config.server.max_body_bytes,
        })
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    NonFiniteRisk(#[from] FusionInputError),

    #[error("scoring timed out after {0:?}")]
    Timeout(Duration),

    #[error("scoring task failed: {0}")]
    Task(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NonFiniteRisk(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        };
        error!(error = %self, "Request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    models: BTreeMap<&'static str, bool>,
}

pub fn router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/detect-fraud", post(detect_fraud))
        .route("/api/network-risk", post(network_risk))
        .route("/api/metrics", get(get_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(body_limit),
        )
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        models: state.pipeline.models().availability(),
    })
}

async fn detect_fraud(
    State(state): State<AppState>,
    Json(request): Json<TransactionRequest>,
) -> Result<Json<ScoringResponse>, ApiError> {
    let timer = TimedOperation::start();
    let pipeline = state.pipeline.clone();

    let result = run_scoring(state.request_timeout, move || pipeline.score(&request))
        .await
        .and_then(|scored| scored.map_err(ApiError::from));

    state
        .metrics
        .record_detection(timer.elapsed(), result.as_ref().ok().map(|response| response.risk_class));
    state.metrics.record_request(result.is_ok());

    result.map(Json)
}

async fn network_risk(
    State(state): State<AppState>,
    Json(input): Json<GraphInput>,
) -> Result<Json<NetworkAssessment>, ApiError> {
    let timer = TimedOperation::start();
    let pipeline = state.pipeline.clone();

    let result = run_scoring(state.request_timeout, move || pipeline.network().assess(&input)).await;

    state.metrics.record_network(timer.elapsed());
    state.metrics.record_request(result.is_ok());

    result.map(Json)
}

async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Scoring is CPU-bound; keep it off the async workers.
///
/// A timed-out task is not cancelled and holds its blocking thread until it
/// finishes. The cycle cap and PageRank iteration limit bound that work.
async fn run_scoring<T, F>(timeout: Duration, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ApiError::Task(e.to_string())),
        Err(_) => Err(ApiError::Timeout(timeout)),
    }
}
