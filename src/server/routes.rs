use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::PipelineError;
use crate::generator::blackboard::{AnalysisMode, IntelligenceState};
use crate::generator::orchestrator::IntelligenceOrchestrator;
use crate::server::AppState;

type AppStateArc = Arc<AppState>;

pub const SERVICE_NAME: &str = "competitor-intel";

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/api/health", get(health))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

// ============================================================================
// Analyze
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub user_input: String,
    #[serde(default)]
    pub mode: AnalysisMode,
}

pub fn analyze_routes() -> Router<AppStateArc> {
    Router::new().route("/api/analyze", post(analyze))
}

async fn analyze(
    State(state): State<AppStateArc>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<IntelligenceState>, ApiError> {
    if req.user_input.trim().is_empty() {
        return Err(ApiError::BadRequest("user_input is required".to_string()));
    }
    info!(mode = %req.mode, "Received analysis request");

    let result = IntelligenceOrchestrator
        .run(&state.context, &req.user_input, req.mode)
        .await?;
    Ok(Json(result))
}

/// 处理器错误到HTTP响应的映射
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Pipeline(PipelineError),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                warn!("Rejected request: {}", message);
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Pipeline(err) => {
                error!("Analysis failed: {}", err);
                match &err {
                    PipelineError::StepFailed { state, .. } => (
                        StatusCode::BAD_GATEWAY,
                        Json(json!({ "error": err.to_string(), "state": state })),
                    )
                        .into_response(),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({ "error": err.to_string() })),
                    )
                        .into_response(),
                }
            }
        }
    }
}
