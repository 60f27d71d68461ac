//! # General Route Handlers
//!
//! Liveness endpoints and `/process`, which runs the response pipeline over
//! text the caller already has.

use super::{pipeline_debug, wrap_response, ApiResponse, AppError, DebugParams};
use axum::{extract::Query, Json};
use mealforge::{process_ai_response_str, Record};
use serde::Deserialize;
use tracing::info;

#[derive(Deserialize, Debug)]
pub struct ProcessRequest {
    /// Raw model output.
    pub text: String,
    /// Operation name, e.g. `meal_generation`.
    pub kind: String,
}

/// The handler for the root (`/`) endpoint.
pub async fn root() -> &'static str {
    "mealforge server is running."
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Normalizes model output without calling a model.
pub async fn process_handler(
    debug_params: Query<DebugParams>,
    Json(payload): Json<ProcessRequest>,
) -> Result<Json<ApiResponse<Record>>, AppError> {
    info!(
        "Received process request for '{}' ({} bytes)",
        payload.kind,
        payload.text.len()
    );
    let processed = process_ai_response_str(&payload.text, &payload.kind);
    let debug_info = Some(pipeline_debug(&processed));
    Ok(wrap_response(processed.into_record(), debug_params, debug_info))
}
