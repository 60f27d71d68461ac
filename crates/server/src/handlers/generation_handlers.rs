//! # Generation Route Handlers
//!
//! Endpoints that ask the model for a record and run the answer through the
//! response pipeline. Model output never makes these fail: a hopeless answer
//! comes back as the kind's fallback record.

use super::{pipeline_debug, wrap_response, ApiResponse, AppError, AppState, DebugParams};
use axum::{
    extract::{Query, State},
    Json,
};
use mealforge::prompts::{FOOD_ANALYSIS_TASK, FRIDGE_ANALYSIS_TASK, MEAL_GENERATION_TASK};
use mealforge::{generate_record_with_retry, render_prompt, OperationKind, Record};
use serde::Deserialize;
use tracing::info;

// --- API Payloads for Generation Handlers ---

#[derive(Deserialize, Debug)]
pub struct MealGenerationRequest {
    pub prompt: String,
}

#[derive(Deserialize, Debug)]
pub struct FoodAnalysisRequest {
    /// What is on the plate, as text.
    pub description: String,
}

#[derive(Deserialize, Debug)]
pub struct FridgeAnalysisRequest {
    pub items: Vec<String>,
}

// --- Generation Handlers ---

/// Runs `task` with `vars` substituted into its user prompt.
async fn run_task(
    app_state: &AppState,
    task_name: &str,
    kind: OperationKind,
    vars: &[(&str, &str)],
    debug_params: Query<DebugParams>,
) -> Result<Json<ApiResponse<Record>>, AppError> {
    let (task, provider) = app_state.task(task_name)?;
    let user_prompt = render_prompt(&task.user_prompt, vars);

    let processed = generate_record_with_retry(
        provider,
        &kind,
        &task.system_prompt,
        &user_prompt,
        app_state.config.generation.max_attempts,
    )
    .await;

    let debug_info = Some(pipeline_debug(&processed));
    Ok(wrap_response(processed.into_record(), debug_params, debug_info))
}

pub async fn meal_generation_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<MealGenerationRequest>,
) -> Result<Json<ApiResponse<Record>>, AppError> {
    info!("Received meal generation request: '{}'", payload.prompt);
    run_task(
        &app_state,
        MEAL_GENERATION_TASK,
        OperationKind::MealGeneration,
        &[("prompt", payload.prompt.as_str())],
        debug_params,
    )
    .await
}

pub async fn food_analysis_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<FoodAnalysisRequest>,
) -> Result<Json<ApiResponse<Record>>, AppError> {
    info!("Received food analysis request");
    run_task(
        &app_state,
        FOOD_ANALYSIS_TASK,
        OperationKind::FoodAnalysis,
        &[("description", payload.description.as_str())],
        debug_params,
    )
    .await
}

pub async fn fridge_analysis_handler(
    State(app_state): State<AppState>,
    debug_params: Query<DebugParams>,
    Json(payload): Json<FridgeAnalysisRequest>,
) -> Result<Json<ApiResponse<Record>>, AppError> {
    info!("Received fridge analysis request for {} items", payload.items.len());
    let items = payload.items.join(", ");
    run_task(
        &app_state,
        FRIDGE_ANALYSIS_TASK,
        OperationKind::FridgeAnalysis,
        &[("items", items.as_str())],
        debug_params,
    )
    .await
}
