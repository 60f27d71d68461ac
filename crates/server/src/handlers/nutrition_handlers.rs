use super::{wrap_response, ApiResponse, AppError, DebugParams};
use axum::{extract::Query, Json};
use chrono::Utc;
use mealforge::nutrition::DailySummary;
use mealforge::Record;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Deserialize, Debug)]
pub struct DailyNutritionRequest {
    /// Meal type to the food items logged under it.
    pub meals: Record,
}

/// Recomputes a day's nutrition totals from its logged meals.
pub async fn daily_nutrition_handler(
    debug_params: Query<DebugParams>,
    Json(payload): Json<DailyNutritionRequest>,
) -> Result<Json<ApiResponse<DailySummary>>, AppError> {
    let summary = DailySummary::from_meals(&payload.meals).stamped(Utc::now());
    info!(
        "Daily nutrition: {} kcal over {} meal types",
        summary.calories,
        summary.meal_totals.len()
    );
    let debug_info = Some(json!({ "mealTypes": payload.meals.len() }));
    Ok(wrap_response(summary, debug_params, debug_info))
}
