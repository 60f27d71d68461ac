use super::{handlers, state::AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Creates the Axum router with all the application routes.
pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/process", post(handlers::process_handler))
        .route("/meals/generate", post(handlers::meal_generation_handler))
        .route("/analysis/food", post(handlers::food_analysis_handler))
        .route("/analysis/fridge", post(handlers::fridge_analysis_handler))
        .route("/nutrition/daily", post(handlers::daily_nutrition_handler))
        .route(
            "/battles/ingredients",
            post(handlers::battle_ingredients_handler),
        )
        .route("/battles/winners", post(handlers::battle_winners_handler))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
