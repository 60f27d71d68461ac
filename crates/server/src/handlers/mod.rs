//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `mealforge-server`.
//! The handlers are split into sub-modules by the part of the app they serve.

pub mod battle_handlers;
pub mod general;
pub mod generation_handlers;
pub mod nutrition_handlers;

// Re-export all handlers so the router can reach them under `handlers::`.
pub use battle_handlers::*;
pub use general::*;
pub use generation_handlers::*;
pub use nutrition_handlers::*;

// Shared items used by multiple handler modules.
use super::{
    errors::AppError,
    state::AppState,
    types::{ApiResponse, DebugParams},
};
use axum::{extract::Query, Json};
use mealforge::ProcessedResponse;
use serde_json::{json, Value};

/// Wraps a successful result in the standard `ApiResponse` format, including
/// debug information only when the caller asked for it.
pub(crate) fn wrap_response<T>(
    result: T,
    debug_params: Query<DebugParams>,
    debug_info: Option<Value>,
) -> Json<ApiResponse<T>> {
    let debug = if debug_params.debug.unwrap_or(false) {
        debug_info
    } else {
        None
    };
    Json(ApiResponse { debug, result })
}

/// The debug object of a pipeline result: terminal state and winning strategy.
pub(crate) fn pipeline_debug(processed: &ProcessedResponse) -> Value {
    json!({
        "state": processed.state,
        "strategy": processed.strategy,
    })
}
