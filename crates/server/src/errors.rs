use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mealforge::{BattleError, PromptError};
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// Pipeline endpoints never produce one because of model output; only
/// provider failures, battle rules and misconfiguration end up here.
pub enum AppError {
    /// Errors talking to an AI provider.
    Prompt(PromptError),
    /// Errors from the battle helpers.
    Battle(BattleError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl From<PromptError> for AppError {
    fn from(err: PromptError) -> Self {
        AppError::Prompt(err)
    }
}

impl From<BattleError> for AppError {
    fn from(err: BattleError) -> Self {
        AppError::Battle(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::Prompt(err) => {
                error!("PromptError: {:?}", err);
                match err {
                    PromptError::MissingAiProvider(_) | PromptError::UnsupportedProvider(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Server is not configured correctly.".to_string(),
                    ),
                    PromptError::AiRequest(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Request to AI provider failed: {e}"),
                    ),
                    PromptError::AiDeserialization(e) => (
                        StatusCode::BAD_GATEWAY,
                        format!("Failed to deserialize AI provider response: {e}"),
                    ),
                    PromptError::AiApi(e) => {
                        (StatusCode::BAD_GATEWAY, format!("AI provider error: {e}"))
                    }
                    PromptError::JsonSerialization(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to serialize result: {e}"),
                    ),
                    PromptError::ReqwestClientBuild(e) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to build HTTP client: {e}"),
                    ),
                }
            }
            AppError::Battle(err) => {
                error!("BattleError: {:?}", err);
                match err {
                    BattleError::NotEnoughParticipants(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
                    }
                    BattleError::NoIngredientPair { .. } => {
                        (StatusCode::BAD_GATEWAY, err.to_string())
                    }
                }
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status_code, body).into_response()
    }
}
