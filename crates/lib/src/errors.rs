use thiserror::Error;

/// Errors raised while talking to a text-generation provider.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider is not configured: {0}")]
    MissingAiProvider(String),
    #[error("Unsupported AI provider type: {0}")]
    UnsupportedProvider(String),
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}

/// Failures of a single strategy inside the response pipeline.
///
/// These never escape `process_ai_response`; the orchestrator logs them and
/// moves on to the next strategy, finally embedding the last one's message
/// into the fallback record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    #[error("AI response was empty")]
    EmptyInput,
    #[error("AI response is an upstream error message: {0}")]
    ErrorSentinel(String),
    #[error("{strategy} failed: {reason}")]
    Parse {
        strategy: &'static str,
        reason: String,
    },
    #[error("Parsed JSON is not an object")]
    NotAnObject,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Record is empty")]
    EmptyRecord,
    #[error("No usable data could be extracted: {0}")]
    NoPartialData(String),
}

impl ResponseError {
    pub(crate) fn parse(strategy: &'static str, reason: impl ToString) -> Self {
        ResponseError::Parse {
            strategy,
            reason: reason.to_string(),
        }
    }
}

/// Errors from the weekly battle helpers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    #[error("Not enough participants to determine a winner: {0}")]
    NotEnoughParticipants(usize),
    #[error("No ingredient pair after {attempts} attempts; last response: {last_response}")]
    NoIngredientPair {
        attempts: usize,
        last_response: String,
    },
}
