use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `?debug=true` query flag.
#[derive(Debug, Deserialize, Default)]
pub struct DebugParams {
    pub debug: Option<bool>,
}

/// Envelope for every successful response.
///
/// `debug` is only present when the caller asked for it. For pipeline
/// endpoints it holds the terminal `state` and the accepting `strategy`.
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
    pub result: T,
}
