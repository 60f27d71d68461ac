//! # mealforge
//!
//! Turns free-form language-model output into validated meal, food-analysis
//! and fridge-analysis records, together with the providers, prompts and
//! small domain helpers (daily nutrition, weekly battles) built around it.
//!
//! The core entry point is [`process_ai_response`]: it never fails, and
//! always hands back a record the caller can persist.

pub mod battle;
pub mod errors;
pub mod generation;
pub mod nutrition;
pub mod prompts;
pub mod providers;
pub mod response;
pub mod types;

pub use errors::{BattleError, PromptError, ResponseError};
pub use generation::{generate_record, generate_record_with_retry, render_prompt};
pub use response::{
    process_ai_response, process_ai_response_str, PipelineState, ProcessedResponse,
};
pub use types::{ConfidenceTag, OperationKind, ProviderConfig, Record};
