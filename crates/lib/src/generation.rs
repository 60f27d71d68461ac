//! # Generation Service
//!
//! Calls a text-generation provider and runs its output through the response
//! pipeline. Retrying the model is a caller-level policy and lives here, not
//! inside the pipeline.

use crate::providers::ai::AiProvider;
use crate::response::{
    fallback::build_fallback, process_ai_response, PipelineState, ProcessedResponse,
};
use crate::types::OperationKind;
use tracing::{info, warn};

/// Substitutes every `{name}` placeholder in `template` with its value.
///
/// Placeholders without a value are left in place.
pub fn render_prompt(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |acc, (name, value)| {
        acc.replace(&format!("{{{name}}}"), value)
    })
}

/// Asks the model once and processes the answer.
///
/// A provider error becomes a fallback record carrying the error text, so
/// this never fails.
pub async fn generate_record(
    provider: &dyn AiProvider,
    kind: &OperationKind,
    system_prompt: &str,
    user_prompt: &str,
) -> ProcessedResponse {
    match provider.generate(system_prompt, user_prompt).await {
        Ok(text) => process_ai_response(&text, kind),
        Err(e) => {
            warn!("AI provider failed for {kind}: {e}");
            ProcessedResponse {
                record: build_fallback(kind, &e.to_string()),
                state: PipelineState::FallbackSynthesized,
                strategy: None,
            }
        }
    }
}

/// Like [`generate_record`], re-asking the model while the result is a
/// fallback. Makes at least one attempt and returns the last outcome.
pub async fn generate_record_with_retry(
    provider: &dyn AiProvider,
    kind: &OperationKind,
    system_prompt: &str,
    user_prompt: &str,
    max_attempts: usize,
) -> ProcessedResponse {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let processed = generate_record(provider, kind, system_prompt, user_prompt).await;
        if !processed.is_fallback() {
            info!("{kind} succeeded on attempt {attempt}/{max_attempts}");
            return processed;
        }
        if attempt >= max_attempts {
            warn!("{kind} still a fallback after {max_attempts} attempts");
            return processed;
        }
        info!("{kind} attempt {attempt}/{max_attempts} produced a fallback; retrying");
        attempt += 1;
    }
}
