//! # AI Response Pipeline
//!
//! Turns free-form model text into a validated record. The entry point,
//! [`process_ai_response`], walks an ordered list of [`Strategy`] values and
//! stops at the first one that accepts; when none does, the fallback builder
//! supplies a placeholder. It never returns an error.

pub mod fallback;
pub mod meal;
pub mod normalize;
pub mod partial;
pub mod sanitize;
pub mod structural;
pub mod validate;

use crate::errors::ResponseError;
use crate::types::{ConfidenceTag, OperationKind, Record};
use fallback::build_fallback;
use normalize::normalize;
use partial::{extract_partial, PartialData};
use serde::Serialize;
use serde_json::Value;
use structural::{extract_structured, strip_markdown_fences, ExtractionMethod};
use tracing::{debug, info, warn};
use validate::{is_valid_partial_response, validator_for};

/// Prefixes (lowercased) that mark the text as an upstream error, not model output.
const ERROR_SENTINELS: [&str; 2] = ["error:", "[error]"];

/// Terminal state of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    StructurallyParsed,
    PartiallyExtracted,
    FallbackSynthesized,
}

/// The record a pipeline run produced, with how it got there.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedResponse {
    pub record: Record,
    pub state: PipelineState,
    /// Name of the accepting strategy; `None` for a fallback.
    pub strategy: Option<&'static str>,
}

impl ProcessedResponse {
    pub fn is_fallback(&self) -> bool {
        self.state == PipelineState::FallbackSynthesized
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

/// One step of the extraction cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Truncation repair, sanitize and parse for meal output.
    MealJson,
    /// The structural extractor followed by the kind's strict validator.
    Structural,
    /// Regex recovery of known shapes, checked by the looser validator.
    PartialExtraction,
    /// Field-by-field recovery of a single recipe.
    RawMealFields,
}

/// What a strategy concluded.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Accept {
        record: Record,
        state: PipelineState,
        confidence: Option<ConfidenceTag>,
    },
    /// Produced data that did not pass validation; a later strategy may do better.
    Retry(ResponseError),
    /// Could not produce anything from this text.
    Fail(ResponseError),
}

const MEAL_STRATEGIES: [Strategy; 3] = [
    Strategy::MealJson,
    Strategy::PartialExtraction,
    Strategy::RawMealFields,
];
const DEFAULT_STRATEGIES: [Strategy; 2] = [Strategy::Structural, Strategy::PartialExtraction];

/// The cascade order for `kind`.
pub fn strategies_for(kind: &OperationKind) -> &'static [Strategy] {
    match kind {
        OperationKind::MealGeneration => &MEAL_STRATEGIES,
        _ => &DEFAULT_STRATEGIES,
    }
}

fn confidence_for(method: ExtractionMethod) -> Option<ConfidenceTag> {
    match method {
        ExtractionMethod::Direct | ExtractionMethod::Sliced => None,
        ExtractionMethod::Aggressive => Some(ConfidenceTag::Medium),
        ExtractionMethod::Partial => Some(ConfidenceTag::Extracted),
    }
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::MealJson => "meal_json",
            Strategy::Structural => "structural",
            Strategy::PartialExtraction => "partial_extraction",
            Strategy::RawMealFields => "raw_meal_fields",
        }
    }

    pub fn run(&self, text: &str, kind: &OperationKind) -> StrategyOutcome {
        match self {
            Strategy::MealJson => match meal::parse_meal_json(text) {
                Ok((record, method)) => validated(record, method, kind),
                Err(e) => StrategyOutcome::Fail(e),
            },
            Strategy::Structural => match extract_structured(text, kind) {
                Ok(extracted) => validated(extracted.record, extracted.method, kind),
                Err(e) => StrategyOutcome::Fail(e),
            },
            Strategy::PartialExtraction => {
                match extract_partial(&strip_markdown_fences(text), kind) {
                    PartialData::Found(record) => accept_partial(record, kind),
                    PartialData::Empty { reason } => {
                        StrategyOutcome::Fail(ResponseError::NoPartialData(reason))
                    }
                }
            }
            Strategy::RawMealFields => match meal::extract_meal_fields(text) {
                Some(record) => accept_partial(record, kind),
                None => StrategyOutcome::Fail(ResponseError::NoPartialData(
                    "no recipe fields in response".to_string(),
                )),
            },
        }
    }
}

fn validated(record: Record, method: ExtractionMethod, kind: &OperationKind) -> StrategyOutcome {
    if let Err(e) = validator_for(kind).validate(&record) {
        return StrategyOutcome::Retry(e);
    }
    let state = if method == ExtractionMethod::Partial {
        PipelineState::PartiallyExtracted
    } else {
        PipelineState::StructurallyParsed
    };
    StrategyOutcome::Accept {
        record,
        state,
        confidence: confidence_for(method),
    }
}

fn accept_partial(record: Record, kind: &OperationKind) -> StrategyOutcome {
    if !is_valid_partial_response(&record, kind) {
        return StrategyOutcome::Retry(ResponseError::NoPartialData(format!(
            "recovered fields are not enough for {kind}"
        )));
    }
    StrategyOutcome::Accept {
        record,
        state: PipelineState::PartiallyExtracted,
        confidence: Some(ConfidenceTag::Extracted),
    }
}

/// Rejects empty text and upstream error messages before any parsing.
fn screen_input(text: &str) -> Result<(), ResponseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ResponseError::EmptyInput);
    }
    let lowered = trimmed.to_lowercase();
    if ERROR_SENTINELS
        .iter()
        .any(|sentinel| lowered.starts_with(sentinel))
    {
        let excerpt: String = trimmed.chars().take(200).collect();
        return Err(ResponseError::ErrorSentinel(excerpt));
    }
    Ok(())
}

fn fallback_response(kind: &OperationKind, error: &ResponseError) -> ProcessedResponse {
    warn!("Falling back to placeholder {kind} record: {error}");
    ProcessedResponse {
        record: build_fallback(kind, &error.to_string()),
        state: PipelineState::FallbackSynthesized,
        strategy: None,
    }
}

/// Processes one model response for `kind`. Always returns a record.
pub fn process_ai_response(text: &str, kind: &OperationKind) -> ProcessedResponse {
    debug!("Raw AI response for {kind}: {text}");
    if let Err(e) = screen_input(text) {
        return fallback_response(kind, &e);
    }

    let mut last_error = ResponseError::EmptyInput;
    for strategy in strategies_for(kind) {
        match strategy.run(text, kind) {
            StrategyOutcome::Accept {
                record,
                state,
                confidence,
            } => {
                let mut record = normalize(&record, kind);
                if let Some(tag) = confidence {
                    record.insert("confidence".into(), Value::String(tag.as_str().to_string()));
                }
                info!(
                    "{kind} response accepted by '{}' ({state:?})",
                    strategy.name()
                );
                return ProcessedResponse {
                    record,
                    state,
                    strategy: Some(strategy.name()),
                };
            }
            StrategyOutcome::Retry(e) => {
                info!("Strategy '{}' needs a retry: {e}", strategy.name());
                last_error = e;
            }
            StrategyOutcome::Fail(e) => {
                warn!("Strategy '{}' failed: {e}", strategy.name());
                last_error = e;
            }
        }
    }
    fallback_response(kind, &last_error)
}

/// [`process_ai_response`] with the operation kind given by name.
pub fn process_ai_response_str(text: &str, kind: &str) -> ProcessedResponse {
    process_ai_response(text, &OperationKind::from(kind))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meal_cascade_order() {
        assert_eq!(
            strategies_for(&OperationKind::MealGeneration),
            &[
                Strategy::MealJson,
                Strategy::PartialExtraction,
                Strategy::RawMealFields
            ]
        );
        assert_eq!(
            strategies_for(&OperationKind::FridgeAnalysis),
            &[Strategy::Structural, Strategy::PartialExtraction]
        );
    }

    #[test]
    fn error_sentinels_short_circuit() {
        let processed = process_ai_response("Error: quota exceeded", &OperationKind::FoodAnalysis);
        assert!(processed.is_fallback());
        assert!(processed.record["message"]
            .as_str()
            .unwrap()
            .contains("quota exceeded"));

        let processed = process_ai_response("[ERROR] upstream", &OperationKind::MealGeneration);
        assert!(processed.is_fallback());
    }

    #[test]
    fn validation_failure_falls_through_to_partial_extraction() {
        let outcome = Strategy::Structural.run(r#"{}"#, &OperationKind::FoodAnalysis);
        assert_eq!(outcome, StrategyOutcome::Retry(ResponseError::EmptyRecord));
    }

    #[test]
    fn aggressive_parse_is_tagged_medium() {
        let processed = process_ai_response(
            r#"{"foodItems": [{"name": "Pear" "calories": 100}] "note": "x"}"#,
            &OperationKind::FoodAnalysis,
        );
        assert_eq!(processed.state, PipelineState::StructurallyParsed);
        assert_eq!(processed.record["confidence"], "medium");
    }
}
