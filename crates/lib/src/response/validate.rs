//! Per-kind checks that a record is usable downstream.

use crate::errors::ResponseError;
use crate::types::{OperationKind, Record};
use serde_json::Value;

/// Asserts the minimum field set of one content shape.
pub trait RecordValidator: Send + Sync {
    /// Strict check applied to structurally parsed records.
    fn validate(&self, record: &Record) -> Result<(), ResponseError>;

    /// Looser check deciding whether partially extracted data is kept as the
    /// final answer or falls through to the fallback.
    fn accepts_partial(&self, record: &Record) -> bool;
}

/// `meal_generation`: a recipe needs ingredients and instructions.
pub struct MealValidator;

/// Every other kind: the record must not be empty.
pub struct NonEmptyValidator;

static MEAL_VALIDATOR: MealValidator = MealValidator;
static NON_EMPTY_VALIDATOR: NonEmptyValidator = NonEmptyValidator;

pub fn validator_for(kind: &OperationKind) -> &'static dyn RecordValidator {
    match kind {
        OperationKind::MealGeneration => &MEAL_VALIDATOR,
        _ => &NON_EMPTY_VALIDATOR,
    }
}

pub fn is_valid_partial_response(record: &Record, kind: &OperationKind) -> bool {
    validator_for(kind).accepts_partial(record)
}

fn has_content(record: &Record, key: &str) -> bool {
    match record.get(key) {
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(list)) => !list.is_empty(),
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    }
}

/// The `{source: true, error}` record partial extraction reports on failure.
fn is_failure_sentinel(record: &Record) -> bool {
    record.get("source") == Some(&Value::Bool(true)) && record.contains_key("error")
}

impl RecordValidator for MealValidator {
    fn validate(&self, record: &Record) -> Result<(), ResponseError> {
        if record.is_empty() {
            return Err(ResponseError::EmptyRecord);
        }
        if !has_content(record, "ingredients") {
            return Err(ResponseError::MissingField("ingredients"));
        }
        if !has_content(record, "instructions") {
            return Err(ResponseError::MissingField("instructions"));
        }
        Ok(())
    }

    fn accepts_partial(&self, record: &Record) -> bool {
        !is_failure_sentinel(record)
            && ["ingredients", "instructions", "meals"]
                .iter()
                .any(|key| has_content(record, key))
    }
}

impl RecordValidator for NonEmptyValidator {
    fn validate(&self, record: &Record) -> Result<(), ResponseError> {
        if record.is_empty() {
            return Err(ResponseError::EmptyRecord);
        }
        Ok(())
    }

    fn accepts_partial(&self, record: &Record) -> bool {
        !record.is_empty() && !is_failure_sentinel(record)
    }
}
