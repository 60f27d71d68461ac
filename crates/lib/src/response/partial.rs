//! # Partial-Data Extractor
//!
//! Recovers fields from text that cannot be parsed as a JSON document.
//! Truncation and formatting drift usually break the overall structure while
//! leaving individual `"key": value` pairs intact, so each shape is scanned
//! with key-anchored regular expressions.
//!
//! Matches of different fields are paired by position: the Nth `name` goes
//! with the Nth `estimatedWeight`. This assumes the model kept field order
//! consistent across items, which holds for typical output but is not
//! guaranteed; a missing field in one item shifts the pairing of the rest.

use super::normalize::{macro_split, number_value};
use super::sanitize::NUMERIC_FIELDS;
use crate::types::{OperationKind, Record};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Maximum number of food items or meals recovered from one response.
pub const MAX_ITEMS: usize = 10;

/// Calorie value assumed for a recovered meal that carries none.
const DEFAULT_MEAL_CALORIES: f64 = 300.0;

static NAME: Lazy<Regex> = Lazy::new(|| string_field("name"));
static ESTIMATED_WEIGHT: Lazy<Regex> = Lazy::new(|| string_field("(?:estimatedWeight|quantity)"));
static CONFIDENCE: Lazy<Regex> = Lazy::new(|| string_field("confidence"));
static TITLE: Lazy<Regex> = Lazy::new(|| string_field("title"));
static MEAL_TYPE: Lazy<Regex> = Lazy::new(|| string_field("mealType"));
static TYPE: Lazy<Regex> = Lazy::new(|| string_field("type"));
static CALORIES: Lazy<Regex> = Lazy::new(|| numeric_field("calories"));
static NUTRIENTS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    NUMERIC_FIELDS
        .iter()
        .map(|field| (*field, numeric_field(field)))
        .collect()
});

static MAP_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"]+)"\s*:\s*(?:"([^"]*)"|(-?\d+(?:\.\d+)?))"#).expect("valid regex")
});
static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid regex"));

static INGREDIENTS_BLOCK: Lazy<Regex> = Lazy::new(|| block_start("ingredients"));
static INSTRUCTIONS_BLOCK: Lazy<Regex> = Lazy::new(|| block_start("instructions"));
static SUGGESTED_MEALS_BLOCK: Lazy<Regex> = Lazy::new(|| block_start("suggestedMeals"));
static TOTAL_NUTRITION_BLOCK: Lazy<Regex> = Lazy::new(|| block_start("totalNutrition"));
static FOOD_ITEMS_BLOCK: Lazy<Regex> = Lazy::new(|| block_start("foodItems"));

pub(crate) fn string_field(key: &str) -> Regex {
    Regex::new(&format!(r#""{key}"\s*:\s*"([^"]*)""#)).expect("valid regex")
}

pub(crate) fn numeric_field(key: &str) -> Regex {
    Regex::new(&format!(r#""{key}"\s*:\s*"?\s*(-?\d+(?:\.\d+)?)"#)).expect("valid regex")
}

pub(crate) fn block_start(key: &str) -> Regex {
    Regex::new(&format!(r#""{key}"\s*:\s*([\[{{])"#)).expect("valid regex")
}

/// Result of a partial extraction.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialData {
    Found(Record),
    /// Nothing recognizable was found.
    Empty { reason: String },
}

impl PartialData {
    pub fn is_found(&self) -> bool {
        matches!(self, PartialData::Found(_))
    }

    /// Renders the outcome as a record; `Empty` becomes `{"source": true, "error": reason}`.
    pub fn into_record(self) -> Record {
        match self {
            PartialData::Found(record) => record,
            PartialData::Empty { reason } => {
                let mut sentinel = Record::new();
                sentinel.insert("source".into(), Value::Bool(true));
                sentinel.insert("error".into(), Value::String(reason));
                sentinel
            }
        }
    }
}

/// Scans `text` for the shapes relevant to `kind`.
pub fn extract_partial(text: &str, kind: &OperationKind) -> PartialData {
    let mut record = Record::new();

    match kind {
        OperationKind::MealGeneration => {
            extract_recipe_parts(text, &mut record);
            extract_meal_plan(text, &mut record, true);
        }
        OperationKind::FoodAnalysis => {
            extract_food_section(text, &mut record);
            extract_suggested_meals(text, &mut record);
        }
        OperationKind::FridgeAnalysis => {
            extract_food_section(text, &mut record);
            extract_suggested_meals(text, &mut record);
        }
        OperationKind::Other(_) => {
            extract_recipe_parts(text, &mut record);
            extract_meal_plan(text, &mut record, false);
            extract_food_section(text, &mut record);
            extract_suggested_meals(text, &mut record);
        }
    }

    if record.is_empty() {
        return PartialData::Empty {
            reason: format!("no recognizable {kind} fields in response"),
        };
    }
    debug!(
        "Partial extraction recovered fields: {:?}",
        record.keys().collect::<Vec<_>>()
    );
    PartialData::Found(record)
}

/// Returns the body of the bracketed block opened at byte `open_at`, up to
/// the matching closer or the end of the text.
pub(crate) fn block_body(text: &str, open_at: usize) -> &str {
    let body_start = open_at + 1;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[open_at..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return &text[body_start..open_at + offset];
                }
            }
            _ => {}
        }
    }
    &text[body_start..]
}

/// Finds a `"key": {` or `"key": [` block, returning its opener and body.
pub(crate) fn find_block<'a>(text: &'a str, block: &Regex) -> Option<(char, &'a str)> {
    let opener = block.captures(text)?.get(1)?;
    let open_char = if opener.as_str() == "{" { '{' } else { '[' };
    Some((open_char, block_body(text, opener.start())))
}

pub(crate) fn string_literals(body: &str) -> Vec<String> {
    STRING_LITERAL
        .captures_iter(body)
        .map(|caps| caps[1].replace("\\\"", "\""))
        .filter(|literal| !literal.trim().is_empty())
        .collect()
}

/// `"ingredients"` as an amount map or a list of strings.
pub(crate) fn extract_ingredients(text: &str) -> Option<Value> {
    let (open, body) = find_block(text, &INGREDIENTS_BLOCK)?;
    let value = if open == '{' {
        let map: Record = MAP_PAIR
            .captures_iter(body)
            .map(|caps| {
                let amount = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .map_or("", |m| m.as_str());
                (caps[1].to_string(), Value::String(amount.to_string()))
            })
            .collect();
        Value::Object(map)
    } else {
        Value::Array(string_literals(body).into_iter().map(Value::String).collect())
    };
    let empty = match &value {
        Value::Object(map) => map.is_empty(),
        Value::Array(list) => list.is_empty(),
        _ => true,
    };
    (!empty).then_some(value)
}

/// The string steps of an `"instructions"` array.
pub(crate) fn extract_instructions(text: &str) -> Option<Value> {
    let (_, body) = find_block(text, &INSTRUCTIONS_BLOCK)?;
    let steps = string_literals(body);
    (!steps.is_empty()).then(|| Value::Array(steps.into_iter().map(Value::String).collect()))
}

fn extract_recipe_parts(text: &str, record: &mut Record) {
    if let Some(ingredients) = extract_ingredients(text) {
        record.insert("ingredients".into(), ingredients);
    }
    if let Some(instructions) = extract_instructions(text) {
        record.insert("instructions".into(), instructions);
    }
}

fn captures_of(regex: &Regex, text: &str) -> Vec<String> {
    regex
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn numbers_of(regex: &Regex, text: &str) -> Vec<f64> {
    regex
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<f64>().ok())
        .collect()
}

/// Zips `title`, `mealType`, `type` and `calories` matches into meals.
///
/// With `lift_single` a lone meal is merged into the record root instead of
/// being wrapped in a `meals` list, since a meal-generation response is
/// usually one recipe.
fn extract_meal_plan(text: &str, record: &mut Record, lift_single: bool) {
    let titles = captures_of(&TITLE, text);
    if titles.is_empty() {
        return;
    }
    let meal_types = captures_of(&MEAL_TYPE, text);
    let types = captures_of(&TYPE, text);
    let calories = numbers_of(&CALORIES, text);

    let meals: Vec<Record> = titles
        .into_iter()
        .take(MAX_ITEMS)
        .enumerate()
        .map(|(i, title)| {
            let mut meal = Record::new();
            meal.insert("title".into(), Value::String(title));
            if let Some(meal_type) = meal_types.get(i) {
                meal.insert("mealType".into(), Value::String(meal_type.clone()));
            }
            if let Some(kind) = types.get(i) {
                meal.insert("type".into(), Value::String(kind.clone()));
            }
            let meal_calories = calories.get(i).copied();
            if let Some(value) = meal_calories {
                meal.insert("calories".into(), number_value(value));
            }
            let info = macro_split(meal_calories.unwrap_or(DEFAULT_MEAL_CALORIES));
            meal.insert("nutritionalInfo".into(), Value::Object(info));
            meal
        })
        .collect();

    if lift_single && meals.len() == 1 {
        for (key, value) in meals.into_iter().flatten() {
            record.entry(key).or_insert(value);
        }
    } else {
        record.insert(
            "meals".into(),
            Value::Array(meals.into_iter().map(Value::Object).collect()),
        );
    }
}

/// The part of the text describing food items: the `foodItems` (or list-shaped
/// `ingredients`) block when present, else the whole text.
fn food_section(text: &str) -> &str {
    if let Some((_, body)) = find_block(text, &FOOD_ITEMS_BLOCK) {
        return body;
    }
    match find_block(text, &INGREDIENTS_BLOCK) {
        Some(('[', body)) => body,
        _ => text,
    }
}

fn extract_food_section(text: &str, record: &mut Record) {
    let section = food_section(text);
    let names = captures_of(&NAME, section);
    if !names.is_empty() {
        let weights = captures_of(&ESTIMATED_WEIGHT, section);
        let confidences = captures_of(&CONFIDENCE, section);
        let nutrients: Vec<(&str, Vec<f64>)> = NUTRIENTS
            .iter()
            .map(|(field, regex)| (*field, numbers_of(regex, section)))
            .collect();

        let items: Vec<Value> = names
            .into_iter()
            .take(MAX_ITEMS)
            .enumerate()
            .map(|(i, name)| {
                let mut item = Record::new();
                item.insert("name".into(), Value::String(name));
                let weight = weights.get(i).map_or("100g", String::as_str);
                item.insert("estimatedWeight".into(), Value::String(weight.to_string()));
                let confidence = confidences.get(i).map_or("medium", String::as_str);
                item.insert("confidence".into(), Value::String(confidence.to_string()));
                let info: Record = nutrients
                    .iter()
                    .map(|(field, values)| {
                        (field.to_string(), number_value(values.get(i).copied().unwrap_or(0.0)))
                    })
                    .collect();
                item.insert("nutritionalInfo".into(), Value::Object(info));
                Value::Object(item)
            })
            .collect();
        record.insert("foodItems".into(), Value::Array(items));
    }

    if let Some((_, body)) = find_block(text, &TOTAL_NUTRITION_BLOCK) {
        let total: Record = NUTRIENTS
            .iter()
            .filter_map(|(field, regex)| {
                let value = numbers_of(regex, body).into_iter().next()?;
                Some((field.to_string(), number_value(value)))
            })
            .collect();
        if !total.is_empty() {
            record.insert("totalNutrition".into(), Value::Object(total));
        }
    }
}

/// Wraps every string literal of the `suggestedMeals` array as a `{title}` stub.
///
/// Keys and values of object entries are picked up too; the normalizer's
/// title filter removes those.
fn extract_suggested_meals(text: &str, record: &mut Record) {
    let Some((_, body)) = find_block(text, &SUGGESTED_MEALS_BLOCK) else {
        return;
    };
    let stubs: Vec<Value> = string_literals(body)
        .into_iter()
        .map(|title| {
            let mut stub = Record::new();
            stub.insert("title".into(), Value::String(title));
            Value::Object(stub)
        })
        .collect();
    if !stubs.is_empty() {
        record.insert("suggestedMeals".into(), Value::Array(stubs));
    }
}
