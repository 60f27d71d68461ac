//! Robust extraction for `meal_generation` responses.
//!
//! Meal output is the longest the model produces and the most likely to hit
//! the token limit, so truncation repair runs before the sanitizer and a
//! last-resort pass pulls individual recipe fields out of the raw text.

use super::normalize::{macro_split, number_value};
use super::partial::{
    block_start, extract_ingredients, extract_instructions, find_block, numeric_field,
    string_field, string_literals,
};
use super::sanitize::sanitize;
use super::structural::{
    aggressive_cleanup, outer_object_span, parse_record, repair_truncated_json,
    strip_markdown_fences, ExtractionMethod,
};
use crate::errors::ResponseError;
use crate::types::Record;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Recipe fields read verbatim as strings.
const TEXT_FIELDS: [&str; 6] = ["title", "description", "difficulty", "type", "mealType", "cuisine"];

static TEXT_FIELD_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    TEXT_FIELDS
        .iter()
        .map(|field| (*field, string_field(field)))
        .collect()
});
static CALORIES: Lazy<Regex> = Lazy::new(|| numeric_field("calories"));
static PROTEIN: Lazy<Regex> = Lazy::new(|| numeric_field("protein"));
static CARBS: Lazy<Regex> = Lazy::new(|| numeric_field("carbs"));
static FAT: Lazy<Regex> = Lazy::new(|| numeric_field("fat"));
static SERVINGS: Lazy<Regex> = Lazy::new(|| numeric_field("servings"));
static COOKING_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""cookingTime"\s*:\s*(?:"([^"]*)"|(\d+))"#).expect("valid regex")
});
static CATEGORIES_BLOCK: Lazy<Regex> = Lazy::new(|| block_start("categories"));

// Plain-text recipes: `# Title`, `**Ingredients:**` followed by bullet lines.
static SECTION_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(?:#{1,6}\s*)?\**\s*(ingredients|instructions|directions|method|steps)\s*\**\s*:?\s*\**\s*$",
    )
    .expect("valid regex")
});
static HEADING_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:title\s*:\s*|#{1,3}\s+)\**\s*(.+?)\s*\**\s*$").expect("valid regex")
});
static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+?)\s*$").expect("valid regex"));
static PROSE_CALORIES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:(\d{2,5})\s*(?:kcal|calories)\b|calories\s*[:\-]?\s*(\d{2,5}))")
        .expect("valid regex")
});

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Ingredients,
    Steps,
}

/// Title, ingredient lines and step lines of a recipe written as text.
#[derive(Default)]
struct ProseRecipe {
    title: Option<String>,
    ingredients: Vec<String>,
    steps: Vec<String>,
}

fn read_prose_recipe(text: &str) -> ProseRecipe {
    let mut recipe = ProseRecipe::default();
    let mut current: Option<Section> = None;

    for line in text.lines() {
        if let Some(caps) = SECTION_HEADING.captures(line) {
            current = Some(if caps[1].eq_ignore_ascii_case("ingredients") {
                Section::Ingredients
            } else {
                Section::Steps
            });
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        if let (Some(section), Some(caps)) = (current, LIST_ITEM.captures(line)) {
            let item = caps[1].to_string();
            match section {
                Section::Ingredients => recipe.ingredients.push(item),
                Section::Steps => recipe.steps.push(item),
            }
            continue;
        }
        current = None;
        if recipe.title.is_none() {
            if let Some(caps) = HEADING_TITLE.captures(line) {
                recipe.title = Some(caps[1].to_string());
            }
        }
    }
    recipe
}

fn prose_calories(text: &str) -> Option<f64> {
    let caps = PROSE_CALORIES.captures(text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn string_list(items: Vec<String>) -> Value {
    Value::Array(items.into_iter().map(Value::String).collect())
}

/// Markdown strip, truncation repair, sanitize, parse.
///
/// When the repaired text does not parse on its own, the outermost object
/// span is tried, then the aggressive cleanup of that span.
pub fn parse_meal_json(text: &str) -> Result<(Record, ExtractionMethod), ResponseError> {
    let stripped = strip_markdown_fences(text);
    if stripped.is_empty() {
        return Err(ResponseError::EmptyInput);
    }
    let repaired = sanitize(&repair_truncated_json(&stripped));
    if let Ok(record) = parse_record(&repaired) {
        return Ok((record, ExtractionMethod::Direct));
    }

    let span = outer_object_span(&repaired)
        .ok_or_else(|| ResponseError::parse("meal_json", "no JSON object found in response"))?;
    if let Ok(record) = parse_record(span) {
        return Ok((record, ExtractionMethod::Sliced));
    }
    parse_record(&aggressive_cleanup(span))
        .map(|record| (record, ExtractionMethod::Aggressive))
        .map_err(|e| ResponseError::parse("meal_json", e))
}

fn first_number(regex: &Regex, text: &str) -> Option<f64> {
    regex
        .captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
}

/// Field-by-field extraction over raw text, ignoring document structure.
///
/// JSON-looking fields are read first. Recipes written as plain text
/// (a heading, then ingredient and step lists) fill whatever is still
/// missing. Protein, carbs and fat found in the text win over the split
/// derived from calories. Returns `None` when no recipe field is present.
pub fn extract_meal_fields(text: &str) -> Option<Record> {
    let stripped = strip_markdown_fences(text);
    let text = stripped.as_str();
    let mut record = Record::new();

    for (field, pattern) in TEXT_FIELD_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            let value = caps[1].trim();
            if !value.is_empty() {
                record.insert(field.to_string(), Value::String(value.to_string()));
            }
        }
    }

    if let Some(ingredients) = extract_ingredients(text) {
        record.insert("ingredients".into(), ingredients);
    }
    if let Some(instructions) = extract_instructions(text) {
        record.insert("instructions".into(), instructions);
    }

    let prose = read_prose_recipe(text);
    if let Some(title) = prose.title {
        record
            .entry("title")
            .or_insert_with(|| Value::String(title));
    }
    if !record.contains_key("ingredients") && !prose.ingredients.is_empty() {
        record.insert("ingredients".into(), string_list(prose.ingredients));
    }
    if !record.contains_key("instructions") && !prose.steps.is_empty() {
        record.insert("instructions".into(), string_list(prose.steps));
    }

    if let Some(calories) = first_number(&CALORIES, text).or_else(|| prose_calories(text)) {
        let mut info = macro_split(calories);
        for (field, pattern) in [("protein", &*PROTEIN), ("carbs", &*CARBS), ("fat", &*FAT)] {
            if let Some(value) = first_number(pattern, text) {
                info.insert(field.into(), number_value(value));
            }
        }
        record.insert("calories".into(), number_value(calories));
        record.insert("nutritionalInfo".into(), Value::Object(info));
    }

    if let Some(caps) = COOKING_TIME.captures(text) {
        let time = match (caps.get(1), caps.get(2)) {
            (Some(text), _) => Value::String(text.as_str().to_string()),
            (None, Some(minutes)) => Value::String(format!("{} minutes", minutes.as_str())),
            (None, None) => Value::Null,
        };
        if !time.is_null() {
            record.insert("cookingTime".into(), time);
        }
    }
    if let Some(servings) = first_number(&SERVINGS, text) {
        record.insert("servings".into(), number_value(servings));
    }
    if let Some((_, body)) = find_block(text, &CATEGORIES_BLOCK) {
        let categories = string_literals(body);
        if !categories.is_empty() {
            record.insert(
                "categories".into(),
                Value::Array(categories.into_iter().map(Value::String).collect()),
            );
        }
    }

    debug!(
        "Raw meal field extraction found {} fields",
        record.len()
    );
    (!record.is_empty()).then_some(record)
}
