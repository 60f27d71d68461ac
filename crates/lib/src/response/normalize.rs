//! # Normalizer
//!
//! Makes numeric-semantic fields trustworthy and applies per-kind defaulting.

use super::sanitize::NUMERIC_FIELDS;
use crate::types::{OperationKind, Record};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

/// Every field that must leave the pipeline as a JSON number.
pub const NUMERIC_SEMANTIC_FIELDS: [&str; 9] = [
    "calories",
    "protein",
    "carbs",
    "fat",
    "fiber",
    "sugar",
    "sodium",
    "healthScore",
    "servings",
];

/// Sub-records holding nutrition values.
const NUTRITION_RECORDS: [&str; 2] = ["nutritionalInfo", "totalNutrition"];

/// Lists whose elements are records with their own numeric fields.
const ITEM_LISTS: [&str; 5] = ["foodItems", "items", "meals", "suggestedMeals", "ingredients"];

/// Names that are JSON keys, not recipe titles.
const FIELD_NAMES: [&str; 32] = [
    "title",
    "name",
    "mealtype",
    "type",
    "cookingtime",
    "preptime",
    "cooktime",
    "totaltime",
    "time",
    "difficulty",
    "servings",
    "calories",
    "protein",
    "carbs",
    "fat",
    "fiber",
    "sugar",
    "sodium",
    "ingredients",
    "instructions",
    "description",
    "nutritionalinfo",
    "totalnutrition",
    "cuisine",
    "diet",
    "quantity",
    "estimatedweight",
    "confidence",
    "suggestedmeals",
    "healthscore",
    "categories",
    "notes",
];

const DIFFICULTY_LEVELS: [&str; 7] = [
    "easy",
    "medium",
    "hard",
    "moderate",
    "beginner",
    "intermediate",
    "advanced",
];

/// Shortest string accepted as a recipe name.
const MIN_TITLE_CHARS: usize = 5;

static FIRST_NUMERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"-?\d{1,3}(?:,\d{3})+(?:\.\d+)?|-?\d+(?:\.\d+)?").expect("valid regex")
});
static TIME_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\d+\s*(?:-\s*\d+\s*)?(?:minutes?|mins?|hours?|hrs?|h|m)?\.?$")
        .expect("valid regex")
});

/// Renders `value` as an integer when it has no fractional part.
pub(crate) fn number_value(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or_else(|| Value::from(0), Value::Number)
    }
}

/// Coerces a numeric-semantic value.
///
/// Numbers pass through. Strings become their first numeral (`"1,200 kcal"`
/// → `1200`, `"12.5g"` → `12.5`), or `0` when they contain none. Any other
/// value yields `None` and is left as it is.
pub fn coerce_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(text) => {
            let parsed = FIRST_NUMERAL
                .find(text)
                .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
                .unwrap_or(0.0);
            Some(number_value(parsed))
        }
        _ => None,
    }
}

/// Reads a numeric-semantic value as `f64`, treating anything unusable as zero.
pub(crate) fn numeric_or_zero(value: Option<&Value>) -> f64 {
    value
        .and_then(coerce_number)
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0)
}

/// Default macro split for a calorie value: protein 20% and carbs 40% at
/// 4 kcal/g, fat 30% at 9 kcal/g.
pub fn macro_split(calories: f64) -> Record {
    let mut info = Record::new();
    info.insert("calories".into(), number_value(calories.round()));
    info.insert("protein".into(), number_value((calories * 0.20 / 4.0).round()));
    info.insert("carbs".into(), number_value((calories * 0.40 / 4.0).round()));
    info.insert("fat".into(), number_value((calories * 0.30 / 9.0).round()));
    info
}

/// Deep-copies `record`, coerces numeric fields at every known location and
/// applies the defaulting rules of `kind`.
pub fn normalize(record: &Record, kind: &OperationKind) -> Record {
    let mut normalized = record.clone();
    coerce_known_locations(&mut normalized);
    match kind {
        OperationKind::MealGeneration => normalize_meal(&mut normalized),
        OperationKind::FoodAnalysis => normalize_food_analysis(&mut normalized),
        OperationKind::FridgeAnalysis => normalize_fridge_analysis(&mut normalized),
        OperationKind::Other(_) => {}
    }
    // Defaulting may have moved or created sub-records.
    coerce_known_locations(&mut normalized);
    normalized
}

fn coerce_fields(record: &mut Record) {
    for field in NUMERIC_SEMANTIC_FIELDS {
        if let Some(value) = record.get_mut(field) {
            if let Some(coerced) = coerce_number(value) {
                *value = coerced;
            }
        }
    }
}

fn coerce_known_locations(record: &mut Record) {
    coerce_fields(record);
    for key in NUTRITION_RECORDS {
        if let Some(Value::Object(nested)) = record.get_mut(key) {
            coerce_fields(nested);
        }
    }
    for key in ITEM_LISTS {
        let Some(Value::Array(items)) = record.get_mut(key) else {
            continue;
        };
        for item in items.iter_mut() {
            if let Value::Object(item) = item {
                coerce_fields(item);
                if let Some(Value::Object(info)) = item.get_mut("nutritionalInfo") {
                    coerce_fields(info);
                }
            }
        }
    }
}

fn normalize_meal(record: &mut Record) {
    if !matches!(record.get("nutritionalInfo"), Some(Value::Object(_))) {
        if let Some(calories) = record.get("calories").and_then(Value::as_f64) {
            record.insert(
                "nutritionalInfo".into(),
                Value::Object(macro_split(calories)),
            );
        }
    }
    record
        .entry("ingredients")
        .or_insert_with(|| Value::Object(Record::new()));
    record
        .entry("instructions")
        .or_insert_with(|| Value::Array(Vec::new()));
}

fn normalize_food_analysis(record: &mut Record) {
    if !matches!(record.get("foodItems"), Some(Value::Array(_))) {
        record.insert("foodItems".into(), Value::Array(Vec::new()));
    }
    if !matches!(record.get("totalNutrition"), Some(Value::Object(_))) {
        let total = match record.get("foodItems") {
            Some(Value::Array(items)) => sum_nutrition(items),
            _ => sum_nutrition(&[]),
        };
        record.insert("totalNutrition".into(), Value::Object(total));
    }
    filter_suggested_meals(record);
}

/// Sums [`NUMERIC_FIELDS`] over food items, reading each item's
/// `nutritionalInfo` and falling back to fields on the item itself.
fn sum_nutrition(items: &[Value]) -> Record {
    let mut total = Record::new();
    for field in NUMERIC_FIELDS {
        let sum: f64 = items
            .iter()
            .filter_map(Value::as_object)
            .map(|item| {
                let nested = item
                    .get("nutritionalInfo")
                    .and_then(Value::as_object)
                    .and_then(|info| info.get(field));
                numeric_or_zero(nested.or_else(|| item.get(field)))
            })
            .sum();
        total.insert(field.into(), number_value(sum));
    }
    total
}

fn normalize_fridge_analysis(record: &mut Record) {
    let has_ingredient_list = matches!(record.get("ingredients"), Some(Value::Array(_)));
    if !has_ingredient_list {
        if let Some(Value::Array(food_items)) = record.remove("foodItems") {
            let ingredients = food_items.into_iter().map(food_item_to_ingredient).collect();
            record.insert("ingredients".into(), Value::Array(ingredients));
        }
    }
    if !matches!(record.get("ingredients"), Some(Value::Array(_))) {
        record.insert("ingredients".into(), Value::Array(Vec::new()));
    }
    filter_suggested_meals(record);
    if !matches!(record.get("suggestedMeals"), Some(Value::Array(_))) {
        record.insert("suggestedMeals".into(), Value::Array(Vec::new()));
    }
}

fn food_item_to_ingredient(item: Value) -> Value {
    match item {
        Value::Object(mut fields) => {
            if !fields.contains_key("quantity") {
                if let Some(weight) = fields.remove("estimatedWeight") {
                    fields.insert("quantity".into(), weight);
                }
            }
            Value::Object(fields)
        }
        Value::String(name) => {
            let mut fields = Record::new();
            fields.insert("name".into(), Value::String(name));
            Value::Object(fields)
        }
        other => other,
    }
}

/// Drops suggested meals whose title is a stray field name, a bare time or
/// difficulty value, or too short to be a recipe name. String entries are
/// promoted to `{title}` stubs first.
fn filter_suggested_meals(record: &mut Record) {
    let Some(Value::Array(meals)) = record.get_mut("suggestedMeals") else {
        return;
    };
    let kept = std::mem::take(meals)
        .into_iter()
        .filter_map(|meal| match meal {
            Value::String(title) => {
                let mut stub = Record::new();
                stub.insert("title".into(), Value::String(title));
                Some(Value::Object(stub))
            }
            Value::Object(_) => Some(meal),
            _ => None,
        })
        .filter(|meal| {
            meal.get("title")
                .and_then(Value::as_str)
                .is_some_and(is_recipe_title)
        })
        .collect();
    *meals = kept;
}

/// Whether `title` looks like a real recipe name.
pub fn is_recipe_title(title: &str) -> bool {
    let title = title.trim();
    if title.chars().count() < MIN_TITLE_CHARS {
        return false;
    }
    let lowered = title.to_lowercase();
    let compact: String = lowered.chars().filter(|c| !c.is_whitespace()).collect();
    !(FIELD_NAMES.contains(&compact.as_str())
        || DIFFICULTY_LEVELS.contains(&lowered.as_str())
        || TIME_VALUE.is_match(title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn numeral_strings_are_coerced() {
        assert_eq!(coerce_number(&json!("450")), Some(json!(450)));
        assert_eq!(coerce_number(&json!("12.5g")), Some(json!(12.5)));
        assert_eq!(coerce_number(&json!("1,200 kcal")), Some(json!(1200)));
        assert_eq!(coerce_number(&json!("about -3 grams")), Some(json!(-3)));
        assert_eq!(coerce_number(&json!("unknown")), Some(json!(0)));
        assert_eq!(coerce_number(&json!(7)), Some(json!(7)));
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!(true)), None);
    }

    #[test]
    fn macro_split_of_300_kcal_is_the_default_split() {
        assert_eq!(
            Value::Object(macro_split(300.0)),
            json!({"calories": 300, "protein": 15, "carbs": 30, "fat": 10})
        );
    }

    #[test]
    fn nested_locations_are_coerced() {
        let input = record(json!({
            "calories": "500 kcal",
            "nutritionalInfo": {"protein": "20g", "fat": null},
            "foodItems": [{"name": "Rice", "nutritionalInfo": {"carbs": "45"}, "healthScore": "7/10"}],
            "ingredients": {"egg": "2"}
        }));
        let normalized = normalize(&input, &OperationKind::Other("custom".into()));
        assert_eq!(normalized["calories"], json!(500));
        assert_eq!(normalized["nutritionalInfo"]["protein"], json!(20));
        assert_eq!(normalized["nutritionalInfo"]["fat"], json!(null));
        assert_eq!(normalized["foodItems"][0]["nutritionalInfo"]["carbs"], json!(45));
        assert_eq!(normalized["foodItems"][0]["healthScore"], json!(7));
        assert_eq!(normalized["ingredients"]["egg"], json!("2"));
    }

    #[test]
    fn meal_gets_nutrition_from_calories_and_required_keys() {
        let normalized = normalize(
            &record(json!({"title": "Soup", "calories": "400"})),
            &OperationKind::MealGeneration,
        );
        assert_eq!(normalized["nutritionalInfo"]["protein"], json!(20));
        assert_eq!(normalized["ingredients"], json!({}));
        assert_eq!(normalized["instructions"], json!([]));
    }

    #[test]
    fn food_analysis_totals_are_summed_when_missing() {
        let normalized = normalize(
            &record(json!({"foodItems": [
                {"name": "Apple", "nutritionalInfo": {"calories": 95, "fiber": "4g"}},
                {"name": "Toast", "calories": "120"}
            ]})),
            &OperationKind::FoodAnalysis,
        );
        assert_eq!(normalized["totalNutrition"]["calories"], json!(215));
        assert_eq!(normalized["totalNutrition"]["fiber"], json!(4));
        assert_eq!(normalized["totalNutrition"]["sodium"], json!(0));
    }

    #[test]
    fn fridge_food_items_become_ingredients_and_titles_are_filtered() {
        let normalized = normalize(
            &record(json!({
                "foodItems": [{"name": "Spinach", "estimatedWeight": "200g"}],
                "suggestedMeals": [
                    {"title": "cookingTime"},
                    {"title": "Grilled Salmon with Asparagus", "difficulty": "easy"},
                    {"title": "30 minutes"},
                    {"title": "Easy"},
                    {"title": "Stew"},
                    "Spinach Omelette"
                ]
            })),
            &OperationKind::FridgeAnalysis,
        );
        assert_eq!(
            normalized["ingredients"],
            json!([{"name": "Spinach", "quantity": "200g"}])
        );
        assert!(normalized.get("foodItems").is_none());
        assert_eq!(
            normalized["suggestedMeals"],
            json!([
                {"title": "Grilled Salmon with Asparagus", "difficulty": "easy"},
                {"title": "Spinach Omelette"}
            ])
        );
    }

    #[test]
    fn recipe_titles_are_recognised() {
        assert!(is_recipe_title("Grilled Salmon with Asparagus"));
        assert!(!is_recipe_title("cookingTime"));
        assert!(!is_recipe_title("Cooking Time"));
        assert!(!is_recipe_title("15-20 mins"));
        assert!(!is_recipe_title("Intermediate"));
        assert!(!is_recipe_title("Tea"));
    }
}
