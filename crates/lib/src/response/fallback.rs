//! Safe placeholder records for when no strategy produced usable data.

use super::normalize::macro_split;
use super::sanitize::NUMERIC_FIELDS;
use crate::types::{ConfidenceTag, OperationKind, Record};
use serde_json::{json, Value};

const FALLBACK_MEAL_CALORIES: f64 = 300.0;

/// Builds the fallback record for `kind`, carrying `error` for review.
pub fn build_fallback(kind: &OperationKind, error: &str) -> Record {
    let value = match kind {
        OperationKind::MealGeneration => {
            let nutrition = macro_split(FALLBACK_MEAL_CALORIES);
            json!({
                "title": "Simple Balanced Meal",
                "description": "A placeholder meal generated because the AI response could not be used.",
                "ingredients": {"Mixed vegetables": "2 cups"},
                "instructions": ["Prepare the ingredients and cook to taste."],
                "calories": nutrition["calories"],
                "nutritionalInfo": nutrition,
                "confidence": ConfidenceTag::Low.as_str(),
                "error": error,
                "notes": format!("Needs review: the AI response could not be parsed ({error})."),
            })
        }
        OperationKind::FoodAnalysis => {
            let totals: Record = NUMERIC_FIELDS
                .iter()
                .map(|field| (field.to_string(), Value::from(0)))
                .collect();
            json!({
                "foodItems": [],
                "totalNutrition": totals,
                "suggestedMeals": [],
                "error": true,
                "message": error,
            })
        }
        OperationKind::FridgeAnalysis => json!({
            "ingredients": [],
            "suggestedMeals": [],
            "error": true,
            "message": error,
        }),
        OperationKind::Other(_) => json!({
            "error": true,
            "message": error,
        }),
    };
    match value {
        Value::Object(record) => record,
        _ => Record::new(),
    }
}
