//! Daily nutrition aggregation over a user's logged meals.

use crate::response::normalize::numeric_or_zero;
use crate::types::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Totals for one day, shaped to be merge-written as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    /// Calories per meal type (Breakfast, Lunch, ...).
    pub meal_totals: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl DailySummary {
    /// Sums a map of meal type to food-item list. Entries that are not lists
    /// are skipped; missing or non-numeric values count as zero.
    pub fn from_meals(meals: &Record) -> Self {
        let mut summary = DailySummary::default();
        for (meal_type, items) in meals {
            let Value::Array(items) = items else {
                continue;
            };
            let mut meal_calories = 0.0;
            for item in items.iter().filter_map(Value::as_object) {
                let calories = numeric_or_zero(item.get("calories"));
                meal_calories += calories;
                summary.protein += numeric_or_zero(item.get("protein"));
                summary.carbs += numeric_or_zero(item.get("carbs"));
                summary.fat += numeric_or_zero(item.get("fat"));
            }
            summary.calories += meal_calories;
            summary.meal_totals.insert(meal_type.clone(), meal_calories);
        }
        summary
    }

    /// Sets the timestamp the summary was computed at.
    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = Some(at);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn totals_and_meal_breakdown_are_summed() {
        let meals = json!({
            "Breakfast": [{"calories": 300, "protein": 20, "carbs": 30, "fat": 10}],
            "Lunch": [{"calories": "450 kcal", "protein": 35}, {"calories": 150, "fat": "5g"}],
            "notes": "skipped because it is not a list"
        });
        let summary = DailySummary::from_meals(meals.as_object().unwrap());
        assert_eq!(summary.calories, 900.0);
        assert_eq!(summary.protein, 55.0);
        assert_eq!(summary.carbs, 30.0);
        assert_eq!(summary.fat, 15.0);
        assert_eq!(summary.meal_totals.len(), 2);
        assert_eq!(summary.meal_totals["Lunch"], 600.0);
    }

    #[test]
    fn serializes_meal_totals_in_camel_case() {
        let summary = DailySummary::from_meals(json!({"Dinner": []}).as_object().unwrap());
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["mealTotals"]["Dinner"], json!(0.0));
        assert!(value.get("lastUpdated").is_none());
    }
}
