use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate result of parsing: string keys to heterogeneous JSON values.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Selects the required-field schema and defaulting rules for one pipeline call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    MealGeneration,
    /// Food-image analysis. `tasty_analysis` is accepted as an alias.
    FoodAnalysis,
    FridgeAnalysis,
    /// Any other operation name. Gets the generic validation and fallback.
    Other(String),
}

impl OperationKind {
    pub fn as_str(&self) -> &str {
        match self {
            OperationKind::MealGeneration => "meal_generation",
            OperationKind::FoodAnalysis => "food_analysis",
            OperationKind::FridgeAnalysis => "fridge_analysis",
            OperationKind::Other(name) => name,
        }
    }
}

impl From<&str> for OperationKind {
    fn from(value: &str) -> Self {
        match value.trim() {
            "meal_generation" => OperationKind::MealGeneration,
            "food_analysis" | "tasty_analysis" => OperationKind::FoodAnalysis,
            "fridge_analysis" => OperationKind::FridgeAnalysis,
            other => OperationKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attached to results that did not come from a clean structural parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTag {
    High,
    Medium,
    Low,
    Extracted,
}

impl ConfidenceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTag::High => "high",
            ConfidenceTag::Medium => "medium",
            ConfidenceTag::Low => "low",
            ConfidenceTag::Extracted => "extracted",
        }
    }
}

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider ("gemini" or "local").
    pub provider: String,
    /// The API URL. Optional for Gemini, where it is derived from the model name.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
}
