//! # Prompt Templates
//!
//! Default system/user prompt pairs, keyed by task name.

pub mod tasks;

use tasks::*;

pub const MEAL_GENERATION_TASK: &str = "meal_generation";
pub const FOOD_ANALYSIS_TASK: &str = "food_analysis";
pub const FRIDGE_ANALYSIS_TASK: &str = "fridge_analysis";
pub const BATTLE_INGREDIENTS_TASK: &str = "battle_ingredients";

/// Every task that ships with default prompts.
pub const DEFAULT_TASKS: [&str; 4] = [
    MEAL_GENERATION_TASK,
    FOOD_ANALYSIS_TASK,
    FRIDGE_ANALYSIS_TASK,
    BATTLE_INGREDIENTS_TASK,
];

/// A system prompt and a user prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptPair {
    pub system: &'static str,
    pub user: &'static str,
}

/// The built-in prompts for `task`, if it has any.
pub fn default_prompts(task: &str) -> Option<PromptPair> {
    let (system, user) = match task {
        MEAL_GENERATION_TASK => (MEAL_GENERATION_SYSTEM_PROMPT, MEAL_GENERATION_USER_PROMPT),
        FOOD_ANALYSIS_TASK | "tasty_analysis" => {
            (FOOD_ANALYSIS_SYSTEM_PROMPT, FOOD_ANALYSIS_USER_PROMPT)
        }
        FRIDGE_ANALYSIS_TASK => (FRIDGE_ANALYSIS_SYSTEM_PROMPT, FRIDGE_ANALYSIS_USER_PROMPT),
        BATTLE_INGREDIENTS_TASK => (
            BATTLE_INGREDIENTS_SYSTEM_PROMPT,
            BATTLE_INGREDIENTS_USER_PROMPT,
        ),
        _ => return None,
    };
    Some(PromptPair { system, user })
}
