//! # Generation and Battle Logic Tests
//!
//! Drives the generation service and the battle ingredient picker against a
//! scripted provider.

mod common;

use common::{setup_tracing, MockAiProvider, MockReply};
use mealforge::battle::generate_battle_ingredients;
use mealforge::prompts::{default_prompts, MEAL_GENERATION_TASK};
use mealforge::{
    generate_record, generate_record_with_retry, render_prompt, BattleError, OperationKind,
    PipelineState,
};

const GOOD_MEAL: &str = r#"{"title": "Veggie Omelette", "ingredients": {"eggs": "3"}, "instructions": ["Whisk", "Fry"], "calories": 350}"#;

#[tokio::test]
async fn rendered_prompts_reach_the_provider() {
    setup_tracing();
    let provider = MockAiProvider::new(vec![GOOD_MEAL]);
    let prompts = default_prompts(MEAL_GENERATION_TASK).unwrap();
    let user = render_prompt(&prompts.user, &[("prompt", "a quick high-protein breakfast")]);

    let processed = generate_record(
        &provider,
        &OperationKind::MealGeneration,
        &prompts.system,
        &user,
    )
    .await;

    assert_eq!(processed.state, PipelineState::StructurallyParsed);
    assert_eq!(processed.record["title"], "Veggie Omelette");
    let history = provider.call_history.read().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].0, prompts.system);
    assert!(history[0].1.contains("a quick high-protein breakfast"));
    assert!(!history[0].1.contains("{prompt}"));
}

#[tokio::test]
async fn provider_errors_become_fallback_records() {
    setup_tracing();
    let provider = MockAiProvider::with_replies(vec![MockReply::ApiError(
        "quota exceeded".to_string(),
    )]);

    let processed =
        generate_record(&provider, &OperationKind::FoodAnalysis, "system", "user").await;

    assert!(processed.is_fallback());
    assert_eq!(processed.record["error"], true);
    assert!(processed.record["message"]
        .as_str()
        .unwrap()
        .contains("quota exceeded"));
}

#[tokio::test]
async fn retry_stops_at_the_first_usable_answer() {
    setup_tracing();
    let provider = MockAiProvider::with_replies(vec![
        MockReply::Text("Sorry, I can't do that.".to_string()),
        MockReply::ApiError("timeout".to_string()),
        MockReply::Text(GOOD_MEAL.to_string()),
        MockReply::Text(GOOD_MEAL.to_string()),
    ]);

    let processed = generate_record_with_retry(
        &provider,
        &OperationKind::MealGeneration,
        "system",
        "user",
        5,
    )
    .await;

    assert!(!processed.is_fallback());
    assert_eq!(processed.record["nutritionalInfo"]["protein"], 18);
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn retry_gives_up_with_the_last_fallback() {
    setup_tracing();
    let provider = MockAiProvider::new(vec!["no", "still no"]);

    let processed = generate_record_with_retry(
        &provider,
        &OperationKind::MealGeneration,
        "system",
        "user",
        2,
    )
    .await;

    assert!(processed.is_fallback());
    assert_eq!(processed.record["confidence"], "low");
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn zero_attempts_still_asks_once() {
    setup_tracing();
    let provider = MockAiProvider::new(vec![GOOD_MEAL]);
    let processed =
        generate_record_with_retry(&provider, &OperationKind::MealGeneration, "s", "u", 0).await;
    assert!(!processed.is_fallback());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn battle_ingredients_retry_until_two_names_come_back() {
    setup_tracing();
    let provider = MockAiProvider::with_replies(vec![
        MockReply::Text("Mushrooms".to_string()),
        MockReply::ApiError("overloaded".to_string()),
        MockReply::Text("Sweet Potato, Black Beans".to_string()),
    ]);

    let pair = generate_battle_ingredients(&provider, "system", "user", 3)
        .await
        .unwrap();

    assert_eq!(pair, ("sweet potato".to_string(), "black beans".to_string()));
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn battle_ingredients_report_the_last_answer_when_exhausted() {
    setup_tracing();
    let provider = MockAiProvider::new(vec!["Mushrooms", "Leeks"]);

    let err = generate_battle_ingredients(&provider, "system", "user", 2)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BattleError::NoIngredientPair {
            attempts: 2,
            last_response: "Leeks".to_string(),
        }
    );
}
