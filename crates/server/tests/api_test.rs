//! # API Endpoint Tests
//!
//! Drives every route through a real server against a mocked
//! OpenAI-compatible upstream.

mod common;

use common::{chat_completion, TestApp, CHAT_PATH};
use httpmock::prelude::*;
use serde_json::json;

#[tokio::test]
async fn health_and_root_respond() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let health = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await?
        .text()
        .await?;
    assert_eq!(health, "OK");

    let root = app.client.get(&app.address).send().await?.text().await?;
    assert!(root.contains("running"));
    Ok(())
}

#[tokio::test]
async fn process_endpoint_reports_state_only_in_debug_mode() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let body = json!({
        "text": "```json\n{\"ingredients\":{\"rice\":\"1 cup\"},\"instructions\":[\"boil\"",
        "kind": "meal_generation"
    });

    let (status, plain) = app.post("/process", body.clone()).await?;
    assert_eq!(status, 200);
    assert!(plain.get("debug").is_none());
    assert_eq!(plain["result"]["ingredients"]["rice"], "1 cup");

    let (status, debugged) = app.post("/process?debug=true", body).await?;
    assert_eq!(status, 200);
    assert_eq!(debugged["debug"]["state"], "structurally_parsed");
    assert_eq!(debugged["debug"]["strategy"], "meal_json");
    Ok(())
}

#[tokio::test]
async fn process_endpoint_falls_back_instead_of_failing() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let (status, body) = app
        .post(
            "/process?debug=true",
            json!({"text": "Error: upstream timeout", "kind": "food_analysis"}),
        )
        .await?;

    assert_eq!(status, 200);
    assert_eq!(body["debug"]["state"], "fallback_synthesized");
    assert_eq!(body["debug"]["strategy"], serde_json::Value::Null);
    assert_eq!(body["result"]["foodItems"], json!([]));
    assert_eq!(body["result"]["error"], true);
    Ok(())
}

#[tokio::test]
async fn meal_generation_renders_the_prompt_and_normalizes_the_answer() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let upstream = app.mock_server.mock(|when, then| {
        when.method(POST)
            .path(CHAT_PATH)
            .body_contains("a cosy autumn soup");
        then.status(200).json_body(chat_completion(
            "Here you go!\n```json\n{\"title\": \"Pumpkin Soup\", \"ingredients\": {\"pumpkin\": \"1 kg\"}, \"instructions\": [\"Roast\", \"Blend\"], \"calories\": \"320 kcal\"}\n```",
        ));
    });

    let (status, body) = app
        .post("/meals/generate", json!({"prompt": "a cosy autumn soup"}))
        .await?;

    assert_eq!(status, 200);
    upstream.assert();
    assert_eq!(body["result"]["title"], "Pumpkin Soup");
    assert_eq!(body["result"]["calories"], 320);
    assert_eq!(body["result"]["nutritionalInfo"]["carbs"], 32);
    Ok(())
}

#[tokio::test]
async fn meal_generation_retries_then_returns_the_fallback() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let upstream = app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(200)
            .json_body(chat_completion("I'm sorry, I can't help with that."));
    });

    let (status, body) = app
        .post("/meals/generate?debug=true", json!({"prompt": "anything"}))
        .await?;

    assert_eq!(status, 200);
    upstream.assert_hits(2);
    assert_eq!(body["debug"]["state"], "fallback_synthesized");
    assert_eq!(body["result"]["title"], "Simple Balanced Meal");
    assert_eq!(body["result"]["confidence"], "low");
    Ok(())
}

#[tokio::test]
async fn configured_attempts_bound_the_retries() -> anyhow::Result<()> {
    let app = TestApp::spawn_with_extra_config("generation:\n  max_attempts: 4\n").await?;
    let upstream = app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(503).body("model loading");
    });

    let (status, body) = app
        .post("/analysis/food", json!({"description": "a bowl of ramen"}))
        .await?;

    assert_eq!(status, 200);
    upstream.assert_hits(4);
    assert!(body["result"]["message"]
        .as_str()
        .unwrap()
        .contains("model loading"));
    Ok(())
}

#[tokio::test]
async fn fridge_analysis_joins_items_and_filters_titles() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let upstream = app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH).body_contains("milk, eggs, spinach");
        then.status(200).json_body(chat_completion(
            r#"{"ingredients": [{"name": "Eggs", "quantity": "6"}], "suggestedMeals": [{"title": "easy"}, {"title": "Spinach Frittata"}, "30 minutes"]}"#,
        ));
    });

    let (status, body) = app
        .post(
            "/analysis/fridge",
            json!({"items": ["milk", "eggs", "spinach"]}),
        )
        .await?;

    assert_eq!(status, 200);
    upstream.assert();
    assert_eq!(body["result"]["ingredients"][0]["name"], "Eggs");
    assert_eq!(
        body["result"]["suggestedMeals"],
        json!([{"title": "Spinach Frittata"}])
    );
    Ok(())
}

#[tokio::test]
async fn daily_nutrition_sums_logged_meals() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let (status, body) = app
        .post(
            "/nutrition/daily",
            json!({"meals": {
                "Breakfast": [{"calories": 350, "protein": 20, "carbs": 40, "fat": 12}],
                "Dinner": [{"calories": "600 kcal", "protein": "45g"}]
            }}),
        )
        .await?;

    assert_eq!(status, 200);
    assert_eq!(body["result"]["calories"], 950.0);
    assert_eq!(body["result"]["protein"], 65.0);
    assert_eq!(body["result"]["mealTotals"]["Dinner"], 600.0);
    assert!(body["result"]["lastUpdated"].is_string());
    Ok(())
}

#[tokio::test]
async fn battle_ingredients_open_a_new_week() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let upstream = app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH).body_contains("2025-03-03");
        then.status(200)
            .json_body(chat_completion("Chickpeas, Smoked Paprika"));
    });

    let (status, body) = app
        .post(
            "/battles/ingredients",
            json!({"date": "2025-03-03", "existing_battles": ["2025-02-17", "2025-02-24"]}),
        )
        .await?;

    assert_eq!(status, 200);
    upstream.assert();
    assert_eq!(
        body["result"],
        json!({
            "dateKey": "2025-03-03",
            "ingredients": ["chickpeas", "smoked paprika"],
            "status": "active",
            "battleDeadline": "2025-03-09",
            "prevBattle": "2025-02-24"
        })
    );
    Ok(())
}

#[tokio::test]
async fn battle_ingredients_fail_after_unusable_answers() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let upstream = app.mock_server.mock(|when, then| {
        when.method(POST).path(CHAT_PATH);
        then.status(200).json_body(chat_completion("Lentils"));
    });

    let (status, body) = app.post("/battles/ingredients", json!({})).await?;

    assert_eq!(status, 502);
    upstream.assert_hits(3);
    assert!(body["error"].as_str().unwrap().contains("Lentils"));
    Ok(())
}

#[tokio::test]
async fn battle_winners_are_ranked_with_configured_points() -> anyhow::Result<()> {
    let app = TestApp::spawn_with_extra_config("battle:\n  points: [50, 25, 10]\n").await?;
    let (status, body) = app
        .post(
            "/battles/winners",
            json!({
                "battle_key": "2025-03-03",
                "participants": {
                    "ana": {"votes": ["u1", "u2"]},
                    "ben": {"votes": ["u3", "u4", "u5"]},
                    "cy": {"votes": []}
                }
            }),
        )
        .await?;

    assert_eq!(status, 200);
    assert_eq!(body["result"]["weekId"], "week_2025-03-03");
    let winners = body["result"]["winners"].as_array().unwrap();
    assert_eq!(winners.len(), 3);
    assert_eq!(winners[0]["userId"], "ben");
    assert_eq!(winners[0]["pointsAwarded"], 50);
    assert_eq!(winners[1]["userId"], "ana");
    assert_eq!(winners[2]["position"], 3);
    Ok(())
}

#[tokio::test]
async fn battle_winners_need_two_participants() -> anyhow::Result<()> {
    let app = TestApp::spawn().await?;
    let (status, body) = app
        .post(
            "/battles/winners",
            json!({"participants": {"solo": {"votes": ["u1"]}}}),
        )
        .await?;

    assert_eq!(status, 422);
    assert!(body["error"].as_str().unwrap().contains("Not enough participants"));
    Ok(())
}
