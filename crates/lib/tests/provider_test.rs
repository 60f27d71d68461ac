//! # Provider HTTP Tests
//!
//! Checks the wire format of the Gemini and OpenAI-compatible providers
//! against a mock server.

mod common;

use common::setup_tracing;
use mealforge::providers::ai::gemini::GeminiProvider;
use mealforge::providers::ai::AiProvider;
use mealforge::providers::factory::create_provider;
use mealforge::{process_ai_response, OperationKind, PromptError, ProviderConfig};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn gemini_posts_generate_content_with_the_api_key() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "You are a chef."}]},
            "contents": [{"role": "user", "parts": [{"text": "Make dinner."}]}],
            "generationConfig": {"maxOutputTokens": 4096}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [
                {"text": "{\"ingredients\": {\"pasta\": \"200g\"}, "},
                {"text": "\"instructions\": [\"Boil\"]}"}
            ]}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(
        format!("{}/models/gemini-1.5-flash:generateContent", server.uri()),
        "test-key".to_string(),
    )
    .unwrap();
    let text = provider.generate("You are a chef.", "Make dinner.").await.unwrap();

    assert_eq!(
        text,
        r#"{"ingredients": {"pasta": "200g"}, "instructions": ["Boil"]}"#
    );
    let processed = process_ai_response(&text, &OperationKind::MealGeneration);
    assert_eq!(processed.record["ingredients"]["pasta"], "200g");
}

#[tokio::test]
async fn gemini_error_status_is_reported_with_the_body() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("RESOURCE_EXHAUSTED"))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(server.uri(), "k".to_string()).unwrap();
    let err = provider.generate("", "hello").await.unwrap_err();

    match err {
        PromptError::AiApi(body) => assert_eq!(body, "RESOURCE_EXHAUSTED"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn gemini_without_candidates_returns_empty_text() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    let provider = GeminiProvider::new(server.uri(), "k".to_string()).unwrap();
    let text = provider.generate("system", "user").await.unwrap();
    assert_eq!(text, "");

    let processed = process_ai_response(&text, &OperationKind::FoodAnalysis);
    assert!(processed.is_fallback());
}

#[tokio::test]
async fn local_provider_sends_chat_messages_with_bearer_auth() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer local-secret"))
        .and(body_partial_json(json!({
            "model": "llama3",
            "messages": [
                {"role": "system", "content": "Analyze the fridge."},
                {"role": "user", "content": "milk, eggs"}
            ],
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"ingredients\": [{\"name\": \"Milk\"}]}"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig {
        provider: "local".to_string(),
        api_url: Some(format!("{}/v1/chat/completions", server.uri())),
        api_key: Some("local-secret".to_string()),
        model_name: "llama3".to_string(),
    };
    let provider = create_provider("fridge", &config).unwrap();
    let text = provider
        .generate("Analyze the fridge.", "milk, eggs")
        .await
        .unwrap();

    let processed = process_ai_response(&text, &OperationKind::FridgeAnalysis);
    assert_eq!(processed.record["ingredients"][0]["name"], "Milk");
    assert_eq!(processed.record["suggestedMeals"], json!([]));
}

#[tokio::test]
async fn local_provider_omits_a_blank_system_prompt() {
    setup_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "Two ingredients please"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "leek, feta"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig {
        provider: "local".to_string(),
        api_url: Some(server.uri()),
        api_key: None,
        model_name: "llama3".to_string(),
    };
    let provider = create_provider("battle", &config).unwrap();
    assert_eq!(
        provider.generate("  ", "Two ingredients please").await.unwrap(),
        "leek, feta"
    );
}
