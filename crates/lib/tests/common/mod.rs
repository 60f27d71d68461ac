#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared helpers for the integration tests: a scripted AI provider and a
//! one-time tracing setup.

use async_trait::async_trait;
use mealforge::providers::ai::AiProvider;
use mealforge::{PromptError, Record};
use serde_json::Value;
use std::sync::{Arc, Once, RwLock};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Converts a `json!` object literal into a `Record`.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

// --- Mock AI Provider for Logic Testing ---

/// A scripted response: text to return, or an API error message.
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    ApiError(String),
}

#[derive(Clone, Debug)]
pub struct MockAiProvider {
    pub call_history: Arc<RwLock<Vec<(String, String)>>>,
    pub responses: Arc<RwLock<Vec<MockReply>>>,
}

impl MockAiProvider {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::with_replies(
            responses
                .into_iter()
                .map(|text| MockReply::Text(text.to_string()))
                .collect(),
        )
    }

    pub fn with_replies(replies: Vec<MockReply>) -> Self {
        Self {
            call_history: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(replies.into_iter().rev().collect())),
        }
    }

    pub fn calls(&self) -> usize {
        self.call_history.read().unwrap().len()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        self.call_history
            .write()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        match self.responses.write().unwrap().pop() {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::ApiError(message)) => Err(PromptError::AiApi(message)),
            None => Ok("Default mock response".to_string()),
        }
    }
}
