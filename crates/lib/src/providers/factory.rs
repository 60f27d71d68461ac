//! # AI Provider Factory
//!
//! Builds provider instances from configuration. The model each provider
//! talks to is fixed here, once, when the server or CLI starts; nothing
//! downstream looks a model name up again.

use crate::{
    errors::PromptError,
    providers::ai::{gemini::GeminiProvider, local::LocalAiProvider, AiProvider},
    types::ProviderConfig,
};
use std::collections::HashMap;
use tracing::info;

/// Creates the provider described by `config`. `name` is only used in messages.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
) -> Result<Box<dyn AiProvider>, PromptError> {
    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "gemini" => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| {
                    PromptError::MissingAiProvider(format!(
                        "API key is required for Gemini provider '{name}'"
                    ))
                })?;
            let api_url = config
                .api_url
                .clone()
                .unwrap_or_else(|| GeminiProvider::endpoint_for(&config.model_name));
            info!(
                "Configuring Gemini provider '{}' for model '{}'",
                name, config.model_name
            );
            Box::new(GeminiProvider::new(api_url, api_key)?)
        }
        "local" => {
            let api_url = config.api_url.clone().ok_or_else(|| {
                PromptError::MissingAiProvider(format!(
                    "api_url is required for local provider '{name}'"
                ))
            })?;
            info!(
                "Configuring local provider '{}' at {} for model '{}'",
                name, api_url, config.model_name
            );
            Box::new(LocalAiProvider::new(
                api_url,
                config.api_key.clone().filter(|key| !key.trim().is_empty()),
                Some(config.model_name.clone()),
            )?)
        }
        other => return Err(PromptError::UnsupportedProvider(other.to_string())),
    };
    Ok(provider)
}

/// Builds every configured provider, keyed by name.
pub fn create_providers(
    configs: &HashMap<String, ProviderConfig>,
) -> Result<HashMap<String, Box<dyn AiProvider>>, PromptError> {
    let mut providers = HashMap::with_capacity(configs.len());
    for (name, config) in configs {
        providers.insert(name.clone(), create_provider(name, config)?);
    }
    Ok(providers)
}
