//! # Application State
//!
//! The shared state handed to every request handler: the configuration, the
//! resolved tasks and one AI provider client per configured provider. All of
//! it is built once at startup.

use crate::config::AppConfig;
use mealforge::providers::{factory::create_providers, AiProvider};
use std::{collections::HashMap, sync::Arc};
use tracing::info;

/// A fully resolved task configuration with non-optional fields.
#[derive(Clone, Debug)]
pub struct ResolvedTask {
    pub provider: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Arc<AppConfig>,
    /// A map of fully resolved tasks, ready for use by handlers.
    pub tasks: Arc<HashMap<String, ResolvedTask>>,
    /// A map of instantiated AI providers, keyed by their name from the config.
    pub ai_providers: Arc<HashMap<String, Box<dyn AiProvider>>>,
}

impl AppState {
    /// Looks up a task together with the provider it runs on.
    pub fn task(&self, name: &str) -> anyhow::Result<(&ResolvedTask, &dyn AiProvider)> {
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Task '{name}' not found in config"))?;
        let provider = self.ai_providers.get(&task.provider).ok_or_else(|| {
            anyhow::anyhow!(
                "Provider '{}' for task '{name}' not found in providers map.",
                task.provider
            )
        })?;
        Ok((task, provider.as_ref()))
    }
}

/// Builds the shared application state from the configuration.
///
/// Every provider is instantiated and every task resolved here, so a
/// misconfiguration stops the server at startup instead of on first use.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let ai_providers = create_providers(&config.providers)?;
    info!("Initialized {} AI provider(s).", ai_providers.len());

    let mut resolved_tasks = HashMap::new();
    for (name, task_config) in &config.tasks {
        let provider = task_config.provider.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'provider' field")
        })?;
        let system_prompt = task_config.system_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'system_prompt' field")
        })?;
        let user_prompt = task_config.user_prompt.clone().ok_or_else(|| {
            anyhow::anyhow!("Resolved task '{name}' is missing required 'user_prompt' field")
        })?;

        resolved_tasks.insert(
            name.clone(),
            ResolvedTask {
                provider,
                system_prompt,
                user_prompt,
            },
        );
    }

    Ok(AppState {
        config: Arc::new(config),
        tasks: Arc::new(resolved_tasks),
        ai_providers: Arc::new(ai_providers),
    })
}
