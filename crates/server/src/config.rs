//! # Application Configuration
//!
//! This module defines the configuration structure for the `mealforge-server`
//! and the logic for loading it from a `config.yml` file and environment
//! variables.

use config::{
    Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue,
    ValueKind as ConfigValueKind,
};
use mealforge::battle::{DEFAULT_MAX_ATTEMPTS as DEFAULT_BATTLE_ATTEMPTS, DEFAULT_POINTS};
use mealforge::prompts::{default_prompts, DEFAULT_TASKS};
use mealforge::ProviderConfig;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use tracing::info;

/// The provider every default task points at.
pub const DEFAULT_PROVIDER: &str = "default";

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// A map of named, reusable AI provider configurations.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// A map of tasks, each specifying a provider and prompts.
    #[serde(default)]
    pub tasks: HashMap<String, TaskConfig>,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub battle: BattleConfig,
}

fn default_port() -> u16 {
    9090
}

/// Defines the prompts and provider for a specific application task.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// Retry policy for the pipeline endpoints.
#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Model calls per request while the result is a fallback.
    #[serde(default = "default_generation_attempts")]
    pub max_attempts: usize,
}

fn default_generation_attempts() -> usize {
    2
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_generation_attempts(),
        }
    }
}

/// Weekly battle settings.
#[derive(Debug, Deserialize, Clone)]
pub struct BattleConfig {
    /// Points for each winning position, first place first.
    #[serde(default = "default_battle_points")]
    pub points: Vec<i64>,
    #[serde(default = "default_battle_attempts")]
    pub max_attempts: usize,
}

fn default_battle_points() -> Vec<i64> {
    DEFAULT_POINTS.to_vec()
}

fn default_battle_attempts() -> usize {
    DEFAULT_BATTLE_ATTEMPTS
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            points: default_battle_points(),
            max_attempts: default_battle_attempts(),
        }
    }
}

/// Constructs a `config::Value` map of the default tasks from the library.
/// This serves as the base layer of configuration.
fn build_default_tasks() -> HashMap<String, ConfigValue> {
    DEFAULT_TASKS
        .iter()
        .filter_map(|name| default_prompts(name).map(|prompts| (*name, prompts)))
        .map(|(name, prompts)| {
            let mut table = HashMap::new();
            table.insert("provider".to_string(), ConfigValue::from(DEFAULT_PROVIDER));
            table.insert("system_prompt".to_string(), ConfigValue::from(prompts.system));
            table.insert("user_prompt".to_string(), ConfigValue::from(prompts.user));
            (
                name.to_string(),
                ConfigValue::new(None, ConfigValueKind::Table(table)),
            )
        })
        .collect()
}

// Reads a file and substitutes `${VAR}` references from the environment.
// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - Layer 1: the library's default task prompts.
/// - Layer 2: `config_path_override`, else `config.yml`, else
///   `config.{AI_PROVIDER}.yml` (default `local`), with `${VAR}` substitution.
/// - Layer 3: plain environment variables for top-level keys such as `PORT`.
/// - Layer 4: `MEALFORGE_...` variables for nested keys
///   (e.g. `MEALFORGE_GENERATION__MAX_ATTEMPTS`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder().set_default("tasks", build_default_tasks())?;

    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if std::path::Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let provider = env::var("AI_PROVIDER").unwrap_or_else(|_| "local".to_string());
            let fallback_path = format!("{base_path}/config.{provider}.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}' based on AI_PROVIDER='{provider}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?.ok_or_else(|| {
        ConfigError::NotFound(format!(
            "Main config file not found at '{main_config_path}'. Please ensure 'config.yml' exists or your AI_PROVIDER is set to load a valid template ('local' or 'gemini')."
        ))
    })?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    let settings = builder
        .add_source(Environment::default())
        .add_source(
            Environment::with_prefix("MEALFORGE")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
