use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::budget::Budget;

/// Default phrase an upstream emits when it silently serves a weaker model.
pub const DEFAULT_FALLBACK_PHRASE: &str = "switched to a fallback model";
/// Model suggested to the caller after a silent upstream downgrade.
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-4o-mini";
/// Identity prompt template; `{model}` is replaced by the model label.
pub const DEFAULT_IDENTITY_TEMPLATE: &str =
    "You are {model}, a helpful assistant. Answer clearly and concisely.";

pub const DEFAULT_TICK_MS: u64 = 16;
pub const DEFAULT_SLICE_CHARS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http_proxy: String,
    #[serde(default)]
    pub https_proxy: String,
    /// Bearer token passed through to the upstream endpoint
    pub api_key: Option<String>,
    /// Full URL of the upstream chat endpoint
    pub api_base: Option<String>,
    pub model: Option<String>,
    /// Display name resolved by the model catalog
    #[serde(default)]
    pub model_label: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub search_mode: Option<String>,
    #[serde(default)]
    pub identity_template: Option<String>,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub fallback: FallbackConfig,
}

/// Typewriter pacing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Model id patterns that get paced output; `*` matches every model
    pub models: Vec<String>,
    pub tick_ms: u64,
    pub slice_chars: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            tick_ms: DEFAULT_TICK_MS,
            slice_chars: DEFAULT_SLICE_CHARS,
        }
    }
}

impl FlowConfig {
    /// Whether output for `model` should be paced.
    pub fn regulates(&self, model: &str) -> bool {
        self.models
            .iter()
            .any(|pattern| pattern == "*" || model.contains(pattern.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    pub phrase: String,
    pub model: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            phrase: DEFAULT_FALLBACK_PHRASE.to_string(),
            model: DEFAULT_FALLBACK_MODEL.to_string(),
        }
    }
}

const CONFIG_FILE_PATH: &str = "config.toml";

fn relay_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".chat-relay")
}

fn relay_config_json_path() -> PathBuf {
    relay_dir().join("config.json")
}

/// Directory holding persisted conversation transcripts.
pub fn conversations_dir() -> PathBuf {
    relay_dir().join("conversations")
}

fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl Default for Config {
    fn default() -> Self {
        Config {
            http_proxy: String::new(),
            https_proxy: String::new(),
            api_key: None,
            api_base: None,
            model: None,
            model_label: None,
            temperature: None,
            search_mode: None,
            identity_template: None,
            budget: Budget::default(),
            flow: FlowConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

impl Config {
    /// Load `~/.chat-relay/config.json`, else `./config.toml`, then apply
    /// environment overrides.
    pub fn new() -> Self {
        let mut config = Self::load_from(&relay_config_json_path(), Path::new(CONFIG_FILE_PATH));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Read the first config file that exists and parses; defaults otherwise.
    pub fn load_from(json_path: &Path, toml_path: &Path) -> Self {
        if json_path.exists() {
            match std::fs::read_to_string(json_path) {
                Ok(content) => match serde_json::from_str::<Config>(&content) {
                    Ok(file_config) => return file_config,
                    Err(e) => log::warn!("Ignoring malformed {}: {}", json_path.display(), e),
                },
                Err(e) => log::warn!("Failed to read {}: {}", json_path.display(), e),
            }
        }

        if toml_path.exists() {
            match std::fs::read_to_string(toml_path) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(file_config) => return file_config,
                    Err(e) => log::warn!("Ignoring malformed {}: {}", toml_path.display(), e),
                },
                Err(e) => log::warn!("Failed to read {}: {}", toml_path.display(), e),
            }
        }

        Config::default()
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(http_proxy) = lookup("HTTP_PROXY") {
            self.http_proxy = http_proxy;
        }
        if let Some(https_proxy) = lookup("HTTPS_PROXY") {
            self.https_proxy = https_proxy;
        }
        if let Some(api_key) = lookup("API_KEY") {
            self.api_key = Some(api_key);
        }
        if let Some(api_base) = lookup("API_BASE") {
            self.api_base = Some(api_base);
        }
        if let Some(model) = lookup("MODEL") {
            self.model = Some(model);
        }
        if let Some(label) = lookup("MODEL_LABEL") {
            self.model_label = Some(label);
        }
        if let Some(typewriter) = lookup("RELAY_TYPEWRITER") {
            if parse_bool_env(&typewriter) {
                if !self.flow.models.iter().any(|m| m == "*") {
                    self.flow.models.push("*".to_string());
                }
            } else {
                self.flow.models.clear();
            }
        }
    }

    pub fn identity_template(&self) -> &str {
        self.identity_template
            .as_deref()
            .unwrap_or(DEFAULT_IDENTITY_TEMPLATE)
    }
}
