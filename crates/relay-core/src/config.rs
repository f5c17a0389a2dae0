use chat_core::{Budget, Config, FallbackConfig, FlowConfig};

/// Per-conversation settings, usually taken from the loaded [`Config`].
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    pub budget: Budget,
    pub flow: FlowConfig,
    pub fallback: FallbackConfig,
    pub temperature: Option<f32>,
    pub search_mode: Option<String>,
    /// Identity prompt template with a `{model}` placeholder
    pub identity_template: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            budget: Budget::default(),
            flow: FlowConfig::default(),
            fallback: FallbackConfig::default(),
            temperature: None,
            search_mode: None,
            identity_template: chat_core::config::DEFAULT_IDENTITY_TEMPLATE.to_string(),
        }
    }
}

impl From<&Config> for ConversationConfig {
    fn from(config: &Config) -> Self {
        Self {
            budget: config.budget.clone(),
            flow: config.flow.clone(),
            fallback: config.fallback.clone(),
            temperature: config.temperature,
            search_mode: config.search_mode.clone(),
            identity_template: config.identity_template().to_string(),
        }
    }
}
