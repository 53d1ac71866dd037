use serde::{Deserialize, Serialize};

/// An OpenAI-compatible completion backend
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Base URL for the OpenAI-compatible API
    pub base_url: String,

    /// API key (optional for local models)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model to request
    pub model: String,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// What happens to the turn when a tool call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorPolicy {
    /// The turn fails with the tool's error
    #[default]
    Abort,
    /// The error text is recorded as the tool result and the turn goes on
    ReportToModel,
}

/// Per-turn generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default)]
    pub on_tool_error: ToolErrorPolicy,
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            on_tool_error: ToolErrorPolicy::Abort,
        }
    }
}
