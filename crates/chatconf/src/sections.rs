//! Configuration sections: completion backend, tool server, agent behaviour.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OpenAI-compatible completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the chat completions API.
    /// Default: http://localhost:11434/v1 (local Ollama)
    #[serde(default = "LlmConfig::default_base_url")]
    pub base_url: String,

    /// API key. Local servers accept any placeholder.
    /// Default: ollama
    #[serde(default = "LlmConfig::default_api_key")]
    pub api_key: String,

    /// Model identifier sent with every request.
    #[serde(default = "LlmConfig::default_model")]
    pub model: String,

    /// Token ceiling for each completion.
    /// Default: 4096
    #[serde(default = "LlmConfig::default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature.
    /// Default: 0.0
    #[serde(default)]
    pub temperature: f32,
}

impl LlmConfig {
    pub const PLACEHOLDER_API_KEY: &'static str = "ollama";

    fn default_base_url() -> String {
        "http://localhost:11434/v1".to_string()
    }

    fn default_api_key() -> String {
        Self::PLACEHOLDER_API_KEY.to_string()
    }

    fn default_model() -> String {
        "qwen2.5-coder:14b-instruct-q4_K_M".to_string()
    }

    fn default_max_tokens() -> u32 {
        4096
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: Self::default_api_key(),
            model: Self::default_model(),
            max_tokens: Self::default_max_tokens(),
            temperature: 0.0,
        }
    }
}

/// How to spawn the MCP tool server subprocess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Executable to launch.
    /// Default: docker
    #[serde(default = "ServerConfig::default_command")]
    pub command: String,

    /// Arguments passed to `command`.
    /// Default: the mcp/sqlite image with a named volume for the database.
    #[serde(default = "ServerConfig::default_args")]
    pub args: Vec<String>,

    /// Extra environment for the subprocess.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl ServerConfig {
    fn default_command() -> String {
        "docker".to_string()
    }

    fn default_args() -> Vec<String> {
        [
            "run",
            "--rm",
            "-i",
            "-v",
            "mcp-test:/mcp",
            "mcp/sqlite",
            "--db-path",
            "/mcp/test.db",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: Self::default_command(),
            args: Self::default_args(),
            env: BTreeMap::new(),
        }
    }
}

/// What a turn does when a tool invocation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolErrorMode {
    /// The turn fails and the error is reported to the user.
    #[default]
    Abort,
    /// The error text becomes the tool result and the model answers anyway.
    Report,
}

impl ToolErrorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolErrorMode::Abort => "abort",
            ToolErrorMode::Report => "report",
        }
    }
}

impl std::str::FromStr for ToolErrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(ToolErrorMode::Abort),
            "report" => Ok(ToolErrorMode::Report),
            other => Err(format!("unknown tool error mode: {}", other)),
        }
    }
}

/// Agent loop behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Server operations never offered to the model. `list_tables` from the
    /// sqlite server advertises a schema the completion API rejects.
    #[serde(default = "AgentConfig::default_exclude_tools")]
    pub exclude_tools: Vec<String>,

    #[serde(default)]
    pub on_tool_error: ToolErrorMode,

    /// Echo tool calls, tool results and model traffic to the log.
    #[serde(default)]
    pub verbose: bool,
}

impl AgentConfig {
    fn default_exclude_tools() -> Vec<String> {
        vec!["list_tables".to_string()]
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            exclude_tools: Self::default_exclude_tools(),
            on_tool_error: ToolErrorMode::default(),
            verbose: false,
        }
    }
}
