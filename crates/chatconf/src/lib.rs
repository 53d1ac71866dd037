//! Configuration loading for mcpchat.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/mcpchat/config.toml` (system)
//! 2. `~/.config/mcpchat/config.toml` (user)
//! 3. `./mcpchat.toml` (local override) or the path given with `--config`
//! 4. Environment variables (`MCPCHAT_*`, plus `OPENAI_API_KEY` as a fallback key)
//!
//! Files are merged table by table, so a local file only needs the keys it changes.
//!
//! # Example Config
//!
//! ```toml
//! [llm]
//! base_url = "http://localhost:11434/v1"
//! model = "qwen2.5-coder:14b-instruct-q4_K_M"
//! max_tokens = 4096
//!
//! [server]
//! command = "uvx"
//! args = ["mcp-server-sqlite", "--db-path", "./test.db"]
//!
//! [agent]
//! exclude_tools = ["list_tables"]
//! on_tool_error = "abort"
//! verbose = false
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{AgentConfig, LlmConfig, ServerConfig, ToolErrorMode};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete mcpchat configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChatConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub agent: AgentConfig,
}

impl ChatConfig {
    /// Load configuration from all sources, with `config_path` taking the
    /// place of `./mcpchat.toml`, and report where values came from.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let files = loader::discover_config_files_with_override(config_path);
        let (mut config, mut sources) = Self::load_files(&files)?;

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// Merge the given files in order, without consulting the environment.
    pub fn load_files(files: &[PathBuf]) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut merged = toml::Table::new();

        for path in files {
            let table = loader::load_table(path)?;
            loader::merge_tables(&mut merged, table);
            sources.files.push(path.clone());
        }
        sources.file_api_key = merged
            .get("llm")
            .and_then(|llm| llm.get("api_key"))
            .is_some();

        let origin = files
            .last()
            .cloned()
            .unwrap_or_else(|| PathBuf::from("<defaults>"));
        let config = loader::from_table(merged, &origin)?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string. The API key is redacted unless it is
    /// the local placeholder.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# mcpchat configuration\n\n");

        output.push_str("[llm]\n");
        output.push_str(&format!("base_url = {}\n", quote(&self.llm.base_url)));
        let api_key = if self.llm.api_key == LlmConfig::PLACEHOLDER_API_KEY {
            self.llm.api_key.as_str()
        } else {
            "<redacted>"
        };
        output.push_str(&format!("api_key = {}\n", quote(api_key)));
        output.push_str(&format!("model = {}\n", quote(&self.llm.model)));
        output.push_str(&format!("max_tokens = {}\n", self.llm.max_tokens));
        output.push_str(&format!("temperature = {:?}\n", self.llm.temperature));

        output.push_str("\n[server]\n");
        output.push_str(&format!("command = {}\n", quote(&self.server.command)));
        output.push_str(&format!("args = {}\n", quote_list(&self.server.args)));

        if !self.server.env.is_empty() {
            output.push_str("\n[server.env]\n");
            for (key, value) in &self.server.env {
                output.push_str(&format!("{} = {}\n", quote(key), quote(value)));
            }
        }

        output.push_str("\n[agent]\n");
        output.push_str(&format!(
            "exclude_tools = {}\n",
            quote_list(&self.agent.exclude_tools)
        ));
        output.push_str(&format!(
            "on_tool_error = {}\n",
            quote(self.agent.on_tool_error.as_str())
        ));
        output.push_str(&format!("verbose = {}\n", self.agent.verbose));

        output
    }
}

fn quote(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

fn quote_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote(s)).collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.agent.on_tool_error, ToolErrorMode::Abort);
        assert!(!config.agent.verbose);
    }

    #[test]
    fn test_to_toml_round_trips_defaults() {
        let config = ChatConfig::default();
        let rendered = config.to_toml();
        assert!(rendered.contains("[llm]"));
        assert!(rendered.contains("[server]"));
        assert!(rendered.contains("[agent]"));

        let parsed = loader::parse_toml(&rendered, Path::new("rendered.toml")).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_to_toml_redacts_real_key() {
        let mut config = ChatConfig::default();
        config.llm.api_key = "sk-live-123".to_string();
        let rendered = config.to_toml();
        assert!(!rendered.contains("sk-live-123"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_to_toml_quotes_env_keys() {
        let mut config = ChatConfig::default();
        config.server.env.insert("odd.key name".to_string(), "1".to_string());
        config.server.env.insert("RUST_LOG".to_string(), "info".to_string());

        let rendered = config.to_toml();
        let parsed = loader::parse_toml(&rendered, Path::new("rendered.toml")).unwrap();
        assert_eq!(parsed.server.env, config.server.env);
    }

    #[test]
    fn test_load_files_empty_is_default() {
        let (config, sources) = ChatConfig::load_files(&[]).unwrap();
        assert_eq!(config, ChatConfig::default());
        assert!(sources.files.is_empty());
        assert!(!sources.file_api_key);
    }
}
