//! Config file discovery, loading, and environment variable overlay.

use crate::{ChatConfig, ConfigError};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
    /// A loaded file set `llm.api_key`
    pub file_api_key: bool,
}

/// Discover config files in load order (system, user, local). Only files
/// that exist are returned.
///
/// If `cli_path` is provided and exists, it replaces the local override.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/mcpchat/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("mcpchat/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("mcpchat.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Read a config file as a raw TOML table.
pub fn load_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_table(&contents, path)
}

fn parse_table(contents: &str, path: &Path) -> Result<toml::Table, ConfigError> {
    contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse a single TOML document into a config, filling defaults.
pub fn parse_toml(contents: &str, path: &Path) -> Result<ChatConfig, ConfigError> {
    let table = parse_table(contents, path)?;
    from_table(table, path)
}

/// Deserialize a merged table into a config.
pub fn from_table(table: toml::Table, path: &Path) -> Result<ChatConfig, ConfigError> {
    toml::Value::Table(table)
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Merge `overlay` into `base`. Nested tables merge key by key; any other
/// value in `overlay` replaces the one in `base`.
pub fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Apply `MCPCHAT_*` environment variables from the process environment.
pub fn apply_env_overrides(config: &mut ChatConfig, sources: &mut ConfigSources) {
    apply_overrides_from(config, sources, env::vars());
}

/// Apply overrides from an explicit set of variables.
///
/// Unparseable numeric or boolean values are ignored.
pub fn apply_overrides_from<I>(config: &mut ChatConfig, sources: &mut ConfigSources, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    // OPENAI_API_KEY only fills in a key nothing else set
    let mut explicit_key = false;
    let mut fallback_key = None;

    for (key, value) in vars {
        let applied = match key.as_str() {
            "MCPCHAT_BASE_URL" => {
                config.llm.base_url = value;
                true
            }
            "MCPCHAT_API_KEY" => {
                config.llm.api_key = value;
                explicit_key = true;
                true
            }
            "OPENAI_API_KEY" => {
                fallback_key = Some(value);
                false
            }
            "MCPCHAT_MODEL" => {
                config.llm.model = value;
                true
            }
            "MCPCHAT_MAX_TOKENS" => value
                .parse()
                .map(|v| config.llm.max_tokens = v)
                .is_ok(),
            "MCPCHAT_TEMPERATURE" => value
                .parse()
                .map(|v| config.llm.temperature = v)
                .is_ok(),
            "MCPCHAT_SERVER_COMMAND" => {
                config.server.command = value;
                true
            }
            "MCPCHAT_ON_TOOL_ERROR" => value
                .parse()
                .map(|v| config.agent.on_tool_error = v)
                .is_ok(),
            "MCPCHAT_VERBOSE" => parse_bool(&value)
                .map(|v| config.agent.verbose = v)
                .is_some(),
            _ => false,
        };

        if applied {
            sources.env_overrides.push(key);
        }
    }

    if let Some(key) = fallback_key {
        if !explicit_key && !sources.file_api_key {
            config.llm.api_key = key;
            sources.env_overrides.push("OPENAI_API_KEY".to_string());
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolErrorMode;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cli_path_replaces_local_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "").unwrap();

        let files = discover_config_files_with_override(Some(&path));
        assert_eq!(files.last(), Some(&path));
        assert!(!files.iter().any(|f| f == Path::new("mcpchat.toml")));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml = r#"
[llm]
model = "llama3.1:8b"
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();
        assert_eq!(config.llm.model, "llama3.1:8b");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.server.command, "docker");
        assert_eq!(config.agent.exclude_tools, vec!["list_tables".to_string()]);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[llm]
base_url = "https://api.example.com/v1"
api_key = "sk-test"
model = "gpt-4o-mini"
max_tokens = 1024
temperature = 0.5

[server]
command = "uvx"
args = ["mcp-server-sqlite", "--db-path", "/tmp/test.db"]

[server.env]
LOG_LEVEL = "warn"

[agent]
exclude_tools = []
on_tool_error = "report"
verbose = true
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();

        assert_eq!(config.llm.base_url, "https://api.example.com/v1");
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.llm.temperature, 0.5);
        assert_eq!(config.server.command, "uvx");
        assert_eq!(config.server.args.len(), 3);
        assert_eq!(config.server.env.get("LOG_LEVEL"), Some(&"warn".to_string()));
        assert!(config.agent.exclude_tools.is_empty());
        assert_eq!(config.agent.on_tool_error, ToolErrorMode::Report);
        assert!(config.agent.verbose);
    }

    #[test]
    fn test_parse_rejects_bad_policy() {
        let toml = r#"
[agent]
on_tool_error = "retry"
"#;
        let err = parse_toml(toml, Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_merge_tables_nested() {
        let mut base: toml::Table = r#"
[llm]
model = "a"
max_tokens = 100

[server]
command = "docker"
"#
        .parse()
        .unwrap();
        let overlay: toml::Table = r#"
[llm]
model = "b"
"#
        .parse()
        .unwrap();

        merge_tables(&mut base, overlay);
        let config = from_table(base, Path::new("merged")).unwrap();
        assert_eq!(config.llm.model, "b");
        assert_eq!(config.llm.max_tokens, 100);
        assert_eq!(config.server.command, "docker");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ChatConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(
            &mut config,
            &mut sources,
            vars(&[
                ("MCPCHAT_MODEL", "mistral"),
                ("MCPCHAT_MAX_TOKENS", "512"),
                ("MCPCHAT_VERBOSE", "yes"),
                ("MCPCHAT_ON_TOOL_ERROR", "report"),
                ("HOME", "/root"),
            ]),
        );

        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.llm.max_tokens, 512);
        assert!(config.agent.verbose);
        assert_eq!(config.agent.on_tool_error, ToolErrorMode::Report);
        assert_eq!(sources.env_overrides.len(), 4);
    }

    #[test]
    fn test_env_override_ignores_garbage() {
        let mut config = ChatConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(
            &mut config,
            &mut sources,
            vars(&[("MCPCHAT_MAX_TOKENS", "lots"), ("MCPCHAT_VERBOSE", "maybe")]),
        );

        assert_eq!(config.llm.max_tokens, 4096);
        assert!(!config.agent.verbose);
        assert!(sources.env_overrides.is_empty());
    }

    #[test]
    fn test_explicit_api_key_beats_openai_fallback() {
        let mut config = ChatConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(
            &mut config,
            &mut sources,
            vars(&[("MCPCHAT_API_KEY", "mine"), ("OPENAI_API_KEY", "theirs")]),
        );
        assert_eq!(config.llm.api_key, "mine");
        assert!(!sources.env_overrides.contains(&"OPENAI_API_KEY".to_string()));
    }

    #[test]
    fn test_openai_key_fills_unset_key() {
        let mut config = ChatConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_from(&mut config, &mut sources, vars(&[("OPENAI_API_KEY", "sk-env")]));
        assert_eq!(config.llm.api_key, "sk-env");
        assert_eq!(sources.env_overrides, vec!["OPENAI_API_KEY".to_string()]);
    }

    #[test]
    fn test_file_key_beats_openai_fallback() {
        let toml = r#"
[llm]
base_url = "https://other.example/v1"
api_key = "sk-file"
"#;
        let mut config = parse_toml(toml, Path::new("other.toml")).unwrap();
        let mut sources = ConfigSources {
            file_api_key: true,
            ..ConfigSources::default()
        };
        apply_overrides_from(
            &mut config,
            &mut sources,
            vars(&[("OPENAI_API_KEY", "sk-openai-ambient")]),
        );

        assert_eq!(config.llm.api_key, "sk-file");
        assert!(sources.env_overrides.is_empty());
    }
}
