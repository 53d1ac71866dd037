//! Loading and merging config files from disk.

use chatconf::loader::apply_overrides_from;
use chatconf::{ChatConfig, ConfigError, ToolErrorMode};
use std::io::Write;
use std::path::PathBuf;

fn write_config(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn later_files_override_earlier_ones() {
    let dir = tempfile::tempdir().unwrap();
    let user = write_config(
        &dir,
        "user.toml",
        r#"
[llm]
model = "user-model"
max_tokens = 2048

[agent]
exclude_tools = ["list_tables", "drop_table"]
"#,
    );
    let local = write_config(
        &dir,
        "local.toml",
        r#"
[llm]
model = "local-model"

[agent]
on_tool_error = "report"
"#,
    );

    let (config, sources) = ChatConfig::load_files(&[user.clone(), local.clone()]).unwrap();

    assert_eq!(config.llm.model, "local-model");
    assert_eq!(config.llm.max_tokens, 2048);
    assert_eq!(config.agent.exclude_tools, vec!["list_tables", "drop_table"]);
    assert_eq!(config.agent.on_tool_error, ToolErrorMode::Report);
    assert_eq!(sources.files, vec![user, local]);
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = ChatConfig::load_files(&[missing]).unwrap_err();
    assert!(matches!(err, ConfigError::FileRead { .. }));
}

#[test]
fn malformed_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write_config(&dir, "bad.toml", "[llm\nmodel = ");

    let err = ChatConfig::load_files(&[bad]).unwrap_err();
    assert!(err.to_string().contains("bad.toml"));
}

#[test]
fn file_key_is_not_replaced_by_ambient_openai_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "other.toml",
        r#"
[llm]
base_url = "https://other.example/v1"
api_key = "sk-file"
"#,
    );

    let (mut config, mut sources) = ChatConfig::load_files(&[path]).unwrap();
    assert!(sources.file_api_key);

    apply_overrides_from(
        &mut config,
        &mut sources,
        vec![("OPENAI_API_KEY".to_string(), "sk-openai-ambient".to_string())],
    );
    assert_eq!(config.llm.api_key, "sk-file");
}

#[test]
fn ambient_openai_key_fills_in_when_no_file_sets_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "model.toml", "[llm]\nmodel = \"gpt-4o-mini\"\n");

    let (mut config, mut sources) = ChatConfig::load_files(&[path]).unwrap();
    assert!(!sources.file_api_key);

    apply_overrides_from(
        &mut config,
        &mut sources,
        vec![("OPENAI_API_KEY".to_string(), "sk-env".to_string())],
    );
    assert_eq!(config.llm.api_key, "sk-env");
}
