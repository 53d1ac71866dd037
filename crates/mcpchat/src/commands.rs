use anyhow::{Context, Result};
use chatconf::{ChatConfig, ConfigSources};
use llm_mcp_bridge::ToolCatalog;
use owo_colors::OwoColorize;

use crate::repl;
use crate::setup::Chat;

pub async fn chat(config: &ChatConfig) -> Result<()> {
    let chat = Chat::open(config).await?;
    let result = repl::run(&chat.session).await;
    chat.close().await;
    result
}

pub async fn ask(config: &ChatConfig, query: &str) -> Result<()> {
    let chat = Chat::open(config).await?;
    let result = chat.session.run_turn(query, None).await;
    chat.close().await;

    let (answer, _transcript) = result.context("Turn failed")?;
    println!("{}", answer);
    Ok(())
}

pub async fn tools(config: &ChatConfig, json: bool) -> Result<()> {
    let chat = Chat::open(config).await?;
    let output = render_catalog(&chat.session.catalog, json);
    chat.close().await;

    println!("{}", output?);
    Ok(())
}

fn render_catalog(catalog: &ToolCatalog, json: bool) -> Result<String> {
    if json {
        let schemas = catalog.schemas().unwrap_or_default();
        return serde_json::to_string_pretty(&schemas).context("Failed to render schemas");
    }

    if catalog.is_empty() {
        return Ok("No tools available".dimmed().to_string());
    }

    let mut lines = vec![format!("{} ({})", "Tools".bright_cyan().bold(), catalog.len())];
    for tool in catalog.iter() {
        lines.push(format!("  {} {}", tool.name.bright_green().bold(), tool.description.dimmed()));
    }
    Ok(lines.join("\n"))
}

pub fn show_config(config: &ChatConfig, sources: &ConfigSources) {
    if sources.files.is_empty() {
        println!("# no config files found, using defaults");
    }
    for file in &sources.files {
        println!("# loaded: {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# env: {}", var);
    }
    print!("{}", config.to_toml());
}
