//! mcpchat - terminal chat with an LLM that calls tools on an MCP server
//!
//! Subcommands:
//! - `mcpchat` / `mcpchat chat` - Interactive session
//! - `mcpchat ask <query>` - Run one turn and print the answer
//! - `mcpchat tools` - List the tools the model would be offered
//! - `mcpchat config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chatconf::ChatConfig;
use clap::{Parser, Subcommand};

mod commands;
mod repl;
mod setup;

#[derive(Parser)]
#[command(name = "mcpchat")]
#[command(about = "Chat with an LLM that can call tools on an MCP server")]
#[command(version)]
struct Cli {
    /// Config file, used in place of ./mcpchat.toml
    #[arg(short, long, global = true, env = "MCPCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log model input/output and tool input/output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Model identifier (overrides config)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Chat completions base URL (overrides config)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Chat,

    /// Run a single turn and print the answer
    Ask {
        /// What to ask
        query: String,
    },

    /// Connect to the tool server and list the catalog
    Tools {
        /// Print the tool schemas sent to the model
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration without connecting
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        if !path.exists() {
            bail!("config file not found: {}", path.display());
        }
    }

    let (mut config, sources) = ChatConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(model) = cli.model {
        config.llm.model = model;
    }
    if let Some(base_url) = cli.base_url {
        config.llm.base_url = base_url;
    }
    if cli.verbose {
        config.agent.verbose = true;
    }

    init_tracing(config.agent.verbose);

    for file in &sources.files {
        tracing::debug!(path = %file.display(), "Loaded config file");
    }
    if !sources.env_overrides.is_empty() {
        tracing::debug!(vars = ?sources.env_overrides, "Environment overrides applied");
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat(&config).await,
        Commands::Ask { query } => commands::ask(&config, &query).await,
        Commands::Tools { json } => commands::tools(&config, json).await,
        Commands::Config => {
            commands::show_config(&config, &sources);
            Ok(())
        }
    }
}

/// Logs go to stderr; stdout carries the conversation.
fn init_tracing(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let filter = if verbose {
        match "llm_mcp_bridge=debug".parse() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    } else {
        filter
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
