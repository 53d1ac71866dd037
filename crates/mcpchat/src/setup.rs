//! Wiring from configuration to a live session.

use std::sync::Arc;

use anyhow::{Context, Result};
use chatconf::{ChatConfig, ToolErrorMode};
use llm_mcp_bridge::{
    build_catalog, AgentSession, BackendConfig, McpToolClient, OpenAiProvider, ServerCommand,
    ToolErrorPolicy, ToolService, TurnConfig,
};

pub fn backend_config(config: &ChatConfig) -> BackendConfig {
    BackendConfig::new(&config.llm.base_url, &config.llm.model).with_api_key(&config.llm.api_key)
}

pub fn turn_config(config: &ChatConfig) -> TurnConfig {
    TurnConfig {
        max_tokens: config.llm.max_tokens,
        temperature: config.llm.temperature,
        on_tool_error: match config.agent.on_tool_error {
            ToolErrorMode::Abort => ToolErrorPolicy::Abort,
            ToolErrorMode::Report => ToolErrorPolicy::ReportToModel,
        },
    }
}

pub fn server_command(config: &ChatConfig) -> ServerCommand {
    ServerCommand {
        program: config.server.command.clone(),
        args: config.server.args.clone(),
        env: config.server.env.clone(),
    }
}

/// A connected tool server and the session built on its catalog.
pub struct Chat {
    client: Arc<McpToolClient>,
    pub session: AgentSession,
}

impl Chat {
    /// Spawn the tool server, fetch its operations and build the session.
    pub async fn open(config: &ChatConfig) -> Result<Self> {
        let command = server_command(config);
        let client = Arc::new(McpToolClient::new(command.clone()));

        if let Err(err) = client.connect().await {
            return Err(err).with_context(|| format!("Failed to start `{}`", command.display()));
        }

        let operations = match client.list_tools().await {
            Ok(ops) => ops,
            Err(err) => {
                close_client(&client).await;
                return Err(err).context("Failed to list tools");
            }
        };

        let catalog = build_catalog(operations, client.clone(), &config.agent.exclude_tools);
        let provider = Arc::new(OpenAiProvider::new(&backend_config(config)));
        let session = AgentSession::new(provider, catalog, turn_config(config));

        Ok(Self { client, session })
    }

    /// Release the tool server.
    pub async fn close(self) {
        close_client(&self.client).await;
    }
}

async fn close_client(client: &McpToolClient) {
    if let Err(err) = client.shutdown().await {
        tracing::warn!(error = %err, "Tool server did not stop cleanly");
    }
}
