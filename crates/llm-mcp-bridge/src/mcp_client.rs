use std::collections::BTreeMap;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParam, CallToolResult};
use rmcp::service::RunningService;
use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::{BridgeError, Result};

/// An operation advertised by the tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// What the server sent back for one call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolReply {
    /// Text of each text content block, in order
    pub text: Vec<String>,
    pub is_error: bool,
}

impl ToolReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: vec![content.into()],
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            text: vec![content.into()],
            is_error: true,
        }
    }

    /// The first text block, which is where servers put the result.
    pub fn primary_text(&self) -> Option<&str> {
        self.text.first().map(String::as_str)
    }
}

/// The tool-execution service as the agent sees it.
#[async_trait]
pub trait ToolService: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolInfo>>;

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolReply>;
}

/// How to launch the server subprocess
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl ServerCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Command line for logs
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

type ClientService = RunningService<RoleClient, ()>;

/// MCP client speaking JSON-RPC over a child process's stdin/stdout.
///
/// The channel is acquired by [`connect`](Self::connect) and released by
/// [`shutdown`](Self::shutdown); calls outside that window fail with
/// [`BridgeError::NotConnected`].
pub struct McpToolClient {
    command: ServerCommand,
    service: RwLock<Option<ClientService>>,
}

impl McpToolClient {
    pub fn new(command: ServerCommand) -> Self {
        Self {
            command,
            service: RwLock::new(None),
        }
    }

    /// Spawn the server and complete the MCP handshake.
    #[tracing::instrument(skip(self), fields(mcp.command = %self.command.display()))]
    pub async fn connect(&self) -> Result<()> {
        let mut slot = self.service.write().await;
        if slot.is_some() {
            return Ok(());
        }

        let command = tokio::process::Command::new(&self.command.program).configure(|cmd| {
            cmd.args(&self.command.args)
                .envs(self.command.env.iter())
                .stderr(std::process::Stdio::inherit());
        });

        let transport = TokioChildProcess::new(command)
            .map_err(|e| BridgeError::Transport(format!("spawn tool server: {}", e)))?;

        let service = ()
            .serve(transport)
            .await
            .map_err(|e| BridgeError::Transport(format!("initialize tool server: {}", e)))?;

        if let Some(info) = service.peer_info() {
            tracing::info!(
                server.name = %info.server_info.name,
                server.version = %info.server_info.version,
                "Connected to MCP server"
            );
        }

        *slot = Some(service);
        Ok(())
    }

    pub async fn is_connected(&self) -> bool {
        self.service.read().await.is_some()
    }

    /// Stop the server. Safe to call when not connected.
    pub async fn shutdown(&self) -> Result<()> {
        let service = self.service.write().await.take();
        if let Some(service) = service {
            let reason = service
                .cancel()
                .await
                .map_err(|e| BridgeError::Transport(format!("stop tool server: {}", e)))?;
            tracing::info!(?reason, "MCP server stopped");
        }
        Ok(())
    }
}

#[async_trait]
impl ToolService for McpToolClient {
    #[tracing::instrument(skip(self))]
    async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or(BridgeError::NotConnected)?;

        let tools = service
            .list_all_tools()
            .await
            .map_err(|e| BridgeError::Transport(format!("tools/list: {}", e)))?;

        Ok(tools
            .into_iter()
            .map(|tool| ToolInfo {
                name: tool.name.to_string(),
                description: tool.description.as_deref().map(str::to_string),
                input_schema: Value::Object((*tool.input_schema).clone()),
            })
            .collect())
    }

    #[tracing::instrument(skip(self, arguments), fields(tool.name = %name))]
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<ToolReply> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or(BridgeError::NotConnected)?;

        let request = call_request(name, arguments)?;
        let result = service
            .call_tool(request)
            .await
            .map_err(|e| BridgeError::Transport(format!("tools/call {}: {}", name, e)))?;

        Ok(reply_from_result(&result))
    }
}

fn call_request(name: &str, arguments: Map<String, Value>) -> Result<CallToolRequestParam> {
    // Fields added by later protocol revisions stay defaulted
    serde_json::from_value(serde_json::json!({
        "name": name,
        "arguments": arguments,
    }))
    .map_err(|e| BridgeError::protocol(format!("build tools/call request: {}", e)))
}

fn reply_from_result(result: &CallToolResult) -> ToolReply {
    ToolReply {
        text: result
            .content
            .iter()
            .filter_map(|c| c.as_text().map(|t| t.text.clone()))
            .collect(),
        is_error: result.is_error.unwrap_or(false),
    }
}
