//! One server operation wrapped as an invocable unit.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};
use crate::mcp_client::ToolService;

/// Something the agent can call by name with keyword arguments.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn invoke(&self, arguments: Map<String, Value>) -> Result<String>;
}

/// Binds an operation name to the session's tool service.
pub struct McpToolHandle {
    name: String,
    service: Arc<dyn ToolService>,
}

impl McpToolHandle {
    pub fn new(name: impl Into<String>, service: Arc<dyn ToolService>) -> Self {
        Self {
            name: name.into(),
            service,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl ToolInvoker for McpToolHandle {
    #[tracing::instrument(skip(self, arguments), fields(tool.name = %self.name))]
    async fn invoke(&self, arguments: Map<String, Value>) -> Result<String> {
        tracing::debug!(
            input = %serde_json::to_string_pretty(&arguments).unwrap_or_default(),
            "tool input"
        );

        let reply = self.service.call_tool(&self.name, arguments).await?;

        if reply.is_error {
            return Err(BridgeError::ToolInvocation {
                name: self.name.clone(),
                message: reply.primary_text().unwrap_or_default().to_string(),
            });
        }

        let text = reply.primary_text().ok_or_else(|| {
            BridgeError::protocol(format!("tool '{}' returned no text content", self.name))
        })?;

        tracing::debug!(output = %text, "tool output");
        Ok(text.to_string())
    }
}
