//! Bridges an OpenAI-compatible chat model to the tools of an MCP server.
//!
//! The server's operations become a [`ToolCatalog`]; [`run_turn`] drives one
//! user turn against a [`Transcript`], dispatching requested tool calls in
//! order and asking the model for a final answer once they have run.

pub mod agent_loop;
pub mod bridge;
pub mod catalog;
pub mod config;
pub mod error;
pub mod mcp_client;
pub mod prompt;
pub mod provider;
pub mod session;
pub mod transcript;
pub mod types;

pub use agent_loop::{run_turn, TurnState};
pub use bridge::{McpToolHandle, ToolInvoker};
pub use catalog::{build_catalog, OpenAiFunction, ToolCatalog, ToolDescriptor, ToolSchema, DEFAULT_EXCLUDED_TOOLS};
pub use config::{BackendConfig, ToolErrorPolicy, TurnConfig};
pub use error::{BridgeError, Result};
pub use mcp_client::{McpToolClient, ServerCommand, ToolInfo, ToolReply, ToolService};
pub use provider::{ChatCompletionResponse, CompletionBackend, FinishReason, GenerationConfig, OpenAiProvider};
pub use session::AgentSession;
pub use transcript::Transcript;
pub use types::*;
