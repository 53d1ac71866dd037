use thiserror::Error;

/// Failures a turn can end with.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A tool was invoked before the server channel was established, or after
    /// it was released.
    #[error("Not connected to MCP server")]
    NotConnected,

    /// The server channel failed underneath a request.
    #[error("MCP transport error: {0}")]
    Transport(String),

    /// A peer broke the conversation protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{name}': {message}")]
    InvalidArguments { name: String, message: String },

    /// The server ran the tool and reported failure.
    #[error("Tool '{name}' failed: {message}")]
    ToolInvocation { name: String, message: String },

    /// The completion service could not be reached or rejected the request.
    #[error("Completion request failed: {0}")]
    Completion(String),
}

impl BridgeError {
    pub fn protocol(message: impl Into<String>) -> Self {
        BridgeError::Protocol(message.into())
    }

    /// Errors after which the session cannot continue: the tool server channel
    /// is gone and nothing reconnects it.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, BridgeError::NotConnected | BridgeError::Transport(_))
    }

    /// Errors that belong to a single tool call and can be shown to the model
    /// as that call's result.
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::UnknownTool(_)
                | BridgeError::InvalidArguments { .. }
                | BridgeError::ToolInvocation { .. }
        )
    }
}

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
