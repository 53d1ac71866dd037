use serde::{Deserialize, Serialize};

/// Unique identifier for an agent session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the completion service assigns to a tool call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ToolCallId(pub String);

impl std::fmt::Display for ToolCallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ToolCallId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Message role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool invocation requested by the model.
///
/// `arguments` is kept as the JSON text the model produced; it is parsed
/// only when the call is dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: ToolCallId,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: ToolCallId(id.into()),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the argument text into a JSON object. Empty text is `{}`.
    pub fn parse_arguments(&self) -> crate::Result<serde_json::Map<String, serde_json::Value>> {
        let invalid = |message: String| crate::BridgeError::InvalidArguments {
            name: self.name.clone(),
            message,
        };

        if self.arguments.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }

        match serde_json::from_str(&self.arguments).map_err(|e| invalid(e.to_string()))? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(invalid(format!("expected a JSON object, got {}", other))),
        }
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    /// Empty for assistant messages that only carry tool calls
    pub content: String,

    /// Tool calls from assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Tool call this message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<ToolCallId>,

    /// Tool that produced this result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    pub fn tool(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            name: Some(call.name.clone()),
            ..Self::plain(Role::Tool, content)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments_object() {
        let call = ToolCall::new("call_1", "add_row", r#"{"name": "X", "age": 3}"#);
        let args = call.parse_arguments().unwrap();
        assert_eq!(args.get("name"), Some(&serde_json::json!("X")));
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_parse_arguments_empty_is_empty_object() {
        let call = ToolCall::new("call_1", "list_tables", "  ");
        assert!(call.parse_arguments().unwrap().is_empty());
    }

    #[test]
    fn test_parse_arguments_rejects_non_object() {
        let call = ToolCall::new("call_1", "add_row", "[1, 2]");
        let err = call.parse_arguments().unwrap_err();
        assert!(matches!(err, crate::BridgeError::InvalidArguments { ref name, .. } if name == "add_row"));
    }

    #[test]
    fn test_parse_arguments_rejects_garbage() {
        let call = ToolCall::new("call_1", "add_row", "{name: X");
        assert!(call.parse_arguments().is_err());
    }

    #[test]
    fn test_tool_message_links_call() {
        let call = ToolCall::new("call_9", "read_query", "{}");
        let msg = Message::tool(&call, "[]");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id, Some(ToolCallId::from("call_9")));
        assert_eq!(msg.name.as_deref(), Some("read_query"));
    }

    #[test]
    fn test_message_serializes_role_lowercase() {
        let json = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(json["role"], "user");
        assert!(json.get("tool_calls").is_none());
    }
}
