//! Append-only conversation history.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::types::{Message, Role, ToolCall, ToolCallId};

/// Ordered, role-tagged messages carried across turns.
///
/// Messages are only ever appended. Tool results are checked against the
/// assistant message that requested them: a tool message must follow the
/// assistant message (or a sibling tool message) whose calls include its id,
/// and each id may be answered once.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript holding only the system prompt.
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// True if `earlier` is a prefix of this transcript.
    pub fn extends(&self, earlier: &Transcript) -> bool {
        self.messages.len() >= earlier.messages.len()
            && self.messages[..earlier.messages.len()] == earlier.messages[..]
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Append an assistant message, with or without tool calls.
    pub fn push_assistant(&mut self, content: impl Into<String>, tool_calls: Vec<ToolCall>) {
        let message = if tool_calls.is_empty() {
            Message::assistant(content)
        } else {
            Message::assistant_with_tools(content, tool_calls)
        };
        self.messages.push(message);
    }

    /// Append the result of `call`.
    ///
    /// Fails with a protocol error if `call` was not requested by the
    /// assistant message this result would answer, or was already answered.
    pub fn push_tool_result(&mut self, call: &ToolCall, content: impl Into<String>) -> Result<()> {
        let pending = self.pending_tool_calls()?;
        if !pending.contains(&call.id) {
            return Err(BridgeError::protocol(format!(
                "tool result for '{}' does not answer a pending tool call",
                call.id
            )));
        }

        self.messages.push(Message::tool(call, content));
        Ok(())
    }

    /// Ids requested by the trailing assistant message that have no result yet.
    fn pending_tool_calls(&self) -> Result<Vec<ToolCallId>> {
        let mut answered = Vec::new();

        for message in self.messages.iter().rev() {
            match message.role {
                Role::Tool => {
                    if let Some(id) = &message.tool_call_id {
                        answered.push(id.clone());
                    }
                }
                Role::Assistant if !message.tool_calls.is_empty() => {
                    return Ok(message
                        .tool_calls
                        .iter()
                        .map(|c| c.id.clone())
                        .filter(|id| !answered.contains(id))
                        .collect());
                }
                _ => break,
            }
        }

        Err(BridgeError::protocol(
            "tool result without a preceding assistant tool request",
        ))
    }
}
