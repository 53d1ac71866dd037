//! Normalizes the server's advertised operations into tools the model can call.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::bridge::{McpToolHandle, ToolInvoker};
use crate::error::{BridgeError, Result};
use crate::mcp_client::{ToolInfo, ToolService};

/// Tools skipped unless configured otherwise. The sqlite server's
/// `list_tables` advertises an input schema completion APIs reject.
pub const DEFAULT_EXCLUDED_TOOLS: &[&str] = &["list_tables"];

/// OpenAI function definition format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenAiFunction {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub parameters: Value,
}

/// `{"type": "function", "function": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSchema {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: OpenAiFunction,
}

impl ToolSchema {
    pub fn function(function: OpenAiFunction) -> Self {
        Self {
            kind: "function",
            function,
        }
    }
}

/// One callable entry in the catalog.
#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    invoker: Arc<dyn ToolInvoker>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        invoker: Arc<dyn ToolInvoker>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            invoker,
        }
    }

    pub fn invoker(&self) -> &Arc<dyn ToolInvoker> {
        &self.invoker
    }

    pub fn schema(&self) -> ToolSchema {
        ToolSchema::function(OpenAiFunction {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            parameters: self.parameters.clone(),
        })
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Name → tool mapping, iterated in the order the server advertised.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool. A name already present is left as it was and `false` is returned.
    pub fn insert(&mut self, tool: ToolDescriptor) -> bool {
        if self.index.contains_key(&tool.name) {
            return false;
        }
        self.index.insert(tool.name.clone(), self.tools.len());
        self.tools.push(tool);
        true
    }

    pub fn get(&self, name: &str) -> Result<&ToolDescriptor> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| BridgeError::UnknownTool(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Schema fragments for the completion request, or `None` when empty.
    pub fn schemas(&self) -> Option<Vec<ToolSchema>> {
        if self.tools.is_empty() {
            None
        } else {
            Some(self.tools.iter().map(ToolDescriptor::schema).collect())
        }
    }
}

/// Build the catalog from the server's operations.
///
/// Operations named in `excluded`, operations with an unusable input schema,
/// and repeated names are left out; none of these is an error.
pub fn build_catalog<S>(
    operations: Vec<ToolInfo>,
    service: Arc<dyn ToolService>,
    excluded: &[S],
) -> ToolCatalog
where
    S: AsRef<str>,
{
    let mut catalog = ToolCatalog::new();

    for op in operations {
        if excluded.iter().any(|name| name.as_ref() == op.name) {
            tracing::debug!(tool = %op.name, "Excluding denylisted tool");
            continue;
        }

        let parameters = match normalize_schema(&op.input_schema) {
            Ok(schema) => schema,
            Err(reason) => {
                tracing::debug!(tool = %op.name, %reason, "Excluding tool with malformed schema");
                continue;
            }
        };

        let invoker: Arc<dyn ToolInvoker> =
            Arc::new(McpToolHandle::new(op.name.clone(), Arc::clone(&service)));
        let descriptor = ToolDescriptor::new(
            op.name.clone(),
            op.description.unwrap_or_default(),
            parameters,
            invoker,
        );

        if !catalog.insert(descriptor) {
            tracing::warn!(tool = %op.name, "Server advertised tool twice, keeping the first");
        }
    }

    tracing::info!(tools = ?catalog.names(), "Tool catalog built");
    catalog
}

/// Accepts a JSON Schema describing an object. A missing `type` is filled in
/// as `"object"`; anything else is rejected.
fn normalize_schema(schema: &Value) -> std::result::Result<Value, String> {
    let Some(obj) = schema.as_object() else {
        return Err(format!("schema is not an object: {}", schema));
    };

    let mut obj = obj.clone();
    match obj.get("type") {
        None => {
            obj.insert("type".into(), Value::from("object"));
        }
        Some(Value::String(t)) if t == "object" => {}
        Some(other) => return Err(format!("schema type must be \"object\", got {}", other)),
    }

    if let Some(props) = obj.get("properties") {
        if !props.is_object() {
            return Err("schema properties is not an object".to_string());
        }
    }

    if let Some(required) = obj.get("required") {
        let valid = required
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string));
        if !valid {
            return Err("schema required is not a list of names".to_string());
        }
    }

    Ok(Value::Object(obj))
}
