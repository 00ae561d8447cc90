//! Tool definitions and tool-call requests.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Definition of a capability the model may invoke.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name the model refers to.
    pub name: String,

    /// Natural-language description shown to the model.
    pub description: String,

    /// JSON Schema of the arguments object.
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    /// Create a tool spec.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Render into the function-calling wire format.
    pub fn to_wire_format(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// A model-issued request to invoke a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Backend-assigned call id, echoed back in the tool-result turn.
    pub id: String,

    /// Requested tool name.
    pub name: String,

    /// Raw JSON argument string, exactly as the model produced it.
    pub arguments: String,
}

impl ToolCallRequest {
    /// Create a tool call request.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the argument string into a JSON value.
    pub fn parsed_arguments(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.arguments)?)
    }
}
