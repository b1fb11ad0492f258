use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::role::Role;

pub const FUNCTION_TOOL_TYPE: &str = "function";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    /// Raw argument text; only guaranteed to be valid JSON once the message is finished
    #[serde(default, deserialize_with = "nullable_string")]
    pub arguments: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_tool_type")]
    pub kind: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn function<I, N, A>(id: I, name: N, arguments: A) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        A: Into<String>,
    {
        ToolCall {
            id: id.into(),
            kind: default_tool_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    /// Build a tool call from a finished wire object, defaulting missing fields
    pub fn from_value(value: &Value) -> Self {
        let function = value.get("function");
        ToolCall {
            id: string_field(value, "id").unwrap_or_default(),
            kind: string_field(value, "type").unwrap_or_else(default_tool_type),
            function: FunctionCall {
                name: function
                    .and_then(|f| string_field(f, "name"))
                    .unwrap_or_default(),
                arguments: function
                    .and_then(|f| string_field(f, "arguments"))
                    .unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A chat message exchanged with the serving endpoint
pub struct Message {
    pub role: Role,
    #[serde(default, deserialize_with = "nullable_string")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Message id assigned by chat-agent endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Message {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Message {
            role,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            id: None,
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Message::new(Role::User, content)
    }

    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Message::new(Role::Assistant, content)
    }

    /// Create the result message answering the tool call `call_id`
    pub fn tool<I: Into<String>, S: Into<String>>(call_id: I, output: S) -> Self {
        Message::new(Role::Tool, output).with_tool_call_id(call_id)
    }

    pub fn with_tool_call(mut self, tool_call: ToolCall) -> Self {
        self.tool_calls.get_or_insert_with(Vec::new).push(tool_call);
        self
    }

    pub fn with_tool_call_id<S: Into<String>>(mut self, call_id: S) -> Self {
        self.tool_call_id = Some(call_id.into());
        self
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }

    /// Convert a finished wire message, treating missing or null fields as empty
    pub fn from_value(value: &Value) -> Self {
        let tool_calls = value
            .get("tool_calls")
            .and_then(Value::as_array)
            .map(|calls| calls.iter().map(ToolCall::from_value).collect::<Vec<_>>())
            .filter(|calls| !calls.is_empty());

        Message {
            role: Role::from_wire(value.get("role").and_then(Value::as_str)),
            content: content_text(value.get("content")),
            tool_calls,
            tool_call_id: string_field(value, "tool_call_id"),
            id: string_field(value, "id"),
        }
    }
}

/// Flatten wire content into plain text.
///
/// Endpoints send either a string, null, or a list of parts such as
/// `{"type": "output_text", "text": "..."}`; the parts are concatenated in order.
pub fn content_text(content: Option<&Value>) -> String {
    match content {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                _ => part.get("text").and_then(Value::as_str),
            })
            .collect(),
        _ => String::new(),
    }
}

pub(crate) fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn default_tool_type() -> String {
    FUNCTION_TOOL_TYPE.to_string()
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
