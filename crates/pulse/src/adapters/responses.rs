use anyhow::Result;
use serde_json::Value;

use super::{observe_request_id, StreamUpdate};
use crate::errors::PulseError;
use crate::models::message::{content_text, string_field, Message, ToolCall};
use crate::models::turn::AssistantResponse;

/// Convert one complete responses item into the messages it stands for.
///
/// A `message` item yields one assistant message per non-empty `output_text` part, a
/// `function_call` item one assistant message carrying the call, and a
/// `function_call_output` item one tool message. Other item types yield nothing.
pub fn messages_from_item(item: &Value) -> Vec<Message> {
    match item.get("type").and_then(Value::as_str) {
        Some("message") => match item.get("content") {
            Some(Value::Array(parts)) => parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .filter(|text| !text.is_empty())
                .map(Message::assistant)
                .collect(),
            Some(Value::String(text)) if !text.is_empty() => vec![Message::assistant(text.as_str())],
            _ => Vec::new(),
        },
        Some("function_call") => vec![Message::assistant("").with_tool_call(ToolCall::function(
            string_field(item, "call_id").unwrap_or_default(),
            string_field(item, "name").unwrap_or_default(),
            string_field(item, "arguments").unwrap_or_default(),
        ))],
        Some("function_call_output") => {
            let output = match item.get("output") {
                Some(Value::String(_)) | Some(Value::Array(_)) | None => {
                    content_text(item.get("output"))
                }
                Some(Value::Null) => String::new(),
                Some(other) => other.to_string(),
            };
            vec![Message::tool(
                string_field(item, "call_id").unwrap_or_default(),
                output,
            )]
        }
        _ => Vec::new(),
    }
}

/// Appends the messages of every streamed item; items arrive already complete
#[derive(Debug, Default)]
pub struct ResponsesAdapter {
    messages: Vec<Message>,
    request_id: Option<String>,
}

impl ResponsesAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, chunk: &Value) -> Result<Option<StreamUpdate>> {
        observe_request_id(&mut self.request_id, chunk);

        match chunk.get("type") {
            None => return Ok(None),
            Some(Value::String(_)) => {}
            Some(other) => {
                return Err(
                    PulseError::MalformedChunk(format!("event type is not a string: {}", other))
                        .into(),
                )
            }
        }

        match chunk.get("item") {
            None | Some(Value::Null) => {}
            Some(item) if item.is_object() => self.messages.extend(messages_from_item(item)),
            Some(other) => {
                return Err(
                    PulseError::MalformedChunk(format!("event item is not an object: {}", other))
                        .into(),
                )
            }
        }

        if self.messages.is_empty() {
            return Ok(None);
        }
        Ok(Some(StreamUpdate::Response(self.messages.clone())))
    }

    pub fn finish(self) -> AssistantResponse {
        AssistantResponse::new(self.messages, self.request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item_event(item: Value) -> Value {
        json!({"type": "response.output_item.done", "item": item})
    }

    #[test]
    fn test_message_item_yields_one_message_per_text_part() {
        let messages = messages_from_item(&json!({
            "type": "message",
            "content": [
                {"type": "output_text", "text": "First"},
                {"type": "output_text", "text": ""},
                {"type": "refusal", "refusal": "no"},
                {"type": "output_text", "text": "Second"}
            ]
        }));
        assert_eq!(
            messages,
            vec![Message::assistant("First"), Message::assistant("Second")]
        );
    }

    #[test]
    fn test_function_call_output_with_structured_output() {
        let messages = messages_from_item(&json!({
            "type": "function_call_output",
            "call_id": "c1",
            "output": {"temperature": 21}
        }));
        assert_eq!(messages, vec![Message::tool("c1", "{\"temperature\":21}")]);
    }

    #[test]
    fn test_streams_items_in_order() -> Result<()> {
        let mut adapter = ResponsesAdapter::new();

        let first = adapter.ingest(&item_event(json!({
            "type": "function_call", "call_id": "c1", "name": "weather", "arguments": "{}"
        })))?;
        assert_eq!(
            first,
            Some(StreamUpdate::Response(vec![Message::assistant("")
                .with_tool_call(ToolCall::function("c1", "weather", "{}"))]))
        );

        adapter.ingest(&item_event(json!({
            "type": "function_call_output", "call_id": "c1", "output": "sunny"
        })))?;
        adapter.ingest(&json!({
            "type": "response.output_text.delta",
            "delta": "ignored",
            "databricks_output": {"databricks_request_id": "req-3"}
        }))?;
        let last = adapter.ingest(&item_event(json!({
            "type": "message",
            "content": [{"type": "output_text", "text": "It is sunny."}]
        })))?;

        match last {
            Some(StreamUpdate::Response(messages)) => assert_eq!(messages.len(), 3),
            other => panic!("unexpected update: {:?}", other),
        }

        let response = adapter.finish();
        assert_eq!(response.messages()[1], Message::tool("c1", "sunny"));
        assert_eq!(response.messages()[2], Message::assistant("It is sunny."));
        assert_eq!(response.request_id(), Some("req-3"));
        Ok(())
    }

    #[test]
    fn test_events_without_type_or_items_are_skipped() -> Result<()> {
        let mut adapter = ResponsesAdapter::new();
        assert_eq!(adapter.ingest(&json!({"item": {"type": "message"}}))?, None);
        assert_eq!(adapter.ingest(&json!({"type": "response.created"}))?, None);
        assert!(adapter.finish().messages().is_empty());
        Ok(())
    }

    #[test]
    fn test_non_object_item_is_malformed() {
        let mut adapter = ResponsesAdapter::new();
        let err = adapter
            .ingest(&json!({"type": "response.output_item.done", "item": "oops"}))
            .unwrap_err();
        assert!(err.to_string().starts_with("Malformed chunk"));
    }
}
