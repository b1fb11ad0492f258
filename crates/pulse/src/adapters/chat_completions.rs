use anyhow::Result;
use serde_json::Value;

use super::{observe_request_id, StreamUpdate};
use crate::accumulator::{MessageBuilder, MessageFragment};
use crate::models::turn::AssistantResponse;

/// Accumulates `choices[0].delta.content` into a single assistant message.
///
/// Tool-call deltas on this protocol are not modeled.
#[derive(Debug, Default)]
pub struct ChatCompletionsAdapter {
    message: MessageBuilder,
    request_id: Option<String>,
}

impl ChatCompletionsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, chunk: &Value) -> Result<Option<StreamUpdate>> {
        observe_request_id(&mut self.request_id, chunk);

        let content = chunk
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if content.is_empty() {
            return Ok(None);
        }

        self.message.push(&MessageFragment::text(content));
        Ok(Some(StreamUpdate::Response(vec![self.message.snapshot()])))
    }

    pub fn finish(self) -> AssistantResponse {
        AssistantResponse::new(vec![self.message.finish()], self.request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use serde_json::json;

    fn delta(content: &str) -> Value {
        json!({"choices": [{"delta": {"content": content}}]})
    }

    #[test]
    fn test_accumulates_running_text() -> Result<()> {
        let mut adapter = ChatCompletionsAdapter::new();

        adapter.ingest(&delta("The "))?;
        let update = adapter.ingest(&delta("answer "))?;
        assert_eq!(
            update,
            Some(StreamUpdate::Response(vec![Message::assistant("The answer ")]))
        );
        adapter.ingest(&delta("is 42."))?;

        let response = adapter.finish();
        assert_eq!(response.messages(), &[Message::assistant("The answer is 42.")]);
        Ok(())
    }

    #[test]
    fn test_chunks_without_content_are_tolerated() -> Result<()> {
        let mut adapter = ChatCompletionsAdapter::new();

        assert_eq!(adapter.ingest(&json!({}))?, None);
        assert_eq!(adapter.ingest(&json!({"choices": []}))?, None);
        assert_eq!(adapter.ingest(&json!({"choices": [{"delta": {"role": "assistant"}}]}))?, None);
        assert_eq!(
            adapter.ingest(&json!({"choices": [{"delta": {"content": null}}]}))?,
            None
        );
        let with_tools = json!({"choices": [{"delta": {"tool_calls": [{"id": "c1"}]}}]});
        assert_eq!(adapter.ingest(&with_tools)?, None);

        assert_eq!(adapter.finish().messages(), &[Message::assistant("")]);
        Ok(())
    }

    #[test]
    fn test_request_id_from_last_chunk_carrying_one() -> Result<()> {
        let mut adapter = ChatCompletionsAdapter::new();
        adapter.ingest(&json!({
            "choices": [{"delta": {"content": "a"}}],
            "databricks_output": {"databricks_request_id": "first"}
        }))?;
        adapter.ingest(&json!({
            "choices": [],
            "databricks_output": {"databricks_request_id": "last"}
        }))?;
        adapter.ingest(&delta("b"))?;

        assert_eq!(adapter.finish().request_id(), Some("last"));
        Ok(())
    }
}
