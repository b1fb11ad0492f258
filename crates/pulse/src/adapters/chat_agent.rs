use std::collections::HashMap;

use anyhow::Result;
use serde_json::Value;

use super::{observe_request_id, StreamUpdate};
use crate::accumulator::{MessageBuilder, MessageFragment};
use crate::errors::PulseError;
use crate::models::turn::AssistantResponse;

/// Keeps one builder per message id, in the order the ids were first seen
#[derive(Debug, Default)]
pub struct ChatAgentAdapter {
    buffers: Vec<MessageBuilder>,
    positions: HashMap<String, usize>,
    request_id: Option<String>,
}

impl ChatAgentAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, chunk: &Value) -> Result<Option<StreamUpdate>> {
        let delta = chunk
            .get("delta")
            .filter(|delta| delta.is_object())
            .ok_or_else(|| {
                PulseError::MalformedChunk("chat agent chunk without a delta object".to_string())
            })?;
        observe_request_id(&mut self.request_id, chunk);

        let fragment = MessageFragment::from_delta(delta);
        let key = fragment.id.clone().unwrap_or_default();
        let buffers = &mut self.buffers;
        let index = *self.positions.entry(key).or_insert_with(|| {
            buffers.push(MessageBuilder::new());
            buffers.len() - 1
        });

        let buffer = &mut self.buffers[index];
        buffer.push(&fragment);
        Ok(Some(StreamUpdate::Message {
            index,
            message: buffer.snapshot(),
        }))
    }

    pub fn finish(self) -> AssistantResponse {
        let messages = self
            .buffers
            .into_iter()
            .map(MessageBuilder::finish)
            .collect();
        AssistantResponse::new(messages, self.request_id)
    }
}
