//! Protocol adapters turn the raw chunks of one endpoint wire format into render updates
//! and, once the stream is exhausted, into the finished [`AssistantResponse`].
//!
//! | protocol          | unit                    | messages                        |
//! |-------------------|-------------------------|---------------------------------|
//! | chat completions  | running text delta      | exactly one                     |
//! | chat agent        | delta keyed by msg id   | one per id, first-seen order    |
//! | responses         | typed, complete items   | one or more per item, appended  |
use anyhow::Result;
use serde_json::Value;

use crate::endpoint::TaskType;
use crate::models::message::Message;
use crate::models::turn::AssistantResponse;
use crate::transport::utils::request_id;

pub mod chat_agent;
pub mod chat_completions;
pub mod responses;

use chat_agent::ChatAgentAdapter;
use chat_completions::ChatCompletionsAdapter;
use responses::ResponsesAdapter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    /// Redraw the shared response area with these messages
    Response(Vec<Message>),
    /// Redraw the area dedicated to the `index`-th message of the stream
    Message { index: usize, message: Message },
}

/// One adapter per supported wire format
#[derive(Debug)]
pub enum ProtocolAdapter {
    ChatCompletions(ChatCompletionsAdapter),
    ChatAgent(ChatAgentAdapter),
    Responses(ResponsesAdapter),
}

impl ProtocolAdapter {
    pub fn for_task(task_type: TaskType) -> Self {
        match task_type {
            TaskType::ChatCompletions => {
                ProtocolAdapter::ChatCompletions(ChatCompletionsAdapter::new())
            }
            TaskType::ChatAgent => ProtocolAdapter::ChatAgent(ChatAgentAdapter::new()),
            TaskType::Responses => ProtocolAdapter::Responses(ResponsesAdapter::new()),
        }
    }

    pub fn task_type(&self) -> TaskType {
        match self {
            ProtocolAdapter::ChatCompletions(_) => TaskType::ChatCompletions,
            ProtocolAdapter::ChatAgent(_) => TaskType::ChatAgent,
            ProtocolAdapter::Responses(_) => TaskType::Responses,
        }
    }

    /// Consume the next raw chunk, returning what needs to be redrawn if anything
    pub fn ingest(&mut self, chunk: &Value) -> Result<Option<StreamUpdate>> {
        match self {
            ProtocolAdapter::ChatCompletions(adapter) => adapter.ingest(chunk),
            ProtocolAdapter::ChatAgent(adapter) => adapter.ingest(chunk),
            ProtocolAdapter::Responses(adapter) => adapter.ingest(chunk),
        }
    }

    pub fn finish(self) -> AssistantResponse {
        match self {
            ProtocolAdapter::ChatCompletions(adapter) => adapter.finish(),
            ProtocolAdapter::ChatAgent(adapter) => adapter.finish(),
            ProtocolAdapter::Responses(adapter) => adapter.finish(),
        }
    }
}

/// Keep the last non-empty request id seen on the stream
pub(crate) fn observe_request_id(current: &mut Option<String>, chunk: &Value) {
    if let Some(id) = request_id(chunk) {
        *current = Some(id.to_string());
    }
}
