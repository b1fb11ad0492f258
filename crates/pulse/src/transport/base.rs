use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::endpoint::{Endpoint, EndpointCapabilities};
use crate::models::message::Message;
use crate::models::turn::AssistantResponse;

/// Raw protocol chunks in arrival order; the stream ends when the endpoint closes it
pub type ChunkStream = BoxStream<'static, Result<Value>>;

/// The calls the frontend needs from a model-serving endpoint
#[async_trait]
pub trait Transport: Send + Sync {
    /// Determine the protocol and feature set of the endpoint called `endpoint`
    async fn probe(&self, endpoint: &str) -> Result<EndpointCapabilities>;

    /// Start a streamed invocation
    async fn stream(
        &self,
        endpoint: &Endpoint,
        messages: &[Message],
        return_traces: bool,
    ) -> Result<ChunkStream>;

    /// Invoke without streaming and return the finished messages
    async fn call(
        &self,
        endpoint: &Endpoint,
        messages: &[Message],
        return_traces: bool,
    ) -> Result<AssistantResponse>;
}
