use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::base::{ChunkStream, Transport};
use crate::endpoint::{Endpoint, EndpointCapabilities};
use crate::models::message::Message;
use crate::models::turn::AssistantResponse;

#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Stream {
        messages: Vec<Message>,
        return_traces: bool,
    },
    Call {
        messages: Vec<Message>,
        return_traces: bool,
    },
}

/// A transport that replays scripted chunks and records what it was asked to do
pub struct MockTransport {
    capabilities: Result<EndpointCapabilities, String>,
    chunks: Vec<Value>,
    fault_after: Option<(usize, String)>,
    open_error: Option<String>,
    fallback: Result<AssistantResponse, String>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl MockTransport {
    pub fn new(capabilities: EndpointCapabilities) -> Self {
        Self {
            capabilities: Ok(capabilities),
            chunks: Vec::new(),
            fault_after: None,
            open_error: None,
            fallback: Ok(AssistantResponse::default()),
            invocations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A transport whose endpoint cannot be probed
    pub fn unreachable(reason: &str) -> Self {
        Self {
            capabilities: Err(reason.to_string()),
            ..Self::new(EndpointCapabilities::default())
        }
    }

    pub fn with_chunks(mut self, chunks: Vec<Value>) -> Self {
        self.chunks = chunks;
        self
    }

    /// Raise a transport fault after `count` chunks have been delivered
    pub fn failing_after(mut self, count: usize, reason: &str) -> Self {
        self.fault_after = Some((count, reason.to_string()));
        self
    }

    pub fn failing_to_open(mut self, reason: &str) -> Self {
        self.open_error = Some(reason.to_string());
        self
    }

    pub fn with_fallback(mut self, response: AssistantResponse) -> Self {
        self.fallback = Ok(response);
        self
    }

    pub fn with_fallback_error(mut self, reason: &str) -> Self {
        self.fallback = Err(reason.to_string());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn probe(&self, _endpoint: &str) -> Result<EndpointCapabilities> {
        self.capabilities.clone().map_err(|e| anyhow!(e))
    }

    async fn stream(
        &self,
        _endpoint: &Endpoint,
        messages: &[Message],
        return_traces: bool,
    ) -> Result<ChunkStream> {
        self.invocations.lock().unwrap().push(Invocation::Stream {
            messages: messages.to_vec(),
            return_traces,
        });
        if let Some(reason) = &self.open_error {
            return Err(anyhow!(reason.clone()));
        }

        let mut items: Vec<Result<Value>> = match &self.fault_after {
            Some((count, _)) => self.chunks.iter().take(*count).cloned().map(Ok).collect(),
            None => self.chunks.iter().cloned().map(Ok).collect(),
        };
        if let Some((_, reason)) = &self.fault_after {
            items.push(Err(anyhow!(reason.clone())));
        }
        Ok(stream::iter(items).boxed())
    }

    async fn call(
        &self,
        _endpoint: &Endpoint,
        messages: &[Message],
        return_traces: bool,
    ) -> Result<AssistantResponse> {
        self.invocations.lock().unwrap().push(Invocation::Call {
            messages: messages.to_vec(),
            return_traces,
        });
        self.fallback.clone().map_err(|e| anyhow!(e))
    }
}
