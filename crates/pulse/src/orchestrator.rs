use futures::StreamExt;
use tracing::{debug, warn};

use crate::adapters::{ProtocolAdapter, StreamUpdate};
use crate::endpoint::Endpoint;
use crate::errors::{PulseError, PulseResult};
use crate::models::message::Message;
use crate::models::turn::AssistantResponse;
use crate::render::{AreaContent, AreaId, Renderer};
use crate::transport::base::Transport;

pub const THINKING_NOTICE: &str = "Thinking...";
pub const RETRY_NOTICE: &str = "Ran into an error. Retrying without streaming...";

/// Result of the streaming attempt of a turn
#[derive(Debug)]
pub enum StreamOutcome {
    Completed(AssistantResponse),
    Faulted(anyhow::Error),
}

/// Areas drawn while a response streams in
struct LiveDisplay {
    response_area: AreaId,
    message_areas: Vec<AreaId>,
    showing_notice: bool,
}

impl LiveDisplay {
    fn open(renderer: &mut dyn Renderer) -> Self {
        let response_area = renderer.allocate_placeholder();
        renderer.replace(response_area, AreaContent::Notice(THINKING_NOTICE));
        LiveDisplay {
            response_area,
            message_areas: Vec::new(),
            showing_notice: true,
        }
    }

    fn apply(&mut self, renderer: &mut dyn Renderer, update: StreamUpdate) {
        match update {
            StreamUpdate::Response(messages) => {
                renderer.replace(self.response_area, AreaContent::Messages(&messages));
            }
            StreamUpdate::Message { index, message } => {
                if self.showing_notice {
                    renderer.clear(self.response_area);
                }
                while self.message_areas.len() <= index {
                    self.message_areas.push(renderer.allocate_placeholder());
                }
                renderer.replace(
                    self.message_areas[index],
                    AreaContent::Messages(std::slice::from_ref(&message)),
                );
            }
        }
        self.showing_notice = false;
    }

    fn close(&mut self, renderer: &mut dyn Renderer) {
        if self.showing_notice {
            renderer.clear(self.response_area);
            self.showing_notice = false;
        }
    }

    /// Drop every partial message and show the retry notice in their place
    fn reset_for_retry(&mut self, renderer: &mut dyn Renderer) {
        for area in self.message_areas.drain(..) {
            renderer.clear(area);
        }
        renderer.replace(self.response_area, AreaContent::Notice(RETRY_NOTICE));
        self.showing_notice = true;
    }

    fn show_final(&mut self, renderer: &mut dyn Renderer, messages: &[Message]) {
        renderer.replace(self.response_area, AreaContent::Messages(messages));
        self.showing_notice = false;
    }
}

/// Runs one turn against the endpoint: stream with the matching adapter, and on any
/// fault retry once without streaming.
pub struct StreamingOrchestrator<'a> {
    transport: &'a dyn Transport,
    endpoint: &'a Endpoint,
}

impl<'a> StreamingOrchestrator<'a> {
    pub fn new(transport: &'a dyn Transport, endpoint: &'a Endpoint) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    pub async fn respond(
        &self,
        input: &[Message],
        renderer: &mut dyn Renderer,
    ) -> PulseResult<AssistantResponse> {
        let mut display = LiveDisplay::open(renderer);
        let adapter = ProtocolAdapter::for_task(self.endpoint.task_type());
        debug!(
            endpoint = %self.endpoint.name,
            task_type = %adapter.task_type(),
            messages = input.len(),
            "dispatching streamed request"
        );

        match self.stream(adapter, input, renderer, &mut display).await {
            StreamOutcome::Completed(response) => {
                display.close(renderer);
                Ok(response)
            }
            StreamOutcome::Faulted(err) => {
                warn!(error = %err, "streaming failed, retrying without streaming");
                self.fallback(input, renderer, &mut display).await
            }
        }
    }

    /// Drive `adapter` over the chunk stream until it ends or faults
    async fn stream(
        &self,
        mut adapter: ProtocolAdapter,
        input: &[Message],
        renderer: &mut dyn Renderer,
        display: &mut LiveDisplay,
    ) -> StreamOutcome {
        let mut chunks = match self
            .transport
            .stream(self.endpoint, input, self.endpoint.return_traces())
            .await
        {
            Ok(chunks) => chunks,
            Err(err) => return StreamOutcome::Faulted(err),
        };

        let mut received = 0usize;
        while let Some(chunk) = chunks.next().await {
            let update = chunk.and_then(|chunk| adapter.ingest(&chunk));
            match update {
                Ok(Some(update)) => display.apply(renderer, update),
                Ok(None) => {}
                Err(err) => return StreamOutcome::Faulted(err),
            }
            received += 1;
        }

        debug!(chunks = received, "stream completed");
        StreamOutcome::Completed(adapter.finish())
    }

    async fn fallback(
        &self,
        input: &[Message],
        renderer: &mut dyn Renderer,
        display: &mut LiveDisplay,
    ) -> PulseResult<AssistantResponse> {
        display.reset_for_retry(renderer);

        match self
            .transport
            .call(self.endpoint, input, self.endpoint.return_traces())
            .await
        {
            Ok(response) => {
                display.show_final(renderer, response.messages());
                Ok(response)
            }
            Err(err) => {
                display.close(renderer);
                Err(PulseError::Fallback(err.to_string()))
            }
        }
    }
}
