use tracing::warn;

use crate::endpoint::{probe_endpoint, Endpoint};
use crate::errors::PulseResult;
use crate::history::History;
use crate::models::turn::{AssistantResponse, Turn};
use crate::orchestrator::StreamingOrchestrator;
use crate::render::Renderer;
use crate::transport::base::Transport;

/// A chat with one serving endpoint.
///
/// Owns the history; every submission resends the whole of it as request context.
pub struct ChatSession {
    transport: Box<dyn Transport>,
    endpoint: Endpoint,
    history: History,
}

impl ChatSession {
    /// Probe the endpoint and start an empty session
    pub async fn start(transport: Box<dyn Transport>, endpoint_name: &str) -> PulseResult<Self> {
        let endpoint = probe_endpoint(transport.as_ref(), endpoint_name).await?;
        Ok(Self::with_endpoint(transport, endpoint))
    }

    pub fn with_endpoint(transport: Box<dyn Transport>, endpoint: Endpoint) -> Self {
        Self {
            transport,
            endpoint,
            history: History::new(),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Send `prompt` and record the response.
    ///
    /// When the turn fails the user turn is rolled back, leaving the history exactly as
    /// it was before the call.
    pub async fn submit(
        &mut self,
        prompt: &str,
        renderer: &mut dyn Renderer,
    ) -> PulseResult<AssistantResponse> {
        let mark = self.history.len();
        self.history.append(Turn::user(prompt));
        let input = self.history.to_input_messages();

        let orchestrator = StreamingOrchestrator::new(self.transport.as_ref(), &self.endpoint);
        match orchestrator.respond(&input, renderer).await {
            Ok(response) => {
                self.history.append(Turn::Assistant(response.clone()));
                Ok(response)
            }
            Err(err) => {
                warn!(error = %err, "turn failed, discarding the user message");
                self.history.rollback_to(mark);
                Err(err)
            }
        }
    }

    /// Replay every turn through the renderer
    pub fn render_history(&self, renderer: &mut dyn Renderer) {
        for turn in self.history.turns() {
            turn.render(renderer);
        }
    }
}
