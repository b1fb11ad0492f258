use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use tracing::{info, warn};

use crate::errors::{PulseError, PulseResult};
use crate::transport::base::Transport;

/// The response protocol a serving endpoint implements
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum TaskType {
    #[default]
    #[serde(rename = "chat/completions")]
    #[strum(
        to_string = "chat/completions",
        serialize = "llm/v1/chat",
        serialize = "agent/v1/chat"
    )]
    ChatCompletions,
    #[serde(rename = "agent/v1/responses")]
    #[strum(to_string = "agent/v1/responses")]
    Responses,
    #[serde(rename = "agent/v2/chat")]
    #[strum(to_string = "agent/v2/chat")]
    ChatAgent,
}

impl TaskType {
    /// Map the endpoint's `task` field; missing or unknown tasks speak chat completions
    pub fn from_task(task: Option<&str>) -> Self {
        match task {
            Some(task) => task.parse().unwrap_or_else(|_| {
                warn!(task, "unknown endpoint task type, assuming chat completions");
                TaskType::ChatCompletions
            }),
            None => TaskType::ChatCompletions,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EndpointCapabilities {
    pub supports_feedback: bool,
    pub task_type: TaskType,
}

/// A probed serving endpoint; its capabilities stay fixed for the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub capabilities: EndpointCapabilities,
}

impl Endpoint {
    pub fn new<S: Into<String>>(name: S, capabilities: EndpointCapabilities) -> Self {
        Endpoint {
            name: name.into(),
            capabilities,
        }
    }

    pub fn task_type(&self) -> TaskType {
        self.capabilities.task_type
    }

    /// Traces are requested exactly when the endpoint accepts feedback
    pub fn return_traces(&self) -> bool {
        self.capabilities.supports_feedback
    }
}

/// Probe `name` once; failing to reach it means the session cannot start
pub async fn probe_endpoint(transport: &dyn Transport, name: &str) -> PulseResult<Endpoint> {
    let capabilities = transport
        .probe(name)
        .await
        .map_err(|e| PulseError::Probe {
            endpoint: name.to_string(),
            reason: e.to_string(),
        })?;

    info!(
        endpoint = name,
        task_type = %capabilities.task_type,
        supports_feedback = capabilities.supports_feedback,
        "probed serving endpoint"
    );
    Ok(Endpoint::new(name, capabilities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use strum::IntoEnumIterator;

    #[test]
    fn test_task_type_mapping() {
        assert_eq!(
            TaskType::from_task(Some("agent/v1/responses")),
            TaskType::Responses
        );
        assert_eq!(TaskType::from_task(Some("agent/v2/chat")), TaskType::ChatAgent);
        assert_eq!(
            TaskType::from_task(Some("chat/completions")),
            TaskType::ChatCompletions
        );
        assert_eq!(
            TaskType::from_task(Some("llm/v1/chat")),
            TaskType::ChatCompletions
        );
        assert_eq!(
            TaskType::from_task(Some("llm/v1/embeddings")),
            TaskType::ChatCompletions
        );
        assert_eq!(TaskType::from_task(None), TaskType::ChatCompletions);
    }

    #[test]
    fn test_task_type_display_round_trips() {
        for task in TaskType::iter() {
            assert_eq!(TaskType::from_task(Some(&task.to_string())), task);
        }
    }

    #[tokio::test]
    async fn test_probe_endpoint() -> anyhow::Result<()> {
        let transport = MockTransport::new(EndpointCapabilities {
            supports_feedback: true,
            task_type: TaskType::ChatAgent,
        });

        let endpoint = probe_endpoint(&transport, "agent-endpoint").await?;
        assert_eq!(endpoint.name, "agent-endpoint");
        assert_eq!(endpoint.task_type(), TaskType::ChatAgent);
        assert!(endpoint.return_traces());
        Ok(())
    }

    #[tokio::test]
    async fn test_probe_failure_is_fatal() {
        let transport = MockTransport::unreachable("connection refused");

        let err = probe_endpoint(&transport, "missing").await.unwrap_err();
        assert_eq!(
            err,
            PulseError::Probe {
                endpoint: "missing".to_string(),
                reason: "connection refused".to_string(),
            }
        );
    }
}
