use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use super::base::{ChunkStream, Transport};
use super::configs::DatabricksTransportConfig;
use super::sse::decode_stream;
use super::utils::{build_payload, response_to_assistant};
use crate::endpoint::{Endpoint, EndpointCapabilities, TaskType};
use crate::errors::PulseError;
use crate::models::message::Message;
use crate::models::turn::AssistantResponse;

/// Served entity name marking an endpoint that records feedback
const FEEDBACK_ENTITY: &str = "feedback";

pub struct DatabricksTransport {
    client: Client,
    config: DatabricksTransportConfig,
}

impl DatabricksTransport {
    pub fn new(config: DatabricksTransportConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn invocations_url(&self, endpoint: &str) -> String {
        format!(
            "{}/serving-endpoints/{}/invocations",
            self.config.base_url(),
            endpoint
        )
    }

    async fn post(&self, endpoint: &str, payload: &Value) -> Result<Response> {
        let response = self
            .authorize(self.client.post(self.invocations_url(endpoint)))
            .json(payload)
            .send()
            .await?;

        check_status(response).await
    }

    fn capabilities(description: &Value) -> EndpointCapabilities {
        let supports_feedback = description
            .pointer("/config/served_entities")
            .and_then(Value::as_array)
            .is_some_and(|entities| {
                entities.iter().any(|entity| {
                    entity.get("name").and_then(Value::as_str) == Some(FEEDBACK_ENTITY)
                })
            });

        EndpointCapabilities {
            supports_feedback,
            task_type: TaskType::from_task(description.get("task").and_then(Value::as_str)),
        }
    }
}

async fn check_status(response: Response) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        status if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() => {
            Err(PulseError::Transport(format!("Server error: {}", status)).into())
        }
        status => {
            let err_text = response.text().await.unwrap_or_default();
            Err(PulseError::Transport(format!("Request failed: {}: {}", status, err_text)).into())
        }
    }
}

#[async_trait]
impl Transport for DatabricksTransport {
    async fn probe(&self, endpoint: &str) -> Result<EndpointCapabilities> {
        let url = format!(
            "{}/api/2.0/serving-endpoints/{}",
            self.config.base_url(),
            endpoint
        );
        let response = self.authorize(self.client.get(&url)).send().await?;
        let description: Value = check_status(response).await?.json().await?;

        Ok(Self::capabilities(&description))
    }

    async fn stream(
        &self,
        endpoint: &Endpoint,
        messages: &[Message],
        return_traces: bool,
    ) -> Result<ChunkStream> {
        let payload = build_payload(endpoint.task_type(), messages, return_traces, true)?;
        let response = self.post(&endpoint.name, &payload).await?;

        Ok(Box::pin(decode_stream(response.bytes_stream())))
    }

    async fn call(
        &self,
        endpoint: &Endpoint,
        messages: &[Message],
        return_traces: bool,
    ) -> Result<AssistantResponse> {
        let payload = build_payload(endpoint.task_type(), messages, return_traces, false)?;
        let response: Value = self.post(&endpoint.name, &payload).await?.json().await?;

        response_to_assistant(&response)
    }
}
