use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::adapters::responses::messages_from_item;
use crate::endpoint::TaskType;
use crate::errors::PulseError;
use crate::models::message::Message;
use crate::models::role::Role;
use crate::models::turn::AssistantResponse;

use super::sse::error_summary;

/// Read `databricks_output.databricks_request_id` from a chunk or response
pub fn request_id(value: &Value) -> Option<&str> {
    value
        .get("databricks_output")
        .and_then(|output| output.get("databricks_request_id"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Build the invocation body for an endpoint speaking `task_type`
pub fn build_payload(
    task_type: TaskType,
    messages: &[Message],
    return_traces: bool,
    stream: bool,
) -> Result<Value> {
    let mut payload = match task_type {
        TaskType::Responses => json!({ "input": messages_to_responses_input(messages) }),
        TaskType::ChatCompletions | TaskType::ChatAgent => {
            json!({ "messages": serde_json::to_value(messages)? })
        }
    };

    if return_traces {
        payload["databricks_options"] = json!({ "return_trace": true });
    }
    if stream {
        payload["stream"] = json!(true);
    }
    Ok(payload)
}

/// Convert chat messages into responses-style input items.
///
/// Tool calls become `function_call` items and tool results `function_call_output`
/// items; everything else stays a role/content message.
pub fn messages_to_responses_input(messages: &[Message]) -> Vec<Value> {
    let mut input = Vec::new();

    for message in messages {
        match message.role {
            Role::Tool => input.push(json!({
                "type": "function_call_output",
                "call_id": message.tool_call_id.clone().unwrap_or_default(),
                "output": message.content,
            })),
            Role::User | Role::Assistant => {
                if !message.content.is_empty() || !message.has_tool_calls() {
                    input.push(json!({
                        "role": message.role,
                        "content": message.content,
                    }));
                }
                for call in message.tool_calls() {
                    input.push(json!({
                        "type": "function_call",
                        "call_id": call.id,
                        "name": call.function.name,
                        "arguments": call.function.arguments,
                    }));
                }
            }
        }
    }

    input
}

/// Convert a non-streaming invocation response into the finished messages.
///
/// Chat-agent endpoints answer with `messages`, chat-completion endpoints with
/// `choices`, and responses endpoints with `output` items.
pub fn response_to_assistant(response: &Value) -> Result<AssistantResponse> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        return Err(anyhow!("Serving endpoint error: {}", error_summary(error)));
    }

    let request_id = request_id(response).map(str::to_string);

    let messages = if let Some(messages) = response.get("messages").and_then(Value::as_array) {
        messages.iter().map(Message::from_value).collect()
    } else if let Some(choices) = response.get("choices").and_then(Value::as_array) {
        choices
            .first()
            .and_then(|choice| choice.get("message"))
            .map(|message| vec![Message::from_value(message)])
            .unwrap_or_default()
    } else if let Some(output) = response.get("output").and_then(Value::as_array) {
        output.iter().flat_map(messages_from_item).collect()
    } else {
        return Err(PulseError::UnsupportedResponse(
            "expected a chat completion, chat agent or responses agent payload".to_string(),
        )
        .into());
    };

    Ok(AssistantResponse::new(messages, request_id))
}
