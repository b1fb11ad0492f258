//! Decoding of the Server-Sent Events bodies returned by streamed invocations.
use std::fmt::Display;

use anyhow::{anyhow, Context, Result};
use async_stream::try_stream;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde_json::Value;

/// End-of-stream sentinel sent as the data of the last event
const DONE: &str = "[DONE]";

#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Data(Value),
    Done,
}

/// Turn a raw event-stream body into its JSON chunks, stopping at `[DONE]`
pub fn decode_stream<S, B, E>(body: S) -> impl Stream<Item = Result<Value>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    try_stream! {
        let mut events = Box::pin(body.eventsource());

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| anyhow!("Event stream error: {}", e))?;
            match decode_event(&event.data)? {
                Some(SseEvent::Data(chunk)) => {
                    yield chunk;
                }
                Some(SseEvent::Done) => break,
                None => {}
            }
        }
    }
}

/// Decode the data of one event; multi-line data arrives already joined
pub fn decode_event(data: &str) -> Result<Option<SseEvent>> {
    let payload = data.trim();
    if payload.is_empty() {
        return Ok(None);
    }
    if payload == DONE {
        return Ok(Some(SseEvent::Done));
    }

    let value: Value = serde_json::from_str(payload)
        .with_context(|| format!("Could not parse stream chunk: {}", payload))?;
    if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
        return Err(anyhow!("Serving endpoint error: {}", error_summary(error)));
    }
    Ok(Some(SseEvent::Data(value)))
}

/// Pull a readable message out of an error payload
pub fn error_summary(error: &Value) -> String {
    let text = match error {
        Value::String(message) => message.clone(),
        _ => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    };
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
