use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum PulseError {
    #[error("Unable to probe serving endpoint {endpoint}: {reason}")]
    Probe { endpoint: String, reason: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed chunk: {0}")]
    MalformedChunk(String),

    #[error("Request failed after retrying without streaming: {0}")]
    Fallback(String),

    #[error("Unsupported endpoint response: {0}")]
    UnsupportedResponse(String),
}

pub type PulseResult<T> = Result<T, PulseError>;
