use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabricksTransportConfig {
    pub host: String,
    /// Bearer token sent with every request when present
    pub token: Option<String>,
    pub timeout: Duration,
}

impl DatabricksTransportConfig {
    pub fn new<S: Into<String>>(host: S, token: Option<String>) -> Self {
        Self {
            host: host.into(),
            token,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn base_url(&self) -> &str {
        self.host.trim_end_matches('/')
    }
}
