//! Transport settings.

use std::time::Duration;

use crate::retry::RetryConfig;

/// Settings for [`SfHttpClient`](crate::SfHttpClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `None` sends every request exactly once.
    pub retry: Option<RetryConfig>,
    /// Per-request timeout, covering connect through the last body byte.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Advertise gzip/deflate and decode compressed bodies.
    pub accept_compressed: bool,
    pub user_agent: String,
    /// Emit a debug event per request and response.
    pub enable_tracing: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry: Some(RetryConfig::default()),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            accept_compressed: true,
            user_agent: crate::USER_AGENT.to_string(),
            enable_tracing: true,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Apply `SF_HTTP_TIMEOUT_SECS` and `SF_HTTP_MAX_RETRIES` from `lookup`.
    ///
    /// Unset, empty and unparsable values leave the current setting alone.
    /// `SF_HTTP_MAX_RETRIES=0` turns retry off.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let number = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(secs) = number("SF_HTTP_TIMEOUT_SECS").filter(|s| *s > 0) {
            self.timeout = Duration::from_secs(secs);
        }
        match number("SF_HTTP_MAX_RETRIES").map(|n| u32::try_from(n).unwrap_or(u32::MAX)) {
            Some(0) => self.retry = None,
            Some(n) => {
                self.retry = Some(self.retry.unwrap_or_default().with_max_retries(n));
            }
            None => {}
        }
        self
    }
}

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = Some(retry);
        self
    }

    pub fn without_retry(mut self) -> Self {
        self.config.retry = None;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.accept_compressed = enabled;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.config.enable_tracing = enabled;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
