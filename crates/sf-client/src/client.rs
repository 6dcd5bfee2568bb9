//! The retrying transport.

use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{RequestBuilder, RequestMethod};
use crate::response::Response;
use crate::retry::RetryPolicy;

/// Pooled HTTP client. Clones share the pool.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SfHttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, url)
    }

    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, url)
    }

    /// Send `request`, retrying transient failures per the configured policy.
    ///
    /// Only a `2xx` comes back as `Ok`. When retries run out the last failure
    /// is kept as the source of [`ErrorKind::RetriesExhausted`]. A `POST` is
    /// resent only when the first attempt never reached the server.
    #[instrument(skip(self, request), fields(method = ?request.method, url = %request.url))]
    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        let mut policy = self.config.retry.clone().map(RetryPolicy::new);

        loop {
            let err = match self.send_once(&request).await {
                Ok(response) => return response.error_for_status().await,
                Err(err) => err,
            };

            let replayable = request.method.is_idempotent() || err.is_unsent();
            let Some(policy) = policy
                .as_mut()
                .filter(|_| replayable && err.is_retryable())
            else {
                return Err(err);
            };
            let Some(delay) = policy.next_delay(err.retry_after()) else {
                let attempts = policy.attempt();
                return Err(Error::with_source(
                    ErrorKind::RetriesExhausted { attempts },
                    err,
                ));
            };

            warn!(
                retry = policy.attempt(),
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn send_once(&self, request: &RequestBuilder) -> Result<Response> {
        let traced = self.config.enable_tracing;
        if traced {
            debug!(method = ?request.method, url = %request.url, "sending request");
        }

        let response = request.to_reqwest(&self.inner).send().await?;

        if let Some(err) = transient_failure(&response) {
            return Err(err);
        }
        let response = Response::new(response);

        if traced {
            let status = response.status();
            let usage = response.api_usage();
            let used = usage.map(|u| u.used);
            let limit = usage.map(|u| u.limit);
            if response.is_success() {
                debug!(status, api_used = used, api_limit = limit, "response received");
            } else {
                info!(status, api_used = used, api_limit = limit, "non-success response");
            }
        }
        Ok(response)
    }

    /// [`execute`](Self::execute), then decode the JSON body.
    pub async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        self.execute(request).await?.json().await
    }
}

/// Statuses worth retrying, mapped to the error the retry loop inspects.
fn transient_failure(response: &reqwest::Response) -> Option<Error> {
    match response.status().as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            Some(Error::new(ErrorKind::RateLimited { retry_after }))
        }
        status @ (500 | 502 | 503 | 504) => Some(Error::new(ErrorKind::Http {
            status,
            message: format!("server unavailable ({status})"),
        })),
        _ => None,
    }
}
