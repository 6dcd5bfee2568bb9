//! Session-bound view of the transport.
//!
//! A [`SalesforceClient`] is an [`SfHttpClient`] plus one org's instance URL,
//! access token and API version. Every request it builds carries the token.

use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::client::SfHttpClient;
use crate::error::Result;
use crate::request::RequestBuilder;
use crate::response::Response;
use crate::DEFAULT_API_VERSION;

/// Clones share the connection pool and the token; the token is never
/// printed by `Debug`.
#[derive(Clone)]
pub struct SalesforceClient {
    http: SfHttpClient,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SalesforceClient {
    pub fn new(
        http: SfHttpClient,
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        let mut instance_url = instance_url.into();
        while instance_url.ends_with('/') {
            instance_url.pop();
        }
        Self {
            http,
            instance_url,
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// API version without the `v`, e.g. `"62.0"`.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Resolve a server-relative path such as a `nextRecordsUrl` against the
    /// instance. Absolute URLs are returned as given.
    pub fn url(&self, path: &str) -> String {
        if path.contains("://") {
            return path.to_string();
        }
        format!("{}/{}", self.instance_url, path.trim_start_matches('/'))
    }

    /// `{instance}/services/data/v{version}/{path}`
    pub fn rest_url(&self, path: &str) -> String {
        self.url(&format!(
            "services/data/v{}/{}",
            self.api_version,
            path.trim_start_matches('/')
        ))
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.access_token)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http.post(url).bearer_auth(&self.access_token)
    }

    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.http.patch(url).bearer_auth(&self.access_token)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.http.delete(url).bearer_auth(&self.access_token)
    }

    pub async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        self.http.execute(request).await
    }

    /// GET a path under the versioned REST root and decode the JSON body.
    #[instrument(skip(self))]
    pub async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.http.send_json(self.get(&self.rest_url(path))).await
    }
}
