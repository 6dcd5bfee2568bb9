//! HTTP transport for the Salesforce REST API.
//!
//! The only layer in forcelink that touches the network.
//!
//! - [`SfHttpClient`] sends requests, retries `429` and gateway errors with
//!   backoff, and turns error bodies into [`ErrorKind::SalesforceApi`].
//!   A `300 Multiple Choices` becomes [`ErrorKind::MultipleChoices`].
//! - [`SalesforceClient`] binds the transport to one session: instance URL,
//!   bearer token, API version.
//!
//! ```rust,ignore
//! use forcelink_sf_client::{ClientConfig, SalesforceClient, SfHttpClient};
//!
//! let http = SfHttpClient::new(ClientConfig::default())?;
//! let client = SalesforceClient::new(http, "https://myorg.my.salesforce.com", token);
//! let global: serde_json::Value = client.rest_get("sobjects").await?;
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod salesforce_client;
pub mod security;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ApiError, Error, ErrorKind, Result};
pub use request::{RequestBuilder, RequestMethod};
pub use response::{ApiUsage, Response};
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy};
pub use salesforce_client::SalesforceClient;

/// REST API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "62.0";

pub const USER_AGENT: &str = concat!("forcelink/", env!("CARGO_PKG_VERSION"));
