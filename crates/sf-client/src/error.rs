//! Transport and API errors.
//!
//! Every non-2xx response ends up here. Callers above the transport sort
//! them into their own categories through the accessors on [`Error`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Worth another attempt: throttling, gateway errors, timeouts and
    /// refused connections.
    pub fn is_retryable(&self) -> bool {
        match &self.kind {
            ErrorKind::RateLimited { .. } | ErrorKind::Timeout | ErrorKind::Connection(_) => true,
            ErrorKind::Http { status, .. } => matches!(status, 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// The failure happened before the server saw the request: throttled,
    /// or the connection was never established.
    pub fn is_unsent(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::RateLimited { .. } | ErrorKind::Connection(_)
        )
    }

    /// A `401`, or an `INVALID_SESSION_ID` body with any status.
    pub fn is_auth_error(&self) -> bool {
        match &self.kind {
            ErrorKind::Authentication(_) => true,
            ErrorKind::SalesforceApi { status, .. } if *status == 401 => true,
            _ => self.error_code() == Some("INVALID_SESSION_ID"),
        }
    }

    /// Server-requested wait from a `429`.
    pub fn retry_after(&self) -> Option<Duration> {
        match &self.kind {
            ErrorKind::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status associated with this error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            ErrorKind::Http { status, .. } | ErrorKind::SalesforceApi { status, .. } => {
                Some(*status)
            }
            ErrorKind::RateLimited { .. } => Some(429),
            ErrorKind::Authentication(_) => Some(401),
            ErrorKind::Authorization(_) => Some(403),
            ErrorKind::NotFound(_) => Some(404),
            ErrorKind::MultipleChoices { .. } => Some(300),
            _ => None,
        }
    }

    /// The error list reported by Salesforce, empty for transport failures.
    pub fn api_errors(&self) -> &[ApiError] {
        match &self.kind {
            ErrorKind::SalesforceApi { errors, .. } => errors,
            _ => &[],
        }
    }

    /// The first Salesforce error code, e.g. `NOT_FOUND`.
    pub fn error_code(&self) -> Option<&str> {
        self.api_errors().first().map(|e| e.error_code.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Non-2xx status without a Salesforce error body.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("rate limited{}", retry_after.map(|d| format!(", retry after {}s", d.as_secs())).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// `401` without a parsable body.
    #[error("session rejected: {0}")]
    Authentication(String),

    #[error("forbidden: {0}")]
    Authorization(String),

    /// `404` without a Salesforce error body.
    #[error("not found: {0}")]
    NotFound(String),

    /// HTTP 300: the request matched more than one resource.
    ///
    /// Salesforce returns this for an external id upsert that matches several
    /// records; `locations` holds the record URLs from the response body.
    #[error("{} candidate resources", locations.len())]
    MultipleChoices { locations: Vec<String> },

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("invalid client configuration: {0}")]
    Config(String),

    /// Error body returned by the REST API.
    #[error("{}", summarize(errors))]
    SalesforceApi { status: u16, errors: Vec<ApiError> },

    /// `attempts` counts retries, not the first send.
    #[error("gave up after {attempts} retries")]
    RetriesExhausted { attempts: u32 },

    #[error("{0}")]
    Other(String),
}

/// One entry of a Salesforce error body.
///
/// Error responses come as `[{"errorCode": .., "message": .., "fields": [..]}]`;
/// save results use `statusCode` for the same member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiError {
    #[serde(rename = "errorCode", alias = "statusCode", alias = "error_code")]
    pub error_code: String,
    pub message: String,
    #[serde(default)]
    pub fields: Vec<String>,
}

fn summarize(errors: &[ApiError]) -> String {
    match errors {
        [] => "no error details".to_string(),
        [first] => format!("{} - {}", first.error_code, first.message),
        [first, rest @ ..] => format!(
            "{} - {} (+{} more)",
            first.error_code,
            first.message,
            rest.len()
        ),
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            ErrorKind::Json(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}
