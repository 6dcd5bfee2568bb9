//! Error types for sf-rest.
//!
//! Transport errors are mapped into these kinds exactly once, at the proxy and
//! cursor boundary. The original transport error stays reachable through
//! `source`.

use forcelink_sf_client::ErrorKind as ClientErrorKind;

/// Error entry reported by the service for a failed save or request.
pub use forcelink_sf_client::ApiError as SalesforceError;

/// Result type alias for sf-rest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sf-rest operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn not_authenticated() -> Self {
        Self::new(ErrorKind::Auth("no active session; call login first".to_string()))
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput(message.into()))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self.kind, ErrorKind::Auth(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound(_))
    }

    /// Candidate record ids of an upsert that matched several records.
    pub fn upsert_candidates(&self) -> Option<&[String]> {
        match &self.kind {
            ErrorKind::UpsertConflict { candidates } => Some(candidates),
            _ => None,
        }
    }

    /// Field errors reported by the service, empty for other kinds.
    pub fn validation_errors(&self) -> &[SalesforceError] {
        match &self.kind {
            ErrorKind::Validation { errors } => errors,
            _ => &[],
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// No session, or the service rejected the session.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The record or resource does not exist (`NOT_FOUND`).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service rejected the payload; `errors` is its error list, in order.
    #[error("Validation failed: {}", summarize(errors))]
    Validation { errors: Vec<SalesforceError> },

    /// An external id upsert matched more than one record.
    #[error("Upsert matched {} records: {}", candidates.len(), candidates.join(", "))]
    UpsertConflict { candidates: Vec<String> },

    /// Network or HTTP-layer failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The cursor has already finished.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Rejected before sending, e.g. an unsafe sobject name.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn summarize(errors: &[SalesforceError]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{}: {}", e.error_code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Record id from the last path segment of a record URL.
fn candidate_id(location: &str) -> String {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(location)
        .to_string()
}

impl From<forcelink_sf_client::Error> for Error {
    fn from(err: forcelink_sf_client::Error) -> Self {
        let kind = if err.is_auth_error() {
            ErrorKind::Auth(err.to_string())
        } else {
            match &err.kind {
                ClientErrorKind::MultipleChoices { locations } if !locations.is_empty() => {
                    ErrorKind::UpsertConflict {
                        candidates: locations.iter().map(|l| candidate_id(l)).collect(),
                    }
                }
                ClientErrorKind::NotFound(message) => ErrorKind::NotFound(message.clone()),
                ClientErrorKind::SalesforceApi { status, errors } => {
                    if *status == 404 || err.error_code() == Some("NOT_FOUND") {
                        let message = errors
                            .first()
                            .map(|e| e.message.clone())
                            .unwrap_or_else(|| "resource does not exist".to_string());
                        ErrorKind::NotFound(message)
                    } else {
                        ErrorKind::Validation {
                            errors: errors.clone(),
                        }
                    }
                }
                _ => ErrorKind::Transport(err.to_string()),
            }
        };
        Error::with_source(kind, err)
    }
}

impl From<forcelink_sf_auth::Error> for Error {
    fn from(err: forcelink_sf_auth::Error) -> Self {
        let kind = if err.is_rejected_login() {
            ErrorKind::Auth(err.to_string())
        } else {
            ErrorKind::Transport(err.to_string())
        };
        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Transport(format!("unexpected response body: {err}")), err)
    }
}
