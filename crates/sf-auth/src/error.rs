//! Login and revocation errors.
//!
//! Messages never carry passwords, tokens or session ids.

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

    /// The login server answered and refused the credentials. Transport
    /// failures and unreadable responses are not rejections.
    pub fn is_rejected_login(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::OAuth { .. } | ErrorKind::LoginFault { .. }
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// `error`/`error_description` pair from the OAuth token or revoke endpoint.
    #[error("oauth {error}: {description}")]
    OAuth { error: String, description: String },

    /// SOAP fault from the login endpoint, e.g. `INVALID_LOGIN`.
    #[error("login refused ({code}): {message}")]
    LoginFault { code: String, message: String },

    #[error("unusable credentials: {0}")]
    InvalidCredentials(String),

    #[error("login request failed: {0}")]
    Http(String),

    #[error("unreadable login response: {0}")]
    UnexpectedResponse(String),

    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("cannot encode form: {0}")]
    Serialization(String),

    #[error("{0} is not set")]
    EnvVar(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        // Form bodies carry tokens; reqwest may echo the request in its message.
        let message = err.to_string();
        let message = if message.contains("token") {
            "request failed (details redacted)".to_string()
        } else {
            message
        };
        Error::with_source(ErrorKind::Http(message), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Error::with_source(ErrorKind::Serialization(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidInput(format!("bad URL: {err}")), err)
    }
}
