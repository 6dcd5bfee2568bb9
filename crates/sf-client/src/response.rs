//! Responses and error body parsing.

use std::sync::LazyLock;
use std::time::Duration;

use regex_lite::Regex;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, Error, ErrorKind, Result};

/// A `2xx` response from [`SfHttpClient::execute`](crate::SfHttpClient::execute).
#[derive(Debug)]
pub struct Response {
    inner: reqwest::Response,
}

impl Response {
    pub(crate) fn new(inner: reqwest::Response) -> Self {
        Self { inner }
    }

    pub fn status(&self) -> u16 {
        self.inner.status().as_u16()
    }

    pub fn is_success(&self) -> bool {
        self.inner.status().is_success()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name)?.to_str().ok()
    }

    /// Delta-seconds form only; Salesforce does not send HTTP dates here.
    pub fn retry_after(&self) -> Option<Duration> {
        let secs = self.header("retry-after")?.trim().parse().ok()?;
        Some(Duration::from_secs(secs))
    }

    pub async fn text(self) -> Result<String> {
        Ok(self.inner.text().await?)
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.inner.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Like [`json`](Self::json), but an empty body (a `204`) gives `None`.
    pub async fn json_opt<T: DeserializeOwned>(self) -> Result<Option<T>> {
        let body = self.inner.bytes().await?;
        if body.trim_ascii().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&body)?))
    }

    /// Parsed `Sforce-Limit-Info: api-usage=25/15000`.
    pub fn api_usage(&self) -> Option<ApiUsage> {
        let info = self.header("sforce-limit-info")?;
        let usage = info
            .split(',')
            .find_map(|part| part.trim().strip_prefix("api-usage="))?;
        let (used, limit) = usage.split_once('/')?;
        Some(ApiUsage {
            used: used.parse().ok()?,
            limit: limit.parse().ok()?,
        })
    }

    /// Pass success through; turn anything else into the matching error.
    pub(crate) async fn error_for_status(self) -> Result<Response> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.status();
        let retry_after = self.retry_after();
        let body = self.text().await.unwrap_or_default();

        let mut err = parse_error_response(status, &body);
        if let ErrorKind::RateLimited { retry_after: slot } = &mut err.kind {
            *slot = retry_after;
        }
        Err(err)
    }
}

/// Daily API request consumption reported on every REST response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiUsage {
    pub used: u64,
    pub limit: u64,
}

impl ApiUsage {
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }
}

/// Parse an error response body into the matching error kind.
fn parse_error_response(status: u16, body: &str) -> Error {
    if status == 429 {
        return Error::new(ErrorKind::RateLimited { retry_after: None });
    }

    // 300 carries the list of matching resource URLs, not an error list.
    if status == 300 {
        let locations = serde_json::from_str::<Vec<String>>(body).unwrap_or_default();
        return Error::new(ErrorKind::MultipleChoices { locations });
    }

    if let Ok(errors) = serde_json::from_str::<Vec<ApiError>>(body) {
        if !errors.is_empty() {
            return salesforce_api_error(status, errors);
        }
    }

    if let Ok(err) = serde_json::from_str::<ApiError>(body) {
        return salesforce_api_error(status, vec![err]);
    }

    let sanitized = sanitize_error_message(body);
    let kind = match status {
        401 => ErrorKind::Authentication(sanitized),
        403 => ErrorKind::Authorization(sanitized),
        404 => ErrorKind::NotFound(sanitized),
        _ => ErrorKind::Http {
            status,
            message: sanitized,
        },
    };

    Error::new(kind)
}

fn salesforce_api_error(status: u16, errors: Vec<ApiError>) -> Error {
    let errors = errors
        .into_iter()
        .map(|e| ApiError {
            message: sanitize_error_message(&e.message),
            ..e
        })
        .collect();
    Error::new(ErrorKind::SalesforceApi { status, errors })
}

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"00[A-Za-z0-9]{13,}[!][A-Za-z0-9_.]+").expect("token pattern is valid")
});

static SESSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"sid=[A-Za-z0-9]{20,}").expect("session pattern is valid"));

/// Sanitize an error message before it ends up in an error value.
///
/// Access tokens (`00D...!...`) and `sid=` session ids are redacted and the
/// message is truncated to 500 bytes.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_LENGTH: usize = 500;

    let sanitized = TOKEN_PATTERN.replace_all(message, "[REDACTED_TOKEN]");
    let mut sanitized = SESSION_PATTERN
        .replace_all(&sanitized, "sid=[REDACTED]")
        .into_owned();

    if sanitized.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
        sanitized.push_str("...[truncated]");
    }

    sanitized
}
