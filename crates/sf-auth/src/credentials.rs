//! An established session.

use tracing::instrument;

use crate::error::{Error, ErrorKind, Result};

/// What the REST layer needs from a session.
pub trait Credentials: Send + Sync {
    /// e.g. `https://na1.salesforce.com`, no trailing slash.
    fn instance_url(&self) -> &str;

    /// OAuth access token or SOAP session id; both go out as a bearer token.
    fn access_token(&self) -> &str;

    /// e.g. `"62.0"`.
    fn api_version(&self) -> &str;

    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.access_token().is_empty()
    }
}

/// Session produced by a login, or supplied from the environment.
///
/// Never mutated after creation. `Debug` hides both tokens.
#[derive(Clone)]
pub struct SalesforceCredentials {
    instance_url: String,
    access_token: String,
    api_version: String,
    refresh_token: Option<String>,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let refresh = self.refresh_token.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &refresh)
            .finish()
    }
}

impl SalesforceCredentials {
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        let instance_url: String = instance_url.into();
        Self {
            instance_url: instance_url.trim_end_matches('/').to_owned(),
            access_token: access_token.into(),
            api_version: api_version.into(),
            refresh_token: None,
        }
    }

    pub fn with_refresh_token(self, refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: Some(refresh_token.into()),
            ..self
        }
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Reuse a session token obtained elsewhere. Reads `SF_INSTANCE_URL`,
    /// `SF_ACCESS_TOKEN`, and optionally `SF_API_VERSION` and
    /// `SF_REFRESH_TOKEN`; a `SALESFORCE_` prefix works as well.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |key: &str| {
            ["SF_", "SALESFORCE_"]
                .iter()
                .find_map(|prefix| lookup(&format!("{prefix}{key}")))
                .filter(|v| !v.is_empty())
        };
        let required = |key: &str| {
            read(key).ok_or_else(|| Error::new(ErrorKind::EnvVar(format!("SF_{key}"))))
        };

        let creds = Self::new(
            required("INSTANCE_URL")?,
            required("ACCESS_TOKEN")?,
            read("API_VERSION")
                .unwrap_or_else(|| forcelink_sf_client::DEFAULT_API_VERSION.to_owned()),
        );
        if creds.instance_url.is_empty() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "instance URL is empty".to_owned(),
            )));
        }
        Ok(match read("REFRESH_TOKEN") {
            Some(refresh) => creds.with_refresh_token(refresh),
            None => creds,
        })
    }

    /// End the session at `{login_url}/services/oauth2/revoke`.
    ///
    /// The refresh token is revoked when held, which also kills every access
    /// token issued from it.
    #[instrument(skip(self), fields(instance_url = %self.instance_url))]
    pub async fn revoke(&self, login_url: &str) -> Result<()> {
        let token = self.refresh_token().unwrap_or(&self.access_token);
        crate::oauth::revoke_token(&reqwest::Client::new(), token, login_url).await
    }
}

impl Credentials for SalesforceCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}
