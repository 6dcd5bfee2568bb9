//! Connected-app flows against `{login_url}/services/oauth2/*`.
//!
//! Password grant, refresh grant and token revocation. All three post an
//! `application/x-www-form-urlencoded` body.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::credentials::SalesforceCredentials;
use crate::error::{Error, ErrorKind, Result};

/// Connected app identity. The secret is optional for apps that do not
/// require one and never shows up in `Debug`.
#[derive(Clone)]
pub struct OAuthConfig {
    pub consumer_key: String,
    consumer_secret: Option<String>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl OAuthConfig {
    pub fn new(consumer_key: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: None,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.consumer_secret = Some(secret.into());
        self
    }

    fn client_params<'a>(&'a self, params: &mut Vec<(&'static str, &'a str)>) {
        params.push(("client_id", &self.consumer_key));
        if let Some(secret) = &self.consumer_secret {
            params.push(("client_secret", secret));
        }
    }
}

#[derive(Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Username/password grant. `password` has the security token appended
    /// when the org requires one.
    #[instrument(skip(self, password), fields(login_url = %login_url))]
    pub async fn password_login(
        &self,
        username: &str,
        password: &str,
        login_url: &str,
    ) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
        ];
        self.config.client_params(&mut params);
        self.token(login_url, &params).await
    }

    #[instrument(skip(self, refresh_token), fields(login_url = %login_url))]
    pub async fn refresh_token(&self, refresh_token: &str, login_url: &str) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.config.client_params(&mut params);
        self.token(login_url, &params).await
    }

    /// Revoke an access or refresh token.
    #[instrument(skip(self, token), fields(login_url = %login_url))]
    pub async fn revoke_token(&self, token: &str, login_url: &str) -> Result<()> {
        revoke_token(&self.http, token, login_url).await
    }

    async fn token(&self, login_url: &str, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = post_form(&self.http, login_url, "token", params).await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.json::<OAuthErrorBody>().await.ok();
            let (error, description) = match body {
                Some(body) => (body.error, body.error_description),
                None => (format!("http_{status}"), String::new()),
            };
            return Err(Error::new(ErrorKind::OAuth { error, description }));
        }

        let token: TokenResponse = response.json().await?;
        debug!(instance_url = %token.instance_url, "token issued");
        Ok(token)
    }
}

/// `POST {login_url}/services/oauth2/revoke`. Any non-2xx is a failure.
pub(crate) async fn revoke_token(
    http: &reqwest::Client,
    token: &str,
    login_url: &str,
) -> Result<()> {
    let response = post_form(http, login_url, "revoke", &[("token", token)]).await?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(Error::new(ErrorKind::OAuth {
        error: "revoke_failed".to_string(),
        description: format!("revoke endpoint answered {}", status.as_u16()),
    }))
}

async fn post_form(
    http: &reqwest::Client,
    login_url: &str,
    endpoint: &str,
    params: &[(&str, &str)],
) -> Result<reqwest::Response> {
    let url = format!(
        "{}/services/oauth2/{endpoint}",
        login_url.trim_end_matches('/')
    );
    let response = http
        .post(url)
        .header(
            reqwest::header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        )
        .body(serde_urlencoded::to_string(params)?)
        .send()
        .await?;
    Ok(response)
}

/// Body of a successful token grant. `Debug` hides the tokens and signature.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Only present when the connected app issues refresh tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub instance_url: String,
    /// Identity URL.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    /// Epoch milliseconds, as a string.
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hidden = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("TokenResponse")
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("issued_at", &self.issued_at)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &hidden(&self.refresh_token))
            .field("signature", &hidden(&self.signature))
            .finish()
    }
}

impl TokenResponse {
    pub fn to_credentials(&self, api_version: &str) -> SalesforceCredentials {
        let creds = SalesforceCredentials::new(&self.instance_url, &self.access_token, api_version);
        match &self.refresh_token {
            Some(refresh) => creds.with_refresh_token(refresh),
            None => creds,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: String,
}
