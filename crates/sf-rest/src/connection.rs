//! Session-holding entry point.

use tracing::{info, instrument, warn};

use forcelink_sf_auth::{
    Credentials, OAuthClient, SalesforceCredentials, SoapLogin, PRODUCTION_LOGIN_URL,
};
use forcelink_sf_client::{ClientConfig, SalesforceClient, SfHttpClient, DEFAULT_API_VERSION};

use crate::describe::{DescribeGlobalResult, DescribeSObjectResult};
use crate::error::{Error, ErrorKind, Result};
use crate::query::{QueryCursor, QueryOptions};
use crate::sobject::SObject;

/// Settings for a [`Connection`].
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Host that login and token revocation go to.
    pub login_url: String,
    /// REST API version, e.g. "62.0".
    pub api_version: String,
    /// Transport settings: timeouts, retry.
    pub client: ClientConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            login_url: PRODUCTION_LOGIN_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            client: ClientConfig::default(),
        }
    }
}

impl ConnectionConfig {
    /// Defaults overridden by `SF_LOGIN_URL` and `SF_API_VERSION` when set,
    /// plus the transport overrides read by [`ClientConfig::with_env_overrides`].
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            client: ClientConfig::default().with_env_overrides(&lookup),
            ..Self::default()
        };
        if let Some(url) = lookup("SF_LOGIN_URL").filter(|v| !v.is_empty()) {
            config.login_url = url;
        }
        if let Some(version) = lookup("SF_API_VERSION").filter(|v| !v.is_empty()) {
            config.api_version = version;
        }
        config
    }

    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_client_config(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }
}

#[derive(Debug, Clone)]
struct Session {
    credentials: SalesforceCredentials,
    client: SalesforceClient,
}

/// A connection to one org.
///
/// Starts unauthenticated; [`login`](Self::login) establishes the session.
/// Proxies and cursors created from the connection copy the session at
/// creation time. Without a session every operation fails with
/// [`ErrorKind::Auth`] before anything is sent.
///
/// ```rust,ignore
/// use forcelink_sf_rest::{Connection, ConnectionConfig, QueryOptions};
///
/// let mut conn = Connection::new(ConnectionConfig::default())?;
/// conn.login("user@example.com", "password+token").await?;
///
/// let created = conn.sobject("Account").create(&serde_json::json!({"Name": "Acme"})).await?;
/// let accounts = conn
///     .query_with("SELECT Id, Name FROM Account", QueryOptions::new().auto_fetch(true))
///     .execute()
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Connection {
    config: ConnectionConfig,
    http: SfHttpClient,
    session: Option<Session>,
}

impl Connection {
    /// Create an unauthenticated connection.
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        let http = SfHttpClient::new(config.client.clone())?;
        Ok(Self {
            config,
            http,
            session: None,
        })
    }

    /// Create a connection over an existing session.
    pub fn from_credentials(
        credentials: SalesforceCredentials,
        config: ConnectionConfig,
    ) -> Result<Self> {
        let mut conn = Self::new(config)?;
        conn.establish(credentials);
        Ok(conn)
    }

    /// Connection over the session in `SF_INSTANCE_URL`/`SF_ACCESS_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let credentials = SalesforceCredentials::from_env()
            .map_err(|e| Error::with_source(ErrorKind::Auth(e.to_string()), e))?;
        Self::from_credentials(credentials, ConnectionConfig::from_env())
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Username/password login through the SOAP endpoint of the login host.
    ///
    /// On rejection the error is [`ErrorKind::Auth`] and any existing session
    /// is kept.
    #[instrument(skip(self, password), fields(login_url = %self.config.login_url))]
    pub async fn login(&mut self, username: &str, password: &str) -> Result<SalesforceCredentials> {
        let credentials = SoapLogin::new(&self.config.login_url)
            .with_api_version(&self.config.api_version)
            .login(username, password)
            .await
            .map_err(into_auth)?;

        self.establish(credentials.clone());
        Ok(credentials)
    }

    /// Login through the OAuth 2.0 password grant of a connected app.
    #[instrument(skip(self, oauth, password), fields(login_url = %self.config.login_url))]
    pub async fn login_oauth(
        &mut self,
        oauth: &OAuthClient,
        username: &str,
        password: &str,
    ) -> Result<SalesforceCredentials> {
        let token = oauth
            .password_login(username, password, &self.config.login_url)
            .await
            .map_err(into_auth)?;

        let credentials = token.to_credentials(&self.config.api_version);
        self.establish(credentials.clone());
        Ok(credentials)
    }

    /// Revoke the session and drop it.
    ///
    /// The connection is unauthenticated afterwards even when revocation
    /// fails; that failure is still reported.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<()> {
        let session = self.session.take().ok_or_else(Error::not_authenticated)?;

        if let Err(err) = session.credentials.revoke(&self.config.login_url).await {
            warn!(error = %err, "token revocation failed");
            return Err(Error::with_source(
                ErrorKind::Transport(format!("logout could not revoke the session: {err}")),
                err,
            ));
        }
        info!("logged out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn credentials(&self) -> Option<&SalesforceCredentials> {
        self.session.as_ref().map(|s| &s.credentials)
    }

    pub fn instance_url(&self) -> Option<&str> {
        self.credentials().map(|c| c.instance_url())
    }

    /// Proxy for one sobject type.
    pub fn sobject(&self, name: impl Into<String>) -> SObject {
        SObject::new(self.client(), name)
    }

    /// Single-page cursor with default options.
    pub fn query(&self, soql: impl Into<String>) -> QueryCursor {
        self.query_with(soql, QueryOptions::default())
    }

    pub fn query_with(&self, soql: impl Into<String>, options: QueryOptions) -> QueryCursor {
        QueryCursor::new(self.client(), soql, options)
    }

    /// Cursor that continues from a `nextRecordsUrl` of an earlier page.
    ///
    /// Only locators on this org's REST API path are accepted.
    pub fn query_more(&self, next_records_url: &str) -> Result<QueryCursor> {
        if !next_records_url.starts_with("/services/data/") || next_records_url.contains("..") {
            return Err(Error::invalid_input(format!(
                "'{next_records_url}' is not a query locator"
            )));
        }
        Ok(QueryCursor::resume(
            self.client(),
            next_records_url,
            QueryOptions::default(),
        ))
    }

    /// Every sobject type visible to the session, without field lists.
    #[instrument(skip(self))]
    pub async fn describe_global(&self) -> Result<DescribeGlobalResult> {
        let client = self.client().ok_or_else(Error::not_authenticated)?;
        Ok(client.rest_get("sobjects").await?)
    }

    /// Shorthand for `self.sobject(name).describe()`.
    pub async fn describe(&self, name: &str) -> Result<DescribeSObjectResult> {
        self.sobject(name).describe().await
    }

    fn establish(&mut self, credentials: SalesforceCredentials) {
        let client = SalesforceClient::new(
            self.http.clone(),
            credentials.instance_url(),
            credentials.access_token(),
        )
        .with_api_version(credentials.api_version());

        info!(instance_url = %credentials.instance_url(), "session established");
        self.session = Some(Session {
            credentials,
            client,
        });
    }

    fn client(&self) -> Option<SalesforceClient> {
        self.session.as_ref().map(|s| s.client.clone())
    }
}

/// Login failures of any kind leave the caller without a session.
fn into_auth(err: forcelink_sf_auth::Error) -> Error {
    let message = err.to_string();
    let mut mapped = Error::from(err);
    if !mapped.is_auth() {
        mapped.kind = ErrorKind::Auth(message);
    }
    mapped
}
