//! SOAP partner API username/password login.
//!
//! Posts a `login` call to `{login_url}/services/Soap/u/{version}` and turns
//! the returned `sessionId` and `serverUrl` into [`SalesforceCredentials`].
//! The password must have the security token appended when the org requires
//! one.

use tracing::{debug, instrument, warn};

use forcelink_sf_client::security::xml;

use crate::credentials::SalesforceCredentials;
use crate::error::{Error, ErrorKind, Result};

/// Username/password login through the SOAP partner endpoint.
#[derive(Debug, Clone)]
pub struct SoapLogin {
    login_url: String,
    api_version: String,
    http_client: reqwest::Client,
}

impl SoapLogin {
    /// Create a login client for the given login host
    /// (see [`PRODUCTION_LOGIN_URL`](crate::PRODUCTION_LOGIN_URL)).
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into().trim_end_matches('/').to_string(),
            api_version: forcelink_sf_client::DEFAULT_API_VERSION.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Set the API version used for the login endpoint and the session.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Use a preconfigured HTTP client (timeouts, proxies).
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// The SOAP login endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/services/Soap/u/{}", self.login_url, self.api_version)
    }

    /// Log in and return the established session.
    ///
    /// A SOAP fault (wrong password, locked user) is returned as
    /// [`ErrorKind::LoginFault`].
    #[instrument(skip(self, password), fields(login_url = %self.login_url))]
    pub async fn login(&self, username: &str, password: &str) -> Result<SalesforceCredentials> {
        if username.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "username must not be empty".to_string(),
            )));
        }

        let response = self
            .http_client
            .post(self.endpoint())
            .header("Content-Type", "text/xml; charset=UTF-8")
            .header("SOAPAction", "login")
            .body(login_envelope(username, password))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        if let Some((code, message)) = parse_fault(&body) {
            warn!(status, code = %code, "SOAP login rejected");
            return Err(Error::new(ErrorKind::LoginFault { code, message }));
        }

        if !(200..300).contains(&status) {
            return Err(Error::new(ErrorKind::Http(format!(
                "login endpoint returned {status}"
            ))));
        }

        let session_id = extract_element(&body, "sessionId").ok_or_else(|| {
            Error::new(ErrorKind::UnexpectedResponse("missing sessionId".to_string()))
        })?;
        let server_url = extract_element(&body, "serverUrl").ok_or_else(|| {
            Error::new(ErrorKind::UnexpectedResponse("missing serverUrl".to_string()))
        })?;

        let instance_url = instance_url_from_server_url(&server_url)?;
        debug!(instance_url = %instance_url, "SOAP login succeeded");

        Ok(SalesforceCredentials::new(
            instance_url,
            session_id,
            &self.api_version,
        ))
    }
}

fn login_envelope(username: &str, password: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/">
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{}</n1:username>
      <n1:password>{}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        xml::escape(username),
        xml::escape(password)
    )
}

/// `(faultcode, faultstring)` of a SOAP fault, with the `sf:` prefix dropped.
fn parse_fault(body: &str) -> Option<(String, String)> {
    let code = extract_element(body, "faultcode")?;
    let code = code.rsplit(':').next().unwrap_or(&code).to_string();
    let message = extract_element(body, "faultstring").unwrap_or_else(|| "Unknown error".to_string());
    Some((code, message))
}

/// Text content of the first `<tag>` or `<prefix:tag>` element.
fn extract_element(body: &str, tag: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find('<') {
        let open = search_from + offset;
        let close = open + body[open..].find('>')?;
        let raw = &body[open + 1..close];
        search_from = close + 1;

        if raw.starts_with('/') || raw.ends_with('/') {
            continue;
        }
        let name = raw.split_whitespace().next().unwrap_or_default();
        if name.rsplit(':').next() != Some(tag) {
            continue;
        }

        let end = body[search_from..].find(&format!("</{name}>"))?;
        return Some(unescape(&body[search_from..search_from + end]));
    }
    None
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// `https://na1.salesforce.com/services/Soap/u/62.0/00D...` -> `https://na1.salesforce.com`
fn instance_url_from_server_url(server_url: &str) -> Result<String> {
    let parsed = url::Url::parse(server_url)?;
    let host = parsed.host_str().ok_or_else(|| {
        Error::new(ErrorKind::UnexpectedResponse(
            "serverUrl has no host".to_string(),
        ))
    })?;

    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}
