//! Outgoing request description.
//!
//! A [`RequestBuilder`] is plain data so the retry loop can replay it.

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl RequestMethod {
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Put => reqwest::Method::PUT,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// Sending twice leaves the org as sending once. Only `POST` is not.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, RequestMethod::Post)
    }
}

/// A request to replay against the REST API: method, URL, headers, query
/// parameters and an optional JSON body.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    headers: Vec<(String, String)>,
    query_params: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    bearer_token: Option<String>,
}

impl RequestBuilder {
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            query_params: Vec::new(),
            body: None,
            bearer_token: None,
        }
    }

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// The URL without the parameters added through [`query`](Self::query).
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set a header, replacing an earlier value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Append a query parameter. Values are percent-encoded on send.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    /// `Sforce-Query-Options: batchSize=N`. Salesforce treats it as a hint
    /// and clamps it to 200..=2000.
    pub fn sforce_query_options(self, batch_size: u32) -> Self {
        self.header("Sforce-Query-Options", format!("batchSize={batch_size}"))
    }

    pub(crate) fn to_reqwest(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let mut req = client.request(self.method.to_reqwest(), &self.url);

        if let Some(token) = &self.bearer_token {
            req = req.bearer_auth(token);
        }
        for (name, value) in &self.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if !self.query_params.is_empty() {
            req = req.query(&self.query_params);
        }
        if let Some(body) = &self.body {
            req = req.json(body);
        }
        req
    }
}
