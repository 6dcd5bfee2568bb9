//! # sf-auth
//!
//! Session acquisition for Salesforce.
//!
//! ## Security
//!
//! - Tokens, session ids and secrets are redacted in Debug output
//! - Tracing spans skip password and token parameters
//! - Error messages are sanitized before they carry any transport detail
//!
//! ## Supported methods
//!
//! - **SOAP username/password login** ([`SoapLogin`]) - no connected app needed
//! - **OAuth 2.0 password grant** ([`OAuthClient::password_login`])
//! - **OAuth 2.0 refresh and revoke**
//! - **Existing session** from environment variables
//!   ([`SalesforceCredentials::from_env`])
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcelink_sf_auth::{SoapLogin, PRODUCTION_LOGIN_URL};
//!
//! let creds = SoapLogin::new(PRODUCTION_LOGIN_URL)
//!     .login("user@example.com", "password+securitytoken")
//!     .await?;
//! ```

mod credentials;
mod error;
mod oauth;
mod soap;

pub use credentials::{Credentials, SalesforceCredentials};
pub use error::{Error, ErrorKind, Result};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse};
pub use soap::SoapLogin;

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
