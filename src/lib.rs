//! # forcelink
//!
//! A Salesforce REST client for Rust: paginated query cursors, per-type
//! record operations and external id upsert with explicit conflict reporting.
//!
//! ## Security
//!
//! - Sensitive data (tokens, session ids, secrets) is redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages are sanitized before they carry any response text
//!
//! ## Crates
//!
//! - **forcelink-sf-client** - HTTP transport with retry, compression, rate limiting
//! - **forcelink-sf-auth** - Session acquisition: SOAP login, OAuth 2.0 password grant, revoke
//! - **forcelink-sf-rest** - Connection, SObject proxies, query cursors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forcelink::{Connection, ConnectionConfig, QueryOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut conn = Connection::new(ConnectionConfig::from_env())?;
//!     conn.login("user@example.com", "password+securitytoken").await?;
//!
//!     let mut cursor = conn.query_with(
//!         "SELECT Id, Name FROM Account",
//!         QueryOptions::new().auto_fetch(true),
//!     );
//!     for account in cursor.execute().await? {
//!         println!("{:?}", account.get_str("Name"));
//!     }
//!
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use forcelink_sf_auth as auth;
#[cfg(feature = "client")]
pub use forcelink_sf_client as client;
#[cfg(feature = "rest")]
pub use forcelink_sf_rest as rest;

#[cfg(feature = "auth")]
pub use forcelink_sf_auth::{Credentials, SalesforceCredentials, SoapLogin};
#[cfg(feature = "client")]
pub use forcelink_sf_client::{ClientConfig, SalesforceClient};
#[cfg(feature = "rest")]
pub use forcelink_sf_rest::{
    Connection, ConnectionConfig, ErrorKind, QueryCursor, QueryObserver, QueryOptions, Record,
    SObject, SaveResult,
};
