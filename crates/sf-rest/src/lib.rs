//! # sf-rest
//!
//! Salesforce REST connection: paginated SOQL cursors and per-type record
//! operations.
//!
//! ## Features
//!
//! - **Connection** - SOAP or OAuth login, logout, `describeGlobal`
//! - **SObject proxies** - create, retrieve, update, delete, describe
//! - **External id upsert** - created/updated results, and an explicit
//!   [`ErrorKind::UpsertConflict`] when the key matches several records
//! - **Query cursors** - single page or auto-fetched pages with a record
//!   budget, consumed through an observer, a `Vec`, or a lazy stream
//!
//! ## Example
//!
//! ```rust,ignore
//! use forcelink_sf_rest::{Connection, ConnectionConfig, ErrorKind, QueryOptions};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), forcelink_sf_rest::Error> {
//!     let mut conn = Connection::new(ConnectionConfig::from_env())?;
//!     conn.login("user@example.com", "password+token").await?;
//!
//!     let accounts = conn.sobject("Account");
//!     let created = accounts.create(&json!({"Name": "Acme"})).await?;
//!
//!     match accounts.upsert(&json!({"ExtId__c": "A-1", "Name": "Acme"}), "ExtId__c").await {
//!         Ok(result) => println!("saved, new id: {:?}", result.id),
//!         Err(e) if matches!(e.kind, ErrorKind::UpsertConflict { .. }) => {
//!             println!("ambiguous key: {:?}", e.upsert_candidates());
//!         }
//!         Err(e) => return Err(e),
//!     }
//!
//!     let records = conn
//!         .query_with(
//!             "SELECT Id, Name FROM Account",
//!             QueryOptions::new().auto_fetch(true).max_fetch(5000),
//!         )
//!         .execute()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

mod connection;
mod describe;
mod error;
mod query;
mod record;
mod sobject;

pub use connection::{Connection, ConnectionConfig};
pub use describe::{
    DescribeGlobalResult, DescribeSObjectResult, FieldDescribe, PicklistValue, SObjectBasicInfo,
};
pub use error::{Error, ErrorKind, Result, SalesforceError};
pub use query::{CursorState, QueryCursor, QueryObserver, QueryOptions, QueryResult};
pub use record::{Record, RecordAttributes};
pub use sobject::{SaveResult, SObject};

// Session types callers need alongside a Connection.
pub use forcelink_sf_auth::{
    Credentials, OAuthClient, OAuthConfig, SalesforceCredentials, PRODUCTION_LOGIN_URL,
    SANDBOX_LOGIN_URL,
};
pub use forcelink_sf_client::{ClientConfig, RetryConfig};

#[cfg(test)]
pub(crate) fn test_client(instance_url: &str) -> forcelink_sf_client::SalesforceClient {
    let http = forcelink_sf_client::SfHttpClient::new(
        ClientConfig::builder().without_retry().build(),
    )
    .expect("http client builds");
    forcelink_sf_client::SalesforceClient::new(http, instance_url, "test-token")
}
