use std::sync::Once;

use forcelink::Connection;
use tracing_subscriber::EnvFilter;

use crate::fake_org::{FakeOrg, PASSWORD, USERNAME};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness; filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Logged-in connection to `org`.
pub async fn connect(org: &FakeOrg) -> Connection {
    init_tracing();
    let mut conn = Connection::new(org.config()).expect("connection builds");
    conn.login(USERNAME, PASSWORD)
        .await
        .expect("login to fake org should succeed");
    conn
}

/// Name unique to this run, for records created against a live org.
pub fn unique_name(prefix: &str) -> String {
    format!("{prefix} {}", chrono::Utc::now().timestamp_millis())
}
