//! Query cursor tests against the fake org.

use forcelink::rest::{CursorState, Error, QueryObserver, Record};
use forcelink::client::security::soql;
use forcelink::{Connection, QueryOptions};
use serde_json::json;
use futures::TryStreamExt;

use super::common::{connect, init_tracing};
use super::fake_org::FakeOrg;

const ACCOUNTS: &str = "SELECT Id, Name FROM Account";

/// Observer that checks delivery order and counts notifications.
#[derive(Default)]
struct Tally {
    records: u64,
    last_index: Option<u64>,
    max_total_size: u64,
    ends: Vec<(u64, u64)>,
    errors: Vec<Error>,
}

impl QueryObserver for Tally {
    fn on_record(&mut self, record: Record, index: u64, total_size: u64) {
        assert!(record.id().is_some());
        assert!(
            self.ends.is_empty() && self.errors.is_empty(),
            "record after completion"
        );
        assert_eq!(index, self.last_index.map_or(0, |i| i + 1));
        self.last_index = Some(index);
        self.max_total_size = self.max_total_size.max(total_size);
        self.records += 1;
        assert!(self.records <= total_size);
    }

    fn on_end(&mut self, total_size: u64, total_fetched: u64) {
        self.ends.push((total_size, total_fetched));
    }

    fn on_error(&mut self, error: Error) {
        self.errors.push(error);
    }
}

#[tokio::test]
async fn test_single_page_when_auto_fetch_is_off() {
    let org = FakeOrg::start().await;
    org.seed("Account", 2500);
    let conn = connect(&org).await;

    let mut cursor = conn.query(ACCOUNTS);
    let mut tally = Tally::default();
    cursor.run(&mut tally).await;

    assert_eq!(tally.records, 2000);
    assert_eq!(tally.ends, vec![(2500, 2000)]);
    assert!(tally.errors.is_empty());
    assert_eq!(cursor.total_size(), 2500);
    assert_eq!(cursor.total_fetched(), 2000);
    assert_eq!(cursor.state(), CursorState::Done);
}

#[tokio::test]
async fn test_auto_fetch_stops_at_max_fetch() {
    let org = FakeOrg::start().await;
    org.seed("Account", 7300);
    let conn = connect(&org).await;

    let mut cursor = conn.query_with(
        ACCOUNTS,
        QueryOptions::new().auto_fetch(true).max_fetch(5000),
    );
    let mut tally = Tally::default();
    cursor.run(&mut tally).await;

    assert_eq!(tally.records, 5000);
    assert_eq!(tally.ends, vec![(7300, 5000)]);
    assert_eq!(cursor.total_fetched(), 5000);
    assert_eq!(tally.max_total_size, 7300);
}

#[tokio::test]
async fn test_auto_fetch_without_budget_reads_everything_once() {
    let org = FakeOrg::start().await;
    org.seed("Account", 4100);
    let conn = connect(&org).await;

    let mut cursor = conn.query_with(ACCOUNTS, QueryOptions::new().auto_fetch(true));
    let mut tally = Tally::default();
    cursor.run(&mut tally).await;

    assert_eq!(tally.records, 4100);
    assert_eq!(tally.ends.len(), 1);
    assert_eq!(cursor.total_fetched(), cursor.total_size());
    assert_eq!(cursor.next_records_url(), None);
}

#[tokio::test]
async fn test_budget_smaller_than_result_with_small_pages() {
    let org = FakeOrg::start().await;
    org.seed("Account", 50);
    org.set_page_size(7);
    let conn = connect(&org).await;

    let records = conn
        .query_with(ACCOUNTS, QueryOptions::new().auto_fetch(true).max_fetch(20))
        .execute()
        .await
        .unwrap();

    assert_eq!(records.len(), 20);
    assert_eq!(records[19].get_str("Name"), Some("Seed Account 19"));
}

#[tokio::test]
async fn test_batch_size_option_sets_page_size() {
    let org = FakeOrg::start().await;
    org.seed("Account", 30);
    let conn = connect(&org).await;

    let mut cursor = conn.query_with(ACCOUNTS, QueryOptions::new().batch_size(10));
    let records = cursor.execute().await.unwrap();

    assert_eq!(records.len(), 10);
    assert_eq!(cursor.total_size(), 30);
}

#[tokio::test]
async fn test_stream_matches_execute() {
    let org = FakeOrg::start().await;
    org.seed("Account", 25);
    org.set_page_size(10);
    let conn = connect(&org).await;
    let options = QueryOptions::new().auto_fetch(true);

    let collected = conn
        .query_with(ACCOUNTS, options.clone())
        .execute()
        .await
        .unwrap();

    let mut cursor = conn.query_with(ACCOUNTS, options);
    let streamed: Vec<Record> = cursor.records().try_collect().await.unwrap();

    assert_eq!(streamed, collected);
    assert_eq!(streamed.len(), 25);
}

#[tokio::test]
async fn test_failure_mid_query_keeps_delivered_records() {
    let org = FakeOrg::start().await;
    org.seed("Account", 30);
    org.set_page_size(10);
    org.fail_locators();
    let conn = connect(&org).await;

    let mut cursor = conn.query_with(ACCOUNTS, QueryOptions::new().auto_fetch(true));
    let mut tally = Tally::default();
    cursor.run(&mut tally).await;

    assert_eq!(tally.records, 10);
    assert!(tally.ends.is_empty());
    assert_eq!(tally.errors.len(), 1);
    assert_eq!(cursor.state(), CursorState::Done);

    let mut cursor = conn.query_with(ACCOUNTS, QueryOptions::new().auto_fetch(true));
    let items: Vec<Result<Record, Error>> = futures::StreamExt::collect(cursor.records()).await;
    assert_eq!(items.len(), 11);
    assert!(items[..10].iter().all(Result::is_ok));
    assert!(items[10].is_err());
}

#[tokio::test]
async fn test_resume_with_query_more() {
    let org = FakeOrg::start().await;
    org.seed("Account", 2500);
    let conn = connect(&org).await;

    let mut first = conn.query(ACCOUNTS);
    let page = first.execute().await.unwrap();
    let locator = first.next_records_url().expect("more rows remain").to_string();

    let rest = conn.query_more(&locator).unwrap().execute().await.unwrap();

    assert_eq!(page.len() + rest.len(), 2500);
    assert_eq!(rest[0].get_str("Name"), Some("Seed Account 2000"));
}

#[tokio::test]
async fn test_query_all_includes_deleted_rows() {
    let org = FakeOrg::start().await;
    org.seed("Account", 3);
    let conn = connect(&org).await;

    let accounts = conn.query(ACCOUNTS).execute().await.unwrap();
    let id = accounts[0].id().unwrap().to_string();
    conn.sobject("Account").delete(&id).await.unwrap();

    let live = conn.query(ACCOUNTS).execute().await.unwrap();
    let all = conn
        .query_with(ACCOUNTS, QueryOptions::new().include_deleted(true))
        .execute()
        .await
        .unwrap();
    assert_eq!((live.len(), all.len()), (2, 3));
}

#[tokio::test]
async fn test_empty_result_ends_cleanly() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;

    let mut cursor = conn.query_with(ACCOUNTS, QueryOptions::new().auto_fetch(true));
    let mut tally = Tally::default();
    cursor.run(&mut tally).await;

    assert_eq!(tally.ends, vec![(0, 0)]);
    assert_eq!(tally.records, 0);
}

#[tokio::test]
async fn test_invalid_query_is_validation() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;

    let err = conn
        .query("SELECT Id FROM NoSuchType")
        .execute()
        .await
        .unwrap_err();
    assert_eq!(err.validation_errors()[0].error_code, "INVALID_TYPE");
}

#[tokio::test]
async fn test_query_without_session_sends_nothing() {
    init_tracing();
    let org = FakeOrg::start().await;
    let conn = Connection::new(org.config()).unwrap();

    let mut tally = Tally::default();
    conn.query(ACCOUNTS).run(&mut tally).await;

    assert_eq!(tally.errors.len(), 1);
    assert!(tally.errors[0].is_auth());
    assert_eq!(org.data_requests(), 0);
}

#[tokio::test]
async fn test_describe_global_entries_carry_no_field_lists() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;

    let global = conn.describe_global().await.unwrap();
    assert!(!global.sobjects.is_empty());
    for entry in &global.sobjects {
        assert!(!entry.name.is_empty());
        assert!(!entry.label.is_empty());
        let json = serde_json::to_value(entry).unwrap();
        assert!(json.get("fields").is_none());
    }
}

#[tokio::test]
async fn test_quoted_name_filter() {
    let org = FakeOrg::start().await;
    org.seed("Account", 5);
    let conn = connect(&org).await;
    let name = r"O'Brien \ Sons";
    conn.sobject("Account")
        .create(&json!({"Name": name}))
        .await
        .unwrap();

    let soql = format!(
        "SELECT Id, Name FROM Account WHERE Name = '{}'",
        soql::escape_string(name)
    );
    let records = conn.query(&soql).execute().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get_str("Name"), Some(name));
}
