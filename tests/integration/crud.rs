//! SObject proxy tests against the fake org.

use forcelink::{Connection, ErrorKind};
use serde::Serialize;
use serde_json::json;

use super::common::{connect, init_tracing};
use super::fake_org::{FakeOrg, USERNAME};

#[derive(Serialize)]
struct NewAccount<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Phone")]
    phone: &'a str,
    #[serde(rename = "NumberOfEmployees")]
    employees: u32,
}

#[tokio::test]
async fn test_create_then_retrieve_returns_same_fields() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;
    let accounts = conn.sobject("Account");

    let input = NewAccount {
        name: "Acme Corp",
        phone: "555-0100",
        employees: 42,
    };
    let created = accounts.create(&input).await.expect("create should succeed");
    let id = created.id.expect("create returns an id");

    let record = accounts.retrieve(&id).await.expect("retrieve should succeed");
    assert_eq!(record.id(), Some(id.as_str()));
    assert_eq!(record.sobject_type().as_deref(), Some("Account"));
    assert_eq!(record.get_str("Name"), Some("Acme Corp"));
    assert_eq!(record.get_str("Phone"), Some("555-0100"));
    assert_eq!(record.get("NumberOfEmployees"), Some(&json!(42)));
}

#[tokio::test]
async fn test_update_is_visible_on_retrieve() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;
    let accounts = conn.sobject("Account");

    let id = accounts
        .create(&json!({"Name": "Before"}))
        .await
        .unwrap()
        .id
        .unwrap();

    let result = accounts
        .update(&json!({"Id": id, "Name": "After", "Industry": "Energy"}))
        .await
        .expect("update should succeed");
    assert!(result.success);
    assert_eq!(result.id.as_deref(), Some(id.as_str()));

    let record = accounts.retrieve(&id).await.unwrap();
    assert_eq!(record.get_str("Name"), Some("After"));
    assert_eq!(record.get_str("Industry"), Some("Energy"));
}

#[tokio::test]
async fn test_deleted_record_is_not_found() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;
    let accounts = conn.sobject("Account");

    let id = accounts
        .create(&json!({"Name": "Short lived"}))
        .await
        .unwrap()
        .id
        .unwrap();

    let result = accounts.del(&id).await.expect("delete should succeed");
    assert!(result.success);

    let err = accounts.retrieve(&id).await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    assert_eq!(org.count("Account"), 0);
}

#[tokio::test]
async fn test_upsert_creates_once_then_updates() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;
    let orders = conn.sobject("Order__c");

    let first = orders
        .upsert(&json!({"ExtId__c": "ORD-1", "Amount__c": "10"}), "ExtId__c")
        .await
        .expect("first upsert should create");
    let created_id = first.id.expect("created upsert returns an id");

    let second = orders
        .upsert(&json!({"ExtId__c": "ORD-1", "Amount__c": "25"}), "ExtId__c")
        .await
        .expect("second upsert should update");
    assert!(second.success);
    assert_eq!(second.id, None);

    assert_eq!(org.count("Order__c"), 1);
    let record = orders.retrieve(&created_id).await.unwrap();
    assert_eq!(record.get_str("Amount__c"), Some("25"));
}

#[tokio::test]
async fn test_upsert_on_duplicated_external_id_reports_candidates() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;

    let a = org.insert_raw("Order__c", json!({"ExtId__c": "DUP-1"}));
    let b = org.insert_raw("Order__c", json!({"ExtId__c": "DUP-1"}));

    let err = conn
        .sobject("Order__c")
        .upsert(&json!({"ExtId__c": "DUP-1", "Amount__c": "1"}), "ExtId__c")
        .await
        .unwrap_err();

    let candidates = err.upsert_candidates().expect("conflict carries candidates");
    assert_eq!(candidates, [a, b]);
    assert!(err.validation_errors().is_empty());
    assert_eq!(org.count("Order__c"), 2);
}

#[tokio::test]
async fn test_create_missing_required_field_is_validation() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;

    let err = conn
        .sobject("Account")
        .create(&json!({"Phone": "555-0100"}))
        .await
        .unwrap_err();

    match &err.kind {
        ErrorKind::Validation { errors } => {
            assert_eq!(errors[0].error_code, "REQUIRED_FIELD_MISSING");
            assert_eq!(errors[0].fields, vec!["Name"]);
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_create_unknown_field_is_validation() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;

    let err = conn
        .sobject("Account")
        .create(&json!({"Name": "x", "NoSuchField__c": 1}))
        .await
        .unwrap_err();
    assert_eq!(err.validation_errors()[0].error_code, "INVALID_FIELD");
}

#[tokio::test]
async fn test_create_on_unknown_type_is_validation() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;

    let err = conn
        .sobject("Nonexistent__c")
        .create(&json!({"Name": "x"}))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Validation { .. }));
}

#[tokio::test]
async fn test_describe_lists_fields() {
    let org = FakeOrg::start().await;
    let conn = connect(&org).await;

    let describe = conn.sobject("Order__c").describe().await.unwrap();
    assert_eq!(describe.name, "Order__c");
    assert!(describe.custom);
    let ext: Vec<&str> = describe
        .external_id_fields()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(ext, vec!["ExtId__c"]);
}

#[tokio::test]
async fn test_no_session_means_no_requests() {
    init_tracing();
    let org = FakeOrg::start().await;
    let conn = Connection::new(org.config()).unwrap();

    let accounts = conn.sobject("Account");
    assert!(accounts.create(&json!({"Name": "x"})).await.unwrap_err().is_auth());
    assert!(accounts.retrieve("001000000000001AAA").await.unwrap_err().is_auth());
    assert!(accounts
        .upsert(&json!({"ExtId__c": "E"}), "ExtId__c")
        .await
        .unwrap_err()
        .is_auth());
    assert!(conn.describe_global().await.unwrap_err().is_auth());

    assert_eq!(org.data_requests(), 0);
}

#[tokio::test]
async fn test_wrong_password_is_auth_error() {
    init_tracing();
    let org = FakeOrg::start().await;
    let mut conn = Connection::new(org.config()).unwrap();

    let err = conn.login(USERNAME, "not-the-password").await.unwrap_err();
    assert!(err.is_auth());
    assert!(!conn.is_authenticated());
}

#[tokio::test]
async fn test_revoked_session_is_auth_error() {
    let org = FakeOrg::start().await;
    let mut conn = connect(&org).await;
    let accounts = conn.sobject("Account");

    conn.logout().await.expect("logout should succeed");

    // The proxy still holds the old token, which the org now rejects.
    let err = accounts.create(&json!({"Name": "x"})).await.unwrap_err();
    assert!(err.is_auth());
}
