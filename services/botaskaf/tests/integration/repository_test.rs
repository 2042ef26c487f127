use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use botaskaf::domain::repository::{FormRepository, RecipientRepository, UserRepository};
use botaskaf::domain::types::{FormDraft, RecipientDraft};
use botaskaf::infra::db::{DbFormRepository, DbRecipientRepository, DbUserRepository};
use botaskaf_domain::id::{FormId, RecipientId, UserId};
use botaskaf_domain::user::UserType;
use botaskaf_schema::{forms, recipients, users};

use crate::helpers::{TEST_SECRET, test_recipient_fields, test_settings};

fn form_model(id: i32, uuid: Uuid, user_id: Option<i32>) -> forms::Model {
    let now = Utc::now();
    forms::Model {
        id,
        uuid: uuid.simple().to_string(),
        user_id,
        secret: TEST_SECRET.into(),
        name: "Contact".into(),
        domain: "example.com".into(),
        description: None,
        created_at: now,
        updated_at: now,
        locked_at: None,
        locked_by: None,
        settings: serde_json::to_value(test_settings()).unwrap(),
    }
}

fn user_model(id: i32, user_type: i16) -> users::Model {
    let now = Utc::now();
    users::Model {
        id,
        user_type,
        email: format!("user{id}@example.com"),
        display_name: format!("User {id}"),
        password: Some("$argon2id$stub".into()),
        created_at: now,
        updated_at: now,
        last_seen: None,
        locked_at: None,
        locked_by: None,
        settings: serde_json::json!({}),
    }
}

fn count_row(form_id: i32, count: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([
        ("form_id", Value::Int(Some(form_id))),
        ("recipient_count", Value::BigInt(Some(count))),
    ])
}

fn draft(uuid: Uuid) -> FormDraft {
    FormDraft {
        uuid,
        secret: TEST_SECRET.into(),
        owner: UserId(1),
        name: "Contact".into(),
        domain: "example.com".into(),
        description: None,
        settings: test_settings(),
        created_at: Utc::now(),
    }
}

// ── forms ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_use_reported_insert_id_for_new_form() {
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_exec_results([MockExecResult {
            last_insert_id: 15,
            rows_affected: 1,
        }])
        .into_connection();
    let repo = DbFormRepository { db };

    let id = repo.create(&draft(Uuid::new_v4())).await.unwrap();

    assert_eq!(id, FormId(15));
}

#[tokio::test]
async fn should_look_up_form_by_uuid_when_driver_reports_no_id() {
    let uuid = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results([vec![form_model(21, uuid, Some(1))]])
        .into_connection();
    let repo = DbFormRepository { db };

    let id = repo.create(&draft(uuid)).await.unwrap();

    assert_eq!(id, FormId(21));
}

#[tokio::test]
async fn should_load_form_with_recipient_count() {
    let uuid = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![form_model(3, uuid, Some(1))]])
        .append_query_results([vec![count_row(3, 2)]])
        .into_connection();
    let repo = DbFormRepository { db };

    let record = repo.find_by_id(FormId(3)).await.unwrap().unwrap();

    assert_eq!(record.uuid, uuid);
    assert_eq!(record.owner_id, Some(UserId(1)));
    assert_eq!(record.recipient_count, 2);
    assert_eq!(record.settings, test_settings());
    assert!(record.lock.is_none());
}

#[tokio::test]
async fn should_return_none_for_unknown_uuid() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<forms::Model>::new()])
        .into_connection();
    let repo = DbFormRepository { db };

    assert!(repo.find_by_uuid(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn should_filter_form_list_by_owner_in_query() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![
            form_model(1, Uuid::new_v4(), Some(4)),
            form_model(2, Uuid::new_v4(), Some(4)),
        ]])
        .append_query_results([vec![count_row(2, 1)]])
        .into_connection();
    let repo = DbFormRepository { db: db.clone() };

    let records = repo.list(Some(UserId(4))).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].recipient_count, 0);
    assert_eq!(records[1].recipient_count, 1);

    let log = format!("{:?}", db.into_transaction_log());
    assert!(log.contains("WHERE"), "{log}");
    assert!(log.contains("user_id"), "{log}");
}

#[tokio::test]
async fn should_surface_store_failure_as_exec_error() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([sea_orm::DbErr::Custom("relation \"forms\" does not exist".into())])
        .into_connection();
    let repo = DbFormRepository { db };

    let err = repo.find_by_id(FormId(1)).await.unwrap_err();

    assert_eq!(err.kind(), "QUERY_EXEC_FAILED");
}

// ── users ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_map_stored_user_type_and_default_settings() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(2, 64)]])
        .into_connection();
    let repo = DbUserRepository { db };

    let user = repo.find_by_id(UserId(2)).await.unwrap().unwrap();

    assert_eq!(user.user_type, UserType::Administrator);
    assert_eq!(user.settings.locale, "en_US");
    assert!(user.is_admin());
}

#[tokio::test]
async fn should_return_password_hash_only_with_credentials() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(2, 16)]])
        .into_connection();
    let repo = DbUserRepository { db };

    let credentials = repo
        .find_credentials("user2@example.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(credentials.password_hash.as_deref(), Some("$argon2id$stub"));
    assert_eq!(credentials.user.user_type, UserType::Registered);
}

#[tokio::test]
async fn should_resolve_lock_holder_name() {
    let mut locked = user_model(3, 16);
    locked.locked_at = Some(Utc::now());
    locked.locked_by = Some(1);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![locked]])
        .append_query_results([vec![user_model(1, 127)]])
        .into_connection();
    let repo = DbUserRepository { db };

    let user = repo.find_by_id(UserId(3)).await.unwrap().unwrap();

    let lock = user.lock.unwrap();
    assert_eq!(lock.by, UserId(1));
    assert_eq!(lock.by_name, "User 1");
}

// ── recipients ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_look_up_recipient_by_form_and_address_when_no_id_reported() {
    let now = Utc::now();
    let fields = test_recipient_fields("sales@example.com");
    let stored = recipients::Model {
        id: 9,
        form_id: 2,
        from_name: fields.from_name.clone(),
        from_email: fields.from_email.clone(),
        to_name: fields.to_name.clone(),
        to_email: fields.to_email.clone(),
        subject: fields.subject.clone(),
        text: fields.text.clone(),
        html: None,
        settings: serde_json::json!({}),
        created_at: now,
        updated_at: None,
        locked_at: None,
        locked_by: None,
    };
    let db = MockDatabase::new(DatabaseBackend::MySql)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .append_query_results([vec![stored]])
        .into_connection();
    let repo = DbRecipientRepository { db };

    let id = repo
        .create(&RecipientDraft {
            form_id: FormId(2),
            fields,
            created_at: now,
        })
        .await
        .unwrap();

    assert_eq!(id, RecipientId(9));
}
