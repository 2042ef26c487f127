use chrono::{Duration, Utc};
use uuid::Uuid;

use botaskaf::error::BotaskafError;
use botaskaf::usecase::form::{CreateFormInput, CreateFormUseCase, GetFormUseCase};
use botaskaf::usecase::token::{IssueTokenUseCase, VerifyTokenUseCase};
use botaskaf_cipher::{CipherError, decrypt, encrypt};
use botaskaf_domain::user::UserType;

use crate::helpers::{
    MockCache, MockFormRepo, MockUserRepo, TEST_SECRET, cached, test_form_record, test_settings,
    test_user,
};

fn verifier(forms: MockFormRepo, cache: &MockCache) -> VerifyTokenUseCase<MockFormRepo, MockUserRepo, MockCache> {
    VerifyTokenUseCase {
        forms,
        users: MockUserRepo::default(),
        cached: cached(cache),
        max_age: Duration::hours(1),
    }
}

#[tokio::test]
async fn should_issue_token_for_created_form_and_resolve_it_by_uuid() {
    let owner = test_user(1, UserType::Registered);
    let forms = MockFormRepo::default();
    let users = MockUserRepo::new(vec![owner.clone()]);
    let cache = MockCache::default();

    let created = CreateFormUseCase {
        forms: forms.clone(),
        cached: cached(&cache),
    }
    .execute(
        &owner,
        CreateFormInput {
            name: "Contact".into(),
            domain: "example.com".into(),
            description: None,
            settings: test_settings(),
        },
        Utc::now(),
    )
    .await
    .unwrap();

    let get = GetFormUseCase {
        forms: forms.clone(),
        users: users.clone(),
        cached: cached(&cache),
    };
    let by_uuid = get.execute_by_uuid(created.uuid, Some(&owner)).await.unwrap();
    let by_id = get.execute(&owner, created.id).await.unwrap();
    assert_eq!(by_uuid, by_id);
    assert_eq!(by_id.owner_id(), Some(owner.id));
    assert_eq!(forms.find_count(), 0);

    let anonymous = get.execute_by_uuid(created.uuid, None).await.unwrap();
    assert_eq!(anonymous, by_id.embedded());

    let now = Utc::now();
    let token = IssueTokenUseCase {
        forms: forms.clone(),
        users,
        cached: cached(&cache),
    }
    .execute(created.uuid, now)
    .await
    .unwrap();

    let (nonce, body) = token.split_once(':').unwrap();
    assert_eq!(nonce.len(), 24);
    assert!(!body.is_empty());
    assert_eq!(
        decrypt(&created.secret, &token).unwrap().timestamp_millis(),
        now.timestamp_millis()
    );

    let issued = verifier(forms, &cache)
        .execute(created.uuid, &token, now + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(issued.timestamp_millis(), now.timestamp_millis());
}

#[tokio::test]
async fn should_fail_to_issue_for_unknown_form() {
    let usecase = IssueTokenUseCase {
        forms: MockFormRepo::default(),
        users: MockUserRepo::default(),
        cached: cached(&MockCache::default()),
    };

    let result = usecase.execute(Uuid::new_v4(), Utc::now()).await;

    assert!(matches!(result, Err(BotaskafError::FormNotFound)));
}

#[tokio::test]
async fn should_refuse_token_for_form_without_secret() {
    let mut record = test_form_record(1, None);
    record.secret = String::new();
    let uuid = record.uuid;
    let usecase = IssueTokenUseCase {
        forms: MockFormRepo::new(vec![record]),
        users: MockUserRepo::default(),
        cached: cached(&MockCache::default()),
    };

    let result = usecase.execute(uuid, Utc::now()).await;

    assert!(matches!(
        result,
        Err(BotaskafError::Cipher(CipherError::InvalidSecret))
    ));
}

#[tokio::test]
async fn should_accept_small_future_skew_and_reject_larger() {
    let record = test_form_record(1, None);
    let uuid = record.uuid;
    let forms = MockFormRepo::new(vec![record]);
    let cache = MockCache::default();
    let now = Utc::now();

    let slightly_ahead = encrypt(TEST_SECRET, now + Duration::seconds(30)).unwrap();
    let far_ahead = encrypt(TEST_SECRET, now + Duration::minutes(5)).unwrap();

    let usecase = verifier(forms, &cache);
    assert!(usecase.execute(uuid, &slightly_ahead, now).await.is_ok());
    assert!(matches!(
        usecase.execute(uuid, &far_ahead, now).await,
        Err(BotaskafError::InvalidToken)
    ));
}

#[tokio::test]
async fn should_reject_expired_tampered_and_foreign_tokens() {
    let record = test_form_record(1, None);
    let uuid = record.uuid;
    let usecase = verifier(MockFormRepo::new(vec![record]), &MockCache::default());
    let now = Utc::now();

    let expired = encrypt(TEST_SECRET, now - Duration::hours(2)).unwrap();
    let foreign = encrypt("FFEEDDCCBBAA99887766554433221100", now).unwrap();
    let mut tampered = encrypt(TEST_SECRET, now).unwrap();
    let last = tampered.pop().unwrap();
    tampered.push(if last == '0' { '1' } else { '0' });

    for token in [expired.as_str(), foreign.as_str(), tampered.as_str(), "", "nope"] {
        assert!(
            matches!(
                usecase.execute(uuid, token, now).await,
                Err(BotaskafError::InvalidToken)
            ),
            "token {token:?} should be rejected"
        );
    }
}
