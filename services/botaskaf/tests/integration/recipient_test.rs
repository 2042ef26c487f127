use chrono::Utc;

use botaskaf::domain::types::{CacheGroup, Form};
use botaskaf::error::BotaskafError;
use botaskaf::usecase::form::{FormLookup, load_form};
use botaskaf::usecase::recipient::{
    CreateRecipientUseCase, GetRecipientUseCase, ListRecipientsUseCase,
};
use botaskaf_domain::id::{FormId, RecipientId};
use botaskaf_domain::user::UserType;

use crate::helpers::{
    MockCache, MockFormRepo, MockRecipientRepo, MockUserRepo, cached, test_form_record,
    test_recipient_fields, test_recipient_record, test_user,
};

fn recipients(records: Vec<botaskaf::domain::types::RecipientRecord>) -> MockRecipientRepo {
    let repo = MockRecipientRepo::default();
    *repo.records.lock().unwrap() = records;
    repo
}

#[tokio::test]
async fn should_embed_parent_form_and_cache_recipient_by_id() {
    let owner = test_user(1, UserType::Registered);
    let recipient_repo = recipients(vec![test_recipient_record(4, 2, "sales@example.com")]);
    let cache = MockCache::default();
    let usecase = GetRecipientUseCase {
        recipients: recipient_repo.clone(),
        forms: MockFormRepo::new(vec![test_form_record(2, Some(owner.id))]),
        users: MockUserRepo::new(vec![owner.clone()]),
        cached: cached(&cache),
    };

    let first = usecase.execute(&owner, FormId(2), RecipientId(4)).await.unwrap();
    let second = usecase.execute(&owner, FormId(2), RecipientId(4)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.form.id, FormId(2));
    assert!(first.form.urls.is_empty());
    assert_eq!(recipient_repo.find_count(), 1);
    assert!(cache.contains(CacheGroup::Recipients, "4"));
}

#[tokio::test]
async fn should_hide_recipient_of_another_form() {
    let owner = test_user(1, UserType::Registered);
    let usecase = GetRecipientUseCase {
        recipients: recipients(vec![test_recipient_record(4, 2, "sales@example.com")]),
        forms: MockFormRepo::new(vec![
            test_form_record(2, Some(owner.id)),
            test_form_record(3, Some(owner.id)),
        ]),
        users: MockUserRepo::new(vec![owner.clone()]),
        cached: cached(&MockCache::default()),
    };

    let result = usecase.execute(&owner, FormId(3), RecipientId(4)).await;
    assert!(matches!(result, Err(BotaskafError::RecipientNotFound)));

    // Once cached, the parent check still applies.
    usecase.execute(&owner, FormId(2), RecipientId(4)).await.unwrap();
    let result = usecase.execute(&owner, FormId(3), RecipientId(4)).await;
    assert!(matches!(result, Err(BotaskafError::RecipientNotFound)));
}

#[tokio::test]
async fn should_list_recipients_from_store_every_time() {
    let owner = test_user(1, UserType::Registered);
    let recipient_repo = recipients(vec![
        test_recipient_record(1, 2, "a@example.com"),
        test_recipient_record(2, 5, "b@example.com"),
        test_recipient_record(3, 2, "c@example.com"),
    ]);
    let usecase = ListRecipientsUseCase {
        recipients: recipient_repo.clone(),
        forms: MockFormRepo::new(vec![test_form_record(2, Some(owner.id))]),
        users: MockUserRepo::new(vec![owner.clone()]),
        cached: cached(&MockCache::default()),
    };

    let first = usecase.execute(&owner, FormId(2)).await.unwrap();
    usecase.execute(&owner, FormId(2)).await.unwrap();

    assert_eq!(first.iter().map(|r| r.id.0).collect::<Vec<_>>(), vec![1, 3]);
    assert!(first.iter().all(|r| r.form.id == FormId(2)));
    assert_eq!(recipient_repo.list_count(), 2);
}

#[tokio::test]
async fn should_forbid_recipients_of_foreign_form() {
    let owner = test_user(1, UserType::Registered);
    let stranger = test_user(2, UserType::Registered);
    let usecase = ListRecipientsUseCase {
        recipients: MockRecipientRepo::default(),
        forms: MockFormRepo::new(vec![test_form_record(2, Some(owner.id))]),
        users: MockUserRepo::new(vec![owner, stranger.clone()]),
        cached: cached(&MockCache::default()),
    };

    let result = usecase.execute(&stranger, FormId(2)).await;
    assert!(matches!(result, Err(BotaskafError::Forbidden)));
}

#[tokio::test]
async fn should_create_recipient_and_recache_parent_count() {
    let owner = test_user(1, UserType::Registered);
    let forms = MockFormRepo::new(vec![test_form_record(2, Some(owner.id))]);
    let users = MockUserRepo::new(vec![owner.clone()]);
    let recipient_repo = MockRecipientRepo::default();
    let cache = MockCache::default();
    let usecase = CreateRecipientUseCase {
        recipients: recipient_repo.clone(),
        forms: forms.clone(),
        users: users.clone(),
        cached: cached(&cache),
    };

    let recipient = usecase
        .execute(&owner, FormId(2), test_recipient_fields("sales@example.com"), Utc::now())
        .await
        .unwrap();

    assert!(recipient.is_valid());
    assert_eq!(recipient.subject, "New message");
    assert_eq!(recipient.form.recipient_count, 1);
    assert_eq!(recipient_repo.records.lock().unwrap().len(), 1);
    assert!(cache.contains(CacheGroup::Recipients, &recipient.id.to_string()));

    let finds_before = forms.find_count();
    let form: Form = load_form(&forms, &users, &cached(&cache), FormLookup::Id(FormId(2)), None)
        .await
        .unwrap();
    assert_eq!(form.recipient_count, 1);
    assert_eq!(forms.find_count(), finds_before);
}

#[tokio::test]
async fn should_reject_recipient_without_body() {
    let owner = test_user(1, UserType::Registered);
    let recipient_repo = MockRecipientRepo::default();
    let usecase = CreateRecipientUseCase {
        recipients: recipient_repo.clone(),
        forms: MockFormRepo::new(vec![test_form_record(2, Some(owner.id))]),
        users: MockUserRepo::new(vec![owner.clone()]),
        cached: cached(&MockCache::default()),
    };
    let mut fields = test_recipient_fields("sales@example.com");
    fields.text = None;

    let result = usecase.execute(&owner, FormId(2), fields, Utc::now()).await;

    assert!(matches!(result, Err(BotaskafError::Validation(_))));
    assert!(recipient_repo.records.lock().unwrap().is_empty());
}
