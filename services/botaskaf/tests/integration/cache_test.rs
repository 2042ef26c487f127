use std::time::Duration;

use botaskaf::domain::types::{CacheGroup, Form, Recipient, User};
use botaskaf::infra::cache::{AppCache, MemoryEntityCache};
use botaskaf::usecase::cache::{Cached, uuid_key};

use crate::helpers::{MockCache, cached, full_form, full_recipient, full_user};

#[tokio::test]
async fn should_round_trip_user_with_every_attribute() {
    let cache = cached(&MockCache::default());
    let user = full_user(4);

    cache.fill_user(&user).await;

    let restored: User = cache.user(user.id).await.unwrap();
    assert_eq!(restored, user);
    assert!(restored.lock.is_some());
    assert!(restored.last_seen.is_some());
}

#[tokio::test]
async fn should_round_trip_form_with_owner_under_both_keys() {
    let cache = cached(&MockCache::default());
    let form = full_form(8, full_user(4));

    cache.fill_form(&form).await;

    let by_id: Form = cache
        .probe(CacheGroup::Forms, &form.id.to_string())
        .await
        .unwrap();
    let by_uuid: Form = cache
        .probe(CacheGroup::FormsByUuid, &uuid_key(&form.uuid))
        .await
        .unwrap();
    assert_eq!(by_id, form);
    assert_eq!(by_uuid, form);
}

#[tokio::test]
async fn should_round_trip_recipient_with_embedded_form_and_owner() {
    let cache = Cached::new(
        AppCache::Memory(MemoryEntityCache::new()),
        Duration::from_secs(60),
    );
    let recipient = full_recipient(12, full_form(8, full_user(4)));

    cache.fill_recipient(&recipient).await;

    let restored: Recipient = cache
        .probe(CacheGroup::Recipients, &recipient.id.to_string())
        .await
        .unwrap();
    assert_eq!(restored, recipient);
    assert_eq!(restored.form.owner, recipient.form.owner);
    assert!(restored.settings.reply_to.is_some());
}

#[tokio::test]
async fn should_not_carry_viewer_urls_into_cache() {
    let cache = cached(&MockCache::default());
    let owner = full_user(4);
    let form = full_form(8, owner.clone()).with_urls(Some(&owner));
    assert!(!form.urls.is_empty());

    cache.fill_form(&form).await;

    let restored: Form = cache
        .probe(CacheGroup::Forms, &form.id.to_string())
        .await
        .unwrap();
    assert!(restored.urls.is_empty());
    assert_eq!(restored, form.embedded());
}
