use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::domain::repository::EntityCache;
use crate::domain::types::{CacheGroup, Form, Recipient, User};

/// Entity cache plus the TTL every fill uses.
#[derive(Clone)]
pub struct Cached<C: EntityCache> {
    pub cache: C,
    pub ttl: Duration,
}

impl<C: EntityCache> Cached<C> {
    pub fn new(cache: C, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Undecodable entries count as misses.
    pub async fn probe<T: DeserializeOwned>(&self, group: CacheGroup, key: &str) -> Option<T> {
        let bytes = self.cache.get_by_key(group, key).await?;
        match bincode::deserialize(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, group = group.as_str(), key, "discarding undecodable cache entry");
                None
            }
        }
    }

    pub async fn fill<T: Serialize>(&self, group: CacheGroup, key: &str, value: &T) {
        match bincode::serialize(value) {
            Ok(bytes) => self.cache.set_by_key(group, key, bytes, self.ttl).await,
            Err(e) => warn!(error = %e, group = group.as_str(), key, "failed to encode cache entry"),
        }
    }

    pub async fn user(&self, id: impl ToString) -> Option<User> {
        self.probe(CacheGroup::Users, &id.to_string()).await
    }

    pub async fn fill_user(&self, user: &User) {
        self.fill(CacheGroup::Users, &user.id.to_string(), &user.embedded())
            .await;
    }

    /// Writes the form under its id and under its uuid.
    pub async fn fill_form(&self, form: &Form) {
        let form = form.embedded();
        self.fill(CacheGroup::Forms, &form.id.to_string(), &form).await;
        self.fill(CacheGroup::FormsByUuid, &uuid_key(&form.uuid), &form)
            .await;
    }

    pub async fn fill_recipient(&self, recipient: &Recipient) {
        self.fill(CacheGroup::Recipients, &recipient.id.to_string(), recipient)
            .await;
    }
}

pub fn uuid_key(uuid: &uuid::Uuid) -> String {
    uuid.simple().to_string()
}
