#![allow(async_fn_in_trait)]

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use botaskaf_domain::id::{FormId, RecipientId, UserId};

use crate::domain::types::{
    CacheGroup, FormDraft, FormRecord, RecipientDraft, RecipientRecord, User, UserCredentials,
    UserDraft,
};
use crate::error::BotaskafError;

/// Relational store for accounts.
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, BotaskafError>;

    /// Lookup for login. `email` is matched lower-cased.
    async fn find_credentials(&self, email: &str)
    -> Result<Option<UserCredentials>, BotaskafError>;

    async fn list(&self) -> Result<Vec<User>, BotaskafError>;

    /// Insert and return the assigned id.
    async fn create(&self, draft: &UserDraft) -> Result<UserId, BotaskafError>;

    async fn update_last_seen(&self, id: UserId, at: DateTime<Utc>)
    -> Result<(), BotaskafError>;
}

/// Relational store for forms. Records carry the live recipient count.
pub trait FormRepository: Send + Sync {
    async fn find_by_id(&self, id: FormId) -> Result<Option<FormRecord>, BotaskafError>;

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<FormRecord>, BotaskafError>;

    /// `owner = None` returns every form; otherwise only forms owned by `owner`,
    /// filtered in the query itself.
    async fn list(&self, owner: Option<UserId>) -> Result<Vec<FormRecord>, BotaskafError>;

    async fn create(&self, draft: &FormDraft) -> Result<FormId, BotaskafError>;
}

/// Relational store for recipients.
pub trait RecipientRepository: Send + Sync {
    async fn find_by_id(&self, id: RecipientId)
    -> Result<Option<RecipientRecord>, BotaskafError>;

    async fn list_by_form(&self, form_id: FormId) -> Result<Vec<RecipientRecord>, BotaskafError>;

    async fn create(&self, draft: &RecipientDraft) -> Result<RecipientId, BotaskafError>;
}

/// Look-aside entity cache. Best effort: outages read as misses and writes
/// are dropped, so neither operation can fail.
pub trait EntityCache: Send + Sync {
    async fn get_by_key(&self, group: CacheGroup, key: &str) -> Option<Vec<u8>>;

    async fn set_by_key(&self, group: CacheGroup, key: &str, value: Vec<u8>, ttl: Duration);
}
