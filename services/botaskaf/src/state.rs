use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::infra::cache::AppCache;
use crate::infra::db::{DbFormRepository, DbRecipientRepository, DbUserRepository};
use crate::usecase::cache::Cached;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub cache: AppCache,
    pub cache_ttl: Duration,
    /// Oldest contact form token still accepted.
    pub token_max_age: chrono::Duration,
    pub setup_token: Option<String>,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn form_repo(&self) -> DbFormRepository {
        DbFormRepository {
            db: self.db.clone(),
        }
    }

    pub fn recipient_repo(&self) -> DbRecipientRepository {
        DbRecipientRepository {
            db: self.db.clone(),
        }
    }

    pub fn cached(&self) -> Cached<AppCache> {
        Cached::new(self.cache.clone(), self.cache_ttl)
    }
}
