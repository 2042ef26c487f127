use chrono::{DateTime, Utc};
use tracing::info;

use botaskaf_auth_types::password::{hash_password, verify_password};
use botaskaf_domain::id::UserId;
use botaskaf_domain::user::UserType;

use crate::domain::repository::{EntityCache, UserRepository};
use crate::domain::settings::{UserSettings, is_valid_email};
use crate::domain::types::{User, UserDraft};
use crate::error::BotaskafError;
use crate::usecase::cache::Cached;

/// Cache-first account lookup. Fills the `users` group on a store hit.
pub async fn load_user<U, C>(
    users: &U,
    cached: &Cached<C>,
    id: UserId,
) -> Result<User, BotaskafError>
where
    U: UserRepository,
    C: EntityCache,
{
    if let Some(user) = cached.user(id).await {
        return Ok(user);
    }
    let user = users
        .find_by_id(id)
        .await?
        .ok_or(BotaskafError::UserNotFound)?;
    cached.fill_user(&user).await;
    Ok(user)
}

// ── ResolveViewer ────────────────────────────────────────────────────────────

/// Loads the account behind the gateway identity. Unknown, disabled and
/// invalid accounts are rejected.
pub struct ResolveViewerUseCase<U: UserRepository, C: EntityCache> {
    pub users: U,
    pub cached: Cached<C>,
}

impl<U: UserRepository, C: EntityCache> ResolveViewerUseCase<U, C> {
    pub async fn execute(&self, id: UserId) -> Result<User, BotaskafError> {
        let viewer = match load_user(&self.users, &self.cached, id).await {
            Ok(user) => user,
            Err(BotaskafError::UserNotFound) => return Err(BotaskafError::Unauthorized),
            Err(e) => return Err(e),
        };
        if !viewer.is_valid() || !viewer.user_type.can_log_in() {
            return Err(BotaskafError::Unauthorized);
        }
        Ok(viewer)
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<U: UserRepository, C: EntityCache> {
    pub users: U,
    pub cached: Cached<C>,
}

impl<U: UserRepository, C: EntityCache> GetUserUseCase<U, C> {
    pub async fn execute(&self, viewer: &User, id: UserId) -> Result<User, BotaskafError> {
        if viewer.id != id && !viewer.is_admin() {
            return Err(BotaskafError::Forbidden);
        }
        let user = load_user(&self.users, &self.cached, id).await?;
        Ok(user.with_edit_url(Some(viewer)))
    }
}

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(&self, viewer: &User) -> Result<Vec<User>, BotaskafError> {
        if !viewer.is_admin() {
            return Err(BotaskafError::Forbidden);
        }
        Ok(self
            .users
            .list()
            .await?
            .into_iter()
            .map(|u| u.with_edit_url(Some(viewer)))
            .collect())
    }
}

// ── CreateUser ───────────────────────────────────────────────────────────────

pub struct CreateUserInput {
    pub user_type: UserType,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub settings: UserSettings,
}

pub struct CreateUserUseCase<U: UserRepository, C: EntityCache> {
    pub users: U,
    pub cached: Cached<C>,
}

impl<U: UserRepository, C: EntityCache> CreateUserUseCase<U, C> {
    /// `actor` is `None` only for the first-run setup flow.
    pub async fn execute(
        &self,
        actor: Option<&User>,
        input: CreateUserInput,
        now: DateTime<Utc>,
    ) -> Result<User, BotaskafError> {
        if let Some(actor) = actor {
            if !actor.is_valid() {
                return Err(BotaskafError::Unauthorized);
            }
            if !actor.is_admin() || input.user_type > actor.user_type {
                return Err(BotaskafError::Forbidden);
            }
        }
        let email = input.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(BotaskafError::Validation("invalid email address".into()));
        }
        let display_name = input.display_name.trim().to_owned();
        if display_name.is_empty() {
            return Err(BotaskafError::Validation("display name is required".into()));
        }
        if input.password.is_empty() {
            return Err(BotaskafError::Validation("password is required".into()));
        }
        if input.user_type == UserType::Invalid {
            return Err(BotaskafError::Validation("invalid user type".into()));
        }

        let password_hash = hash_password(&input.password).map_err(BotaskafError::HashFailed)?;
        let draft = UserDraft {
            user_type: input.user_type,
            email,
            display_name,
            password_hash,
            settings: input.settings,
            created_at: now,
        };
        let id = self.users.create(&draft).await?;
        let user = draft.into_user(id);
        self.cached.fill_user(&user).await;

        match actor {
            Some(actor) => info!(
                user_id = %user.id,
                user_type = %user.user_type,
                actor_id = %actor.id,
                actor = %actor.display_name,
                "created new user"
            ),
            None => info!(user_id = %user.id, user_type = %user.user_type, "created initial user"),
        }
        Ok(user.with_edit_url(actor))
    }
}

// ── Login ────────────────────────────────────────────────────────────────────

pub struct LoginUseCase<U: UserRepository, C: EntityCache> {
    pub users: U,
    pub cached: Cached<C>,
}

impl<U: UserRepository, C: EntityCache> LoginUseCase<U, C> {
    /// Checks credentials, then stores and re-caches the new `last_seen`.
    pub async fn execute(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<User, BotaskafError> {
        let email = email.trim().to_lowercase();
        let credentials = self
            .users
            .find_credentials(&email)
            .await?
            .ok_or(BotaskafError::BadLogin)?;
        if !credentials.user.is_valid() || !credentials.user.user_type.can_log_in() {
            return Err(BotaskafError::BadLogin);
        }
        let hash = credentials
            .password_hash
            .as_deref()
            .ok_or(BotaskafError::BadLogin)?;
        if !verify_password(hash, password).map_err(BotaskafError::HashFailed)? {
            return Err(BotaskafError::BadLogin);
        }

        self.users.update_last_seen(credentials.user.id, now).await?;
        let user = credentials.user.with_last_seen(now);
        self.cached.fill_user(&user).await;

        info!(user_id = %user.id, email = %user.email, "successfully logged in");
        Ok(user.with_edit_url(Some(&credentials.user)))
    }
}
