use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, Uri},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use botaskaf_auth_types::identity::IdentityHeaders;
use botaskaf_domain::id::UserId;
use botaskaf_domain::user::UserType;

use crate::domain::settings::UserSettings;
use crate::domain::types::{Lock, User};
use crate::error::BotaskafError;
use crate::handlers::{audited, current_user, parse_id};
use crate::state::AppState;
use crate::usecase::user::{CreateUserInput, CreateUserUseCase, GetUserUseCase, ListUsersUseCase};

#[derive(Serialize)]
pub struct LockResponse {
    #[serde(serialize_with = "botaskaf_core::serde::to_rfc3339_ms")]
    pub at: DateTime<Utc>,
    pub by: UserId,
    pub by_name: String,
}

impl From<Lock> for LockResponse {
    fn from(lock: Lock) -> Self {
        Self {
            at: lock.at,
            by: lock.by,
            by_name: lock.by_name,
        }
    }
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub email: String,
    pub display_name: String,
    #[serde(serialize_with = "botaskaf_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "botaskaf_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
    #[serde(serialize_with = "botaskaf_core::serde::to_rfc3339_ms_opt")]
    pub last_seen: Option<DateTime<Utc>>,
    pub lock: Option<LockResponse>,
    pub settings: UserSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edit_url: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_type: user.user_type,
            email: user.email,
            display_name: user.display_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_seen: user.last_seen,
            lock: user.lock.map(Into::into),
            settings: user.settings,
            edit_url: user.edit_url,
        }
    }
}

// ── GET /users ───────────────────────────────────────────────────────────────

pub async fn list_users(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<Vec<UserResponse>>, BotaskafError> {
    let viewer = current_user(&state, identity).await?;
    let usecase = ListUsersUseCase {
        users: state.user_repo(),
    };
    let users = audited(usecase.execute(&viewer).await, &viewer, &uri)?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

// ── GET /users/{id} ──────────────────────────────────────────────────────────

pub async fn get_user(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
) -> Result<Json<UserResponse>, BotaskafError> {
    let viewer = current_user(&state, identity).await?;
    let id = if id == "me" { viewer.id } else { parse_id(&id)? };
    let usecase = GetUserUseCase {
        users: state.user_repo(),
        cached: state.cached(),
    };
    let user = audited(usecase.execute(&viewer, id).await, &viewer, &uri)?;
    Ok(Json(user.into()))
}

// ── POST /users ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(rename = "type", default = "default_user_type")]
    pub user_type: UserType,
    pub email: String,
    pub display_name: String,
    pub password: String,
    #[serde(default)]
    pub settings: UserSettings,
}

fn default_user_type() -> UserType {
    UserType::Registered
}

impl From<CreateUserRequest> for CreateUserInput {
    fn from(body: CreateUserRequest) -> Self {
        Self {
            user_type: body.user_type,
            email: body.email,
            display_name: body.display_name,
            password: body.password,
            settings: body.settings,
        }
    }
}

pub async fn create_user(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    uri: Uri,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), BotaskafError> {
    let viewer = current_user(&state, identity).await?;
    let usecase = CreateUserUseCase {
        users: state.user_repo(),
        cached: state.cached(),
    };
    let user = audited(
        usecase.execute(Some(&viewer), body.into(), Utc::now()).await,
        &viewer,
        &uri,
    )?;
    Ok((StatusCode::CREATED, Json(user.into())))
}
