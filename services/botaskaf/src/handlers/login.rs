use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use botaskaf_domain::user::UserType;

use crate::domain::settings::UserSettings;
use crate::error::BotaskafError;
use crate::handlers::users::UserResponse;
use crate::state::AppState;
use crate::usecase::user::{CreateUserInput, CreateUserUseCase, LoginUseCase};

pub const SETUP_TOKEN_HEADER: &str = "x-botaskaf-setup-token";

// ── POST /login ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<UserResponse>, BotaskafError> {
    let usecase = LoginUseCase {
        users: state.user_repo(),
        cached: state.cached(),
    };
    let user = usecase
        .execute(&body.email, &body.password, Utc::now())
        .await?;
    Ok(Json(user.into()))
}

// ── POST /setup ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SetupRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    #[serde(default)]
    pub settings: UserSettings,
}

/// Creates the first super user. Disabled unless a setup token is configured.
pub async fn setup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SetupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), BotaskafError> {
    let Some(expected) = state.setup_token.as_deref() else {
        return Err(BotaskafError::Forbidden);
    };
    let presented = headers
        .get(SETUP_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if presented != expected {
        warn!(path = "/setup", "setup attempted with wrong token");
        return Err(BotaskafError::Forbidden);
    }

    let usecase = CreateUserUseCase {
        users: state.user_repo(),
        cached: state.cached(),
    };
    let input = CreateUserInput {
        user_type: UserType::SuperUser,
        email: body.email,
        display_name: body.display_name,
        password: body.password,
        settings: body.settings,
    };
    let user = usecase.execute(None, input, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}
