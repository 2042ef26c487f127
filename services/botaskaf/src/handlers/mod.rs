pub mod contact_form;
pub mod forms;
pub mod login;
pub mod recipients;
pub mod users;

use std::str::FromStr;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use tracing::warn;

use botaskaf_auth_types::identity::IdentityHeaders;

use crate::domain::types::User;
use crate::error::BotaskafError;
use crate::state::AppState;
use crate::usecase::user::ResolveViewerUseCase;

/// Loads the account behind the identity headers.
pub(crate) async fn current_user(
    state: &AppState,
    identity: IdentityHeaders,
) -> Result<User, BotaskafError> {
    ResolveViewerUseCase {
        users: state.user_repo(),
        cached: state.cached(),
    }
    .execute(identity.user_id)
    .await
}

/// Records denied access with the acting user and the requested path.
pub(crate) fn audited<T>(
    result: Result<T, BotaskafError>,
    viewer: &User,
    uri: &Uri,
) -> Result<T, BotaskafError> {
    if let Err(BotaskafError::Forbidden) = &result {
        warn!(
            user_id = %viewer.id,
            user = %viewer.display_name,
            path = uri.path(),
            "access denied"
        );
    }
    result
}

/// Parses a positive numeric path segment.
pub(crate) fn parse_id<T>(raw: &str) -> Result<T, BotaskafError>
where
    T: FromStr + Into<i32> + Copy,
{
    let id: T = raw.trim().parse().map_err(|_| BotaskafError::InvalidId)?;
    let value: i32 = id.into();
    if value <= 0 {
        return Err(BotaskafError::InvalidId);
    }
    Ok(id)
}

/// `GET /readyz`: ready once the database answers.
pub async fn readyz(State(state): State<AppState>) -> StatusCode {
    match state.db.ping().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
