//! Gateway-injected identity header extractor.

use axum::extract::FromRequestParts;
use botaskaf_domain::id::UserId;
use http::StatusCode;
use http::request::Parts;

pub const USER_ID_HEADER: &str = "x-botaskaf-user-id";

/// Account id forwarded by the session gateway.
///
/// Rejects with 401 when the header is missing, unparsable or not a
/// persisted id. Privilege checks happen after the account is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityHeaders {
    pub user_id: UserId,
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<UserId>().ok())
            .filter(|id| id.is_persisted());

        async move {
            let user_id = user_id.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self { user_id })
        }
    }
}
