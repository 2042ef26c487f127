use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::DbErr;

use botaskaf_auth_types::password::PasswordError;
use botaskaf_cipher::CipherError;

/// Botaskaf service error variants.
#[derive(Debug, thiserror::Error)]
pub enum BotaskafError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid id")]
    InvalidId,
    #[error("authentication required")]
    Unauthorized,
    #[error("access denied")]
    Forbidden,
    #[error("invalid email or password")]
    BadLogin,
    #[error("form not found")]
    FormNotFound,
    #[error("user not found")]
    UserNotFound,
    #[error("recipient not found")]
    RecipientNotFound,
    #[error("invalid token")]
    InvalidToken,
    #[error("database query could not be prepared")]
    QueryPrepareFailed {
        context: &'static str,
        #[source]
        source: DbErr,
    },
    #[error("database query failed")]
    QueryExecFailed {
        context: &'static str,
        #[source]
        source: DbErr,
    },
    #[error("failed to hash password")]
    HashFailed(#[source] PasswordError),
    #[error("Failed to create token.")]
    Cipher(#[source] CipherError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl BotaskafError {
    /// Classify a store failure. Failing to reach the database is reported as
    /// a prepare failure; anything after that as an execution failure.
    pub fn store(context: &'static str, source: DbErr) -> Self {
        match source {
            DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => {
                Self::QueryPrepareFailed { context, source }
            }
            source => Self::QueryExecFailed { context, source },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::InvalidId => "INVALID_ID",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "AUTHZ",
            Self::BadLogin => "BAD_LOGIN",
            Self::FormNotFound | Self::UserNotFound | Self::RecipientNotFound => "NOT_FOUND",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::QueryPrepareFailed { .. } => "QUERY_PREPARE_FAILED",
            Self::QueryExecFailed { .. } => "QUERY_EXEC_FAILED",
            Self::HashFailed(_) => "HASH_FAILED",
            Self::Cipher(_) => "CIPHER_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidId => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::BadLogin => StatusCode::FORBIDDEN,
            Self::FormNotFound | Self::UserNotFound | Self::RecipientNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::QueryPrepareFailed { .. }
            | Self::QueryExecFailed { .. }
            | Self::HashFailed(_)
            | Self::Cipher(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn title(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "Bad request",
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "Access denied",
        StatusCode::NOT_FOUND => "Not found",
        _ => "Internal server error",
    }
}

impl IntoResponse for BotaskafError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Only server faults are logged here; access denials are logged by the
        // handler that knows the user and path.
        match &self {
            Self::QueryPrepareFailed { context, source }
            | Self::QueryExecFailed { context, source } => {
                tracing::error!(error = %source, context, kind = self.kind(), "database error");
            }
            Self::HashFailed(e) => {
                tracing::error!(error = %e, kind = self.kind(), "password hashing failed");
            }
            Self::Cipher(e) => {
                tracing::error!(error = %e, kind = self.kind(), "token cipher failed");
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, kind = self.kind(), "internal error");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "title": title(status),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

/// `anyhow::Context`-style conversion of store errors.
pub trait StoreContext<T> {
    fn store_context(self, context: &'static str) -> Result<T, BotaskafError>;
}

impl<T> StoreContext<T> for Result<T, DbErr> {
    fn store_context(self, context: &'static str) -> Result<T, BotaskafError> {
        self.map_err(|source| BotaskafError::store(context, source))
    }
}
