//! Public endpoints used by the embeddable contact form widget.

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::BotaskafError;
use crate::state::AppState;
use crate::usecase::token::{IssueTokenUseCase, VerifyTokenUseCase};

fn parse_uuid(raw: &str) -> Result<Uuid, BotaskafError> {
    Uuid::try_parse(raw.trim()).map_err(|_| BotaskafError::InvalidId)
}

// ── GET /contactform/{uuid}/token ────────────────────────────────────────────

pub async fn issue_token(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, BotaskafError> {
    let uuid = parse_uuid(&uuid)?;
    let usecase = IssueTokenUseCase {
        forms: state.form_repo(),
        users: state.user_repo(),
        cached: state.cached(),
    };
    let token = usecase.execute(uuid, Utc::now()).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        token,
    ))
}

// ── POST /contactform/{uuid}/verify ──────────────────────────────────────────

pub async fn verify_token(
    State(state): State<AppState>,
    Path(uuid): Path<String>,
    body: String,
) -> Result<StatusCode, BotaskafError> {
    let uuid = parse_uuid(&uuid)?;
    let usecase = VerifyTokenUseCase {
        forms: state.form_repo(),
        users: state.user_repo(),
        cached: state.cached(),
        max_age: state.token_max_age,
    };
    usecase.execute(uuid, body.trim(), Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}
