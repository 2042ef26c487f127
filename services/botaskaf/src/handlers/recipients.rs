use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, Uri},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use botaskaf_auth_types::identity::IdentityHeaders;
use botaskaf_domain::id::{FormId, RecipientId};

use crate::domain::settings::RecipientSettings;
use crate::domain::types::{Recipient, RecipientFields};
use crate::error::BotaskafError;
use crate::handlers::users::LockResponse;
use crate::handlers::{audited, current_user, parse_id};
use crate::state::AppState;
use crate::usecase::recipient::{
    CreateRecipientUseCase, GetRecipientUseCase, ListRecipientsUseCase,
};

#[derive(Serialize)]
pub struct RecipientResponse {
    pub id: RecipientId,
    pub form_id: FormId,
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub to_name: Option<String>,
    pub to_email: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub settings: RecipientSettings,
    #[serde(serialize_with = "botaskaf_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "botaskaf_core::serde::to_rfc3339_ms_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    pub lock: Option<LockResponse>,
}

impl From<Recipient> for RecipientResponse {
    fn from(r: Recipient) -> Self {
        Self {
            id: r.id,
            form_id: r.form.id,
            from_name: r.from_name,
            from_email: r.from_email,
            to_name: r.to_name,
            to_email: r.to_email,
            subject: r.subject,
            text: r.text,
            html: r.html,
            settings: r.settings,
            created_at: r.created_at,
            updated_at: r.updated_at,
            lock: r.lock.map(Into::into),
        }
    }
}

// ── GET /forms/{id}/recipients ───────────────────────────────────────────────

pub async fn list_recipients(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    uri: Uri,
) -> Result<Json<Vec<RecipientResponse>>, BotaskafError> {
    let form_id: FormId = parse_id(&form_id)?;
    let viewer = current_user(&state, identity).await?;
    let usecase = ListRecipientsUseCase {
        recipients: state.recipient_repo(),
        forms: state.form_repo(),
        users: state.user_repo(),
        cached: state.cached(),
    };
    let recipients = audited(usecase.execute(&viewer, form_id).await, &viewer, &uri)?;
    Ok(Json(recipients.into_iter().map(Into::into).collect()))
}

// ── GET /forms/{id}/recipients/{recipient_id} ────────────────────────────────

pub async fn get_recipient(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path((form_id, recipient_id)): Path<(String, String)>,
    uri: Uri,
) -> Result<Json<RecipientResponse>, BotaskafError> {
    let form_id: FormId = parse_id(&form_id)?;
    let recipient_id: RecipientId = parse_id(&recipient_id)?;
    let viewer = current_user(&state, identity).await?;
    let usecase = GetRecipientUseCase {
        recipients: state.recipient_repo(),
        forms: state.form_repo(),
        users: state.user_repo(),
        cached: state.cached(),
    };
    let recipient = audited(
        usecase.execute(&viewer, form_id, recipient_id).await,
        &viewer,
        &uri,
    )?;
    Ok(Json(recipient.into()))
}

// ── POST /forms/{id}/recipients ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateRecipientRequest {
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub to_name: Option<String>,
    pub to_email: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    #[serde(default)]
    pub settings: RecipientSettings,
}

pub async fn create_recipient(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(form_id): Path<String>,
    uri: Uri,
    Json(body): Json<CreateRecipientRequest>,
) -> Result<(StatusCode, Json<RecipientResponse>), BotaskafError> {
    let form_id: FormId = parse_id(&form_id)?;
    let viewer = current_user(&state, identity).await?;
    let usecase = CreateRecipientUseCase {
        recipients: state.recipient_repo(),
        forms: state.form_repo(),
        users: state.user_repo(),
        cached: state.cached(),
    };
    let fields = RecipientFields {
        from_name: body.from_name,
        from_email: body.from_email,
        to_name: body.to_name,
        to_email: body.to_email,
        subject: body.subject,
        text: body.text,
        html: body.html,
        settings: body.settings,
    };
    let recipient = audited(
        usecase.execute(&viewer, form_id, fields, Utc::now()).await,
        &viewer,
        &uri,
    )?;
    Ok((StatusCode::CREATED, Json(recipient.into())))
}
