use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, Uri},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use botaskaf_auth_types::identity::IdentityHeaders;
use botaskaf_domain::id::FormId;

use crate::domain::settings::FormSettings;
use crate::domain::types::Form;
use crate::error::BotaskafError;
use crate::handlers::users::{LockResponse, UserResponse};
use crate::handlers::{audited, current_user, parse_id};
use crate::state::AppState;
use crate::usecase::form::{CreateFormInput, CreateFormUseCase, GetFormUseCase, ListFormsUseCase};

/// Form as shown to its owner or an administrator. The secret is never sent.
#[derive(Serialize)]
pub struct FormResponse {
    pub id: FormId,
    pub uuid: String,
    pub name: String,
    pub domain: String,
    pub description: Option<String>,
    pub owner: Option<UserResponse>,
    pub recipient_count: u64,
    #[serde(serialize_with = "botaskaf_core::serde::to_rfc3339_ms")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "botaskaf_core::serde::to_rfc3339_ms")]
    pub updated_at: DateTime<Utc>,
    pub lock: Option<LockResponse>,
    pub settings: FormSettings,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub urls: BTreeMap<String, String>,
}

impl From<Form> for FormResponse {
    fn from(form: Form) -> Self {
        Self {
            id: form.id,
            uuid: form.uuid.simple().to_string(),
            name: form.name,
            domain: form.domain,
            description: form.description,
            owner: form.owner.map(Into::into),
            recipient_count: form.recipient_count,
            created_at: form.created_at,
            updated_at: form.updated_at,
            lock: form.lock.map(Into::into),
            settings: form.settings,
            urls: form.urls,
        }
    }
}

// ── GET /forms ───────────────────────────────────────────────────────────────

pub async fn list_forms(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<Json<Vec<FormResponse>>, BotaskafError> {
    let viewer = current_user(&state, identity).await?;
    let usecase = ListFormsUseCase {
        forms: state.form_repo(),
        users: state.user_repo(),
        cached: state.cached(),
    };
    let forms = usecase.execute(&viewer).await?;
    Ok(Json(forms.into_iter().map(Into::into).collect()))
}

// ── GET /forms/{id} ──────────────────────────────────────────────────────────

pub async fn get_form(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(id): Path<String>,
    uri: Uri,
) -> Result<Json<FormResponse>, BotaskafError> {
    let id: FormId = parse_id(&id)?;
    let viewer = current_user(&state, identity).await?;
    let usecase = GetFormUseCase {
        forms: state.form_repo(),
        users: state.user_repo(),
        cached: state.cached(),
    };
    let form = audited(usecase.execute(&viewer, id).await, &viewer, &uri)?;
    Ok(Json(form.into()))
}

// ── POST /forms ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateFormRequest {
    pub name: String,
    pub domain: String,
    pub description: Option<String>,
    #[serde(default)]
    pub settings: FormSettings,
}

pub async fn create_form(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<CreateFormRequest>,
) -> Result<(StatusCode, Json<FormResponse>), BotaskafError> {
    let viewer = current_user(&state, identity).await?;
    let usecase = CreateFormUseCase {
        forms: state.form_repo(),
        cached: state.cached(),
    };
    let form = usecase
        .execute(
            &viewer,
            CreateFormInput {
                name: body.name,
                domain: body.domain,
                description: body.description,
                settings: body.settings,
            },
            Utc::now(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(form.into())))
}
