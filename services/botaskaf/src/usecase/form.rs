use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use botaskaf_domain::id::FormId;

use crate::domain::repository::{EntityCache, FormRepository, UserRepository};
use crate::domain::settings::{FormSettings, is_valid_domain};
use crate::domain::types::{CacheGroup, Form, FormDraft, FormRecord, User};
use crate::error::BotaskafError;
use crate::usecase::cache::{Cached, uuid_key};
use crate::usecase::user::load_user;

/// The two ways a form is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormLookup {
    Id(FormId),
    Uuid(Uuid),
}

impl FormLookup {
    fn cache_slot(self) -> (CacheGroup, String) {
        match self {
            Self::Id(id) => (CacheGroup::Forms, id.to_string()),
            Self::Uuid(uuid) => (CacheGroup::FormsByUuid, uuid_key(&uuid)),
        }
    }
}

/// Cache-first form lookup.
///
/// On a miss the row is fetched, its owner resolved and the result written
/// under both the id and the uuid key. The returned value never carries
/// `urls`; callers add them for their viewer.
pub async fn load_form<F, U, C>(
    forms: &F,
    users: &U,
    cached: &Cached<C>,
    lookup: FormLookup,
    viewer: Option<&User>,
) -> Result<Form, BotaskafError>
where
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    let (group, key) = lookup.cache_slot();
    if let Some(form) = cached.probe::<Form>(group, &key).await {
        return Ok(form);
    }
    let record = match lookup {
        FormLookup::Id(id) => forms.find_by_id(id).await?,
        FormLookup::Uuid(uuid) => forms.find_by_uuid(uuid).await?,
    }
    .ok_or(BotaskafError::FormNotFound)?;

    let form = hydrate_form(users, cached, record, viewer).await?;
    cached.fill_form(&form).await;
    Ok(form)
}

/// Resolve the owner of a stored row. The viewer is reused when it is the owner.
pub async fn hydrate_form<U, C>(
    users: &U,
    cached: &Cached<C>,
    record: FormRecord,
    viewer: Option<&User>,
) -> Result<Form, BotaskafError>
where
    U: UserRepository,
    C: EntityCache,
{
    let owner = match (record.owner_id, viewer) {
        (None, _) => None,
        (Some(owner_id), Some(viewer)) if viewer.id == owner_id => Some(viewer.embedded()),
        (Some(owner_id), _) => match load_user(users, cached, owner_id).await {
            Ok(owner) => Some(owner),
            // Owner row gone between the two reads; the FK is SET NULL.
            Err(BotaskafError::UserNotFound) => None,
            Err(e) => return Err(e),
        },
    };
    Ok(record.into_form(owner))
}

// ── GetForm ──────────────────────────────────────────────────────────────────

pub struct GetFormUseCase<F: FormRepository, U: UserRepository, C: EntityCache> {
    pub forms: F,
    pub users: U,
    pub cached: Cached<C>,
}

impl<F, U, C> GetFormUseCase<F, U, C>
where
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    /// Owner or administrator only.
    pub async fn execute(&self, viewer: &User, id: FormId) -> Result<Form, BotaskafError> {
        let form = load_form(
            &self.forms,
            &self.users,
            &self.cached,
            FormLookup::Id(id),
            Some(viewer),
        )
        .await?;
        if !form.can_edit(viewer) {
            return Err(BotaskafError::Forbidden);
        }
        Ok(form.with_urls(Some(viewer)))
    }

    /// Public lookup used by the widget endpoints.
    pub async fn execute_by_uuid(
        &self,
        uuid: Uuid,
        viewer: Option<&User>,
    ) -> Result<Form, BotaskafError> {
        let form = load_form(
            &self.forms,
            &self.users,
            &self.cached,
            FormLookup::Uuid(uuid),
            viewer,
        )
        .await?;
        Ok(form.with_urls(viewer))
    }
}

// ── ListForms ────────────────────────────────────────────────────────────────

pub struct ListFormsUseCase<F: FormRepository, U: UserRepository, C: EntityCache> {
    pub forms: F,
    pub users: U,
    pub cached: Cached<C>,
}

impl<F, U, C> ListFormsUseCase<F, U, C>
where
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    /// Administrators see every form, everyone else only their own.
    pub async fn execute(&self, viewer: &User) -> Result<Vec<Form>, BotaskafError> {
        let owner = if viewer.is_admin() {
            None
        } else {
            Some(viewer.id)
        };
        let records = self.forms.list(owner).await?;
        let mut forms = Vec::with_capacity(records.len());
        for record in records {
            let form = hydrate_form(&self.users, &self.cached, record, Some(viewer)).await?;
            forms.push(form.with_urls(Some(viewer)));
        }
        Ok(forms)
    }
}

// ── CreateForm ───────────────────────────────────────────────────────────────

pub struct CreateFormInput {
    pub name: String,
    pub domain: String,
    pub description: Option<String>,
    pub settings: FormSettings,
}

pub struct CreateFormUseCase<F: FormRepository, C: EntityCache> {
    pub forms: F,
    pub cached: Cached<C>,
}

impl<F: FormRepository, C: EntityCache> CreateFormUseCase<F, C> {
    pub async fn execute(
        &self,
        actor: &User,
        input: CreateFormInput,
        now: DateTime<Utc>,
    ) -> Result<Form, BotaskafError> {
        if !actor.is_valid() {
            return Err(BotaskafError::Unauthorized);
        }
        let name = input.name.trim().to_owned();
        if name.is_empty() {
            return Err(BotaskafError::Validation("name is required".into()));
        }
        let domain = input.domain.trim().to_lowercase();
        if !is_valid_domain(&domain) {
            return Err(BotaskafError::Validation("invalid domain".into()));
        }
        input.settings.validate().map_err(BotaskafError::Validation)?;

        let draft = FormDraft {
            uuid: Uuid::new_v4(),
            secret: botaskaf_cipher::generate_secret(),
            owner: actor.id,
            name,
            domain,
            description: input
                .description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            settings: input.settings,
            created_at: now,
        };
        let id = self.forms.create(&draft).await?;
        let form = draft.into_form(id, actor.clone());
        self.cached.fill_form(&form).await;

        info!(
            form_id = %form.id,
            form_uuid = %form.uuid.simple(),
            user_id = %actor.id,
            user = %actor.display_name,
            "created new form"
        );
        Ok(form.with_urls(Some(actor)))
    }
}
