use chrono::{DateTime, Utc};
use tracing::info;

use botaskaf_domain::id::{FormId, RecipientId};

use crate::domain::repository::{EntityCache, FormRepository, RecipientRepository, UserRepository};
use crate::domain::settings::{MAX_NAME_LEN, is_valid_email, is_valid_target_email};
use crate::domain::types::{CacheGroup, Form, Recipient, RecipientDraft, RecipientFields, User};
use crate::error::BotaskafError;
use crate::usecase::cache::Cached;
use crate::usecase::form::{FormLookup, load_form};

/// Parent form lookup shared by every recipient operation.
async fn editable_form<F, U, C>(
    forms: &F,
    users: &U,
    cached: &Cached<C>,
    viewer: &User,
    form_id: FormId,
) -> Result<Form, BotaskafError>
where
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    let form = load_form(forms, users, cached, FormLookup::Id(form_id), Some(viewer)).await?;
    if !form.can_edit(viewer) {
        return Err(BotaskafError::Forbidden);
    }
    Ok(form)
}

// ── ListRecipients ───────────────────────────────────────────────────────────

pub struct ListRecipientsUseCase<R, F, U, C>
where
    R: RecipientRepository,
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    pub recipients: R,
    pub forms: F,
    pub users: U,
    pub cached: Cached<C>,
}

impl<R, F, U, C> ListRecipientsUseCase<R, F, U, C>
where
    R: RecipientRepository,
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    /// Always read from the store.
    pub async fn execute(
        &self,
        viewer: &User,
        form_id: FormId,
    ) -> Result<Vec<Recipient>, BotaskafError> {
        let form = editable_form(&self.forms, &self.users, &self.cached, viewer, form_id).await?;
        let records = self.recipients.list_by_form(form.id).await?;
        Ok(records
            .into_iter()
            .map(|record| record.into_recipient(form.clone()))
            .collect())
    }
}

// ── GetRecipient ─────────────────────────────────────────────────────────────

pub struct GetRecipientUseCase<R, F, U, C>
where
    R: RecipientRepository,
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    pub recipients: R,
    pub forms: F,
    pub users: U,
    pub cached: Cached<C>,
}

impl<R, F, U, C> GetRecipientUseCase<R, F, U, C>
where
    R: RecipientRepository,
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    /// Cache-first by recipient id. The recipient must belong to `form_id`.
    pub async fn execute(
        &self,
        viewer: &User,
        form_id: FormId,
        id: RecipientId,
    ) -> Result<Recipient, BotaskafError> {
        let form = editable_form(&self.forms, &self.users, &self.cached, viewer, form_id).await?;

        let key = id.to_string();
        let recipient = match self.cached.probe::<Recipient>(CacheGroup::Recipients, &key).await {
            Some(recipient) => recipient,
            None => {
                let record = self
                    .recipients
                    .find_by_id(id)
                    .await?
                    .ok_or(BotaskafError::RecipientNotFound)?;
                if record.form_id != form.id {
                    return Err(BotaskafError::RecipientNotFound);
                }
                let recipient = record.into_recipient(form);
                self.cached.fill_recipient(&recipient).await;
                recipient
            }
        };
        if recipient.form.id != form_id {
            return Err(BotaskafError::RecipientNotFound);
        }
        Ok(recipient)
    }
}

// ── CreateRecipient ──────────────────────────────────────────────────────────

pub struct CreateRecipientUseCase<R, F, U, C>
where
    R: RecipientRepository,
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    pub recipients: R,
    pub forms: F,
    pub users: U,
    pub cached: Cached<C>,
}

impl<R, F, U, C> CreateRecipientUseCase<R, F, U, C>
where
    R: RecipientRepository,
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    /// Inserts the recipient, caches it, and re-caches the parent form with
    /// its new recipient count.
    pub async fn execute(
        &self,
        viewer: &User,
        form_id: FormId,
        fields: RecipientFields,
        now: DateTime<Utc>,
    ) -> Result<Recipient, BotaskafError> {
        if !viewer.is_valid() {
            return Err(BotaskafError::Unauthorized);
        }
        let form = editable_form(&self.forms, &self.users, &self.cached, viewer, form_id).await?;
        let fields = normalize(fields)?;

        let draft = RecipientDraft {
            form_id: form.id,
            fields,
            created_at: now,
        };
        let id = self.recipients.create(&draft).await?;

        let form = Form {
            recipient_count: form.recipient_count + 1,
            ..form
        };
        self.cached.fill_form(&form).await;

        let recipient = Recipient {
            id,
            form: form.embedded(),
            from_name: draft.fields.from_name,
            from_email: draft.fields.from_email,
            to_name: draft.fields.to_name,
            to_email: draft.fields.to_email,
            subject: draft.fields.subject,
            text: draft.fields.text,
            html: draft.fields.html,
            settings: draft.fields.settings,
            created_at: now,
            updated_at: None,
            lock: None,
        };
        self.cached.fill_recipient(&recipient).await;

        info!(
            recipient_id = %recipient.id,
            form_id = %form.id,
            user_id = %viewer.id,
            user = %viewer.display_name,
            "created new recipient"
        );
        Ok(recipient)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn normalize(fields: RecipientFields) -> Result<RecipientFields, BotaskafError> {
    let invalid = |msg: &str| Err(BotaskafError::Validation(msg.to_owned()));

    let from_name = trimmed(fields.from_name);
    let to_name = trimmed(fields.to_name);
    let from_email = trimmed(fields.from_email);
    let to_email = fields.to_email.trim().to_owned();
    let subject = fields.subject.trim().to_owned();
    let text = trimmed(fields.text);
    let html = trimmed(fields.html);
    let mut settings = fields.settings;

    if from_name.as_ref().is_some_and(|n| n.chars().count() > MAX_NAME_LEN)
        || to_name.as_ref().is_some_and(|n| n.chars().count() > MAX_NAME_LEN)
    {
        return invalid("names must not exceed 40 characters");
    }
    match from_email.as_deref() {
        None => return invalid("sender email address is required"),
        Some(e) if !is_valid_email(e) => return invalid("invalid sender email address"),
        Some(_) => {}
    }
    if !is_valid_target_email(&to_email) {
        return invalid("invalid recipient email address");
    }
    if subject.is_empty() {
        return invalid("subject is required");
    }
    if text.is_none() && html.is_none() {
        return invalid("either text or html body is required");
    }
    if let Some(reply_to) = settings.reply_to.as_mut() {
        reply_to.email = reply_to.email.trim().to_owned();
        reply_to.name = trimmed(reply_to.name.take());
        if reply_to.name.as_ref().is_some_and(|n| n.chars().count() > MAX_NAME_LEN) {
            return invalid("names must not exceed 40 characters");
        }
        if !is_valid_target_email(&reply_to.email) {
            return invalid("invalid reply-to email address");
        }
    }

    Ok(RecipientFields {
        from_name,
        from_email,
        to_name,
        to_email,
        subject,
        text,
        html,
        settings,
    })
}
