use std::collections::HashMap;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use botaskaf_domain::id::{FormId, RecipientId, UserId};
use botaskaf_domain::user::UserType;
use botaskaf_schema::{forms, recipients, users};

use crate::domain::repository::{FormRepository, RecipientRepository, UserRepository};
use crate::domain::types::{
    FormDraft, FormRecord, Lock, RecipientDraft, RecipientFields, RecipientRecord, User,
    UserCredentials, UserDraft,
};
use crate::error::{BotaskafError, StoreContext};

/// Id assigned by an insert. `Ok(None)` means the driver reported no id and
/// the row has to be looked up by a unique column.
fn inserted_id(result: Result<i32, DbErr>, context: &'static str) -> Result<Option<i32>, BotaskafError> {
    match result {
        Ok(id) if id > 0 => Ok(Some(id)),
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(None),
        Err(e) => Err(BotaskafError::store(context, e)),
    }
}

fn missing_after_insert(context: &'static str, table: &str) -> BotaskafError {
    BotaskafError::store(context, DbErr::RecordNotFound(table.to_owned()))
}

/// Resolves the display name of whoever holds an edit lock.
async fn resolve_lock(
    db: &DatabaseConnection,
    at: Option<DateTime<Utc>>,
    by: Option<i32>,
) -> Result<Option<Lock>, BotaskafError> {
    let (Some(at), Some(by)) = (at, by) else {
        return Ok(None);
    };
    let holder = users::Entity::find_by_id(by)
        .one(db)
        .await
        .store_context("find lock holder")?;
    Ok(Some(Lock {
        at,
        by: UserId(by),
        by_name: holder.map(|u| u.display_name).unwrap_or_default(),
    }))
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl DbUserRepository {
    async fn user_from_model(&self, model: users::Model) -> Result<User, BotaskafError> {
        let lock = resolve_lock(&self.db, model.locked_at, model.locked_by).await?;
        let settings = serde_json::from_value(model.settings).context("decode user settings")?;
        Ok(User {
            id: UserId(model.id),
            user_type: UserType::from_i16(model.user_type),
            email: model.email,
            display_name: model.display_name,
            created_at: model.created_at,
            updated_at: model.updated_at,
            last_seen: model.last_seen,
            lock,
            settings,
            edit_url: None,
        })
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, BotaskafError> {
        let model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .store_context("find user by id")?;
        match model {
            Some(model) => Ok(Some(self.user_from_model(model).await?)),
            None => Ok(None),
        }
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, BotaskafError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .store_context("find user by email")?;
        let Some(mut model) = model else {
            return Ok(None);
        };
        let password_hash = model.password.take();
        Ok(Some(UserCredentials {
            user: self.user_from_model(model).await?,
            password_hash,
        }))
    }

    async fn list(&self) -> Result<Vec<User>, BotaskafError> {
        let models = users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
            .store_context("list users")?;
        let mut users = Vec::with_capacity(models.len());
        for model in models {
            users.push(self.user_from_model(model).await?);
        }
        Ok(users)
    }

    async fn create(&self, draft: &UserDraft) -> Result<UserId, BotaskafError> {
        let settings = serde_json::to_value(&draft.settings).context("encode user settings")?;
        let result = users::Entity::insert(users::ActiveModel {
            id: NotSet,
            user_type: Set(draft.user_type.as_i16()),
            email: Set(draft.email.clone()),
            display_name: Set(draft.display_name.clone()),
            password: Set(Some(draft.password_hash.clone())),
            created_at: Set(draft.created_at),
            updated_at: Set(draft.created_at),
            last_seen: Set(None),
            locked_at: Set(None),
            locked_by: Set(None),
            settings: Set(settings),
        })
        .exec(&self.db)
        .await
        .map(|r| r.last_insert_id);

        if let Some(id) = inserted_id(result, "insert user")? {
            return Ok(UserId(id));
        }
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(draft.email.as_str()))
            .one(&self.db)
            .await
            .store_context("find inserted user")?
            .ok_or_else(|| missing_after_insert("find inserted user", "users"))?;
        Ok(UserId(model.id))
    }

    async fn update_last_seen(&self, id: UserId, at: DateTime<Utc>) -> Result<(), BotaskafError> {
        users::Entity::update_many()
            .col_expr(users::Column::LastSeen, sea_orm::sea_query::Expr::value(at))
            .filter(users::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .store_context("update user last seen")?;
        Ok(())
    }
}

// ── Form repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbFormRepository {
    pub db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct RecipientCount {
    form_id: i32,
    recipient_count: i64,
}

impl DbFormRepository {
    /// Recipient counts per form in one grouped query.
    async fn recipient_counts(&self, form_ids: Vec<i32>) -> Result<HashMap<i32, u64>, BotaskafError> {
        if form_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = recipients::Entity::find()
            .select_only()
            .column(recipients::Column::FormId)
            .column_as(recipients::Column::Id.count(), "recipient_count")
            .filter(recipients::Column::FormId.is_in(form_ids))
            .group_by(recipients::Column::FormId)
            .into_model::<RecipientCount>()
            .all(&self.db)
            .await
            .store_context("count recipients")?;
        Ok(rows
            .into_iter()
            .map(|r| (r.form_id, r.recipient_count.max(0) as u64))
            .collect())
    }

    async fn record_from_model(
        &self,
        model: forms::Model,
        recipient_count: u64,
    ) -> Result<FormRecord, BotaskafError> {
        let lock = resolve_lock(&self.db, model.locked_at, model.locked_by).await?;
        let uuid = Uuid::try_parse(&model.uuid).context("decode form uuid")?;
        let settings = serde_json::from_value(model.settings).context("decode form settings")?;
        Ok(FormRecord {
            id: FormId(model.id),
            uuid,
            owner_id: model.user_id.map(UserId),
            secret: model.secret,
            name: model.name,
            domain: model.domain,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
            lock,
            settings,
            recipient_count,
        })
    }

    async fn one(&self, model: Option<forms::Model>) -> Result<Option<FormRecord>, BotaskafError> {
        let Some(model) = model else {
            return Ok(None);
        };
        let counts = self.recipient_counts(vec![model.id]).await?;
        let count = counts.get(&model.id).copied().unwrap_or(0);
        Ok(Some(self.record_from_model(model, count).await?))
    }
}

impl FormRepository for DbFormRepository {
    async fn find_by_id(&self, id: FormId) -> Result<Option<FormRecord>, BotaskafError> {
        let model = forms::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .store_context("find form by id")?;
        self.one(model).await
    }

    async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<FormRecord>, BotaskafError> {
        let model = forms::Entity::find()
            .filter(forms::Column::Uuid.eq(uuid.simple().to_string()))
            .one(&self.db)
            .await
            .store_context("find form by uuid")?;
        self.one(model).await
    }

    async fn list(&self, owner: Option<UserId>) -> Result<Vec<FormRecord>, BotaskafError> {
        let mut query = forms::Entity::find().order_by_asc(forms::Column::Id);
        if let Some(owner) = owner {
            query = query.filter(forms::Column::UserId.eq(owner.0));
        }
        let models = query.all(&self.db).await.store_context("list forms")?;

        let counts = self
            .recipient_counts(models.iter().map(|m| m.id).collect())
            .await?;
        let mut records = Vec::with_capacity(models.len());
        for model in models {
            let count = counts.get(&model.id).copied().unwrap_or(0);
            records.push(self.record_from_model(model, count).await?);
        }
        Ok(records)
    }

    async fn create(&self, draft: &FormDraft) -> Result<FormId, BotaskafError> {
        let settings = serde_json::to_value(&draft.settings).context("encode form settings")?;
        let uuid = draft.uuid.simple().to_string();
        let result = forms::Entity::insert(forms::ActiveModel {
            id: NotSet,
            uuid: Set(uuid.clone()),
            user_id: Set(Some(draft.owner.0)),
            secret: Set(draft.secret.clone()),
            name: Set(draft.name.clone()),
            domain: Set(draft.domain.clone()),
            description: Set(draft.description.clone()),
            created_at: Set(draft.created_at),
            updated_at: Set(draft.created_at),
            locked_at: Set(None),
            locked_by: Set(None),
            settings: Set(settings),
        })
        .exec(&self.db)
        .await
        .map(|r| r.last_insert_id);

        if let Some(id) = inserted_id(result, "insert form")? {
            return Ok(FormId(id));
        }
        let model = forms::Entity::find()
            .filter(forms::Column::Uuid.eq(uuid))
            .one(&self.db)
            .await
            .store_context("find inserted form")?
            .ok_or_else(|| missing_after_insert("find inserted form", "forms"))?;
        Ok(FormId(model.id))
    }
}

// ── Recipient repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRecipientRepository {
    pub db: DatabaseConnection,
}

impl DbRecipientRepository {
    async fn record_from_model(
        &self,
        model: recipients::Model,
    ) -> Result<RecipientRecord, BotaskafError> {
        let lock = resolve_lock(&self.db, model.locked_at, model.locked_by).await?;
        let settings =
            serde_json::from_value(model.settings).context("decode recipient settings")?;
        Ok(RecipientRecord {
            id: RecipientId(model.id),
            form_id: FormId(model.form_id),
            fields: RecipientFields {
                from_name: model.from_name,
                from_email: model.from_email,
                to_name: model.to_name,
                to_email: model.to_email,
                subject: model.subject,
                text: model.text,
                html: model.html,
                settings,
            },
            created_at: model.created_at,
            updated_at: model.updated_at,
            lock,
        })
    }
}

impl RecipientRepository for DbRecipientRepository {
    async fn find_by_id(&self, id: RecipientId) -> Result<Option<RecipientRecord>, BotaskafError> {
        let model = recipients::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .store_context("find recipient by id")?;
        match model {
            Some(model) => Ok(Some(self.record_from_model(model).await?)),
            None => Ok(None),
        }
    }

    async fn list_by_form(&self, form_id: FormId) -> Result<Vec<RecipientRecord>, BotaskafError> {
        let models = recipients::Entity::find()
            .filter(recipients::Column::FormId.eq(form_id.0))
            .order_by_asc(recipients::Column::Id)
            .all(&self.db)
            .await
            .store_context("list recipients by form")?;
        let mut records = Vec::with_capacity(models.len());
        for model in models {
            records.push(self.record_from_model(model).await?);
        }
        Ok(records)
    }

    async fn create(&self, draft: &RecipientDraft) -> Result<RecipientId, BotaskafError> {
        let fields = &draft.fields;
        let settings = serde_json::to_value(&fields.settings).context("encode recipient settings")?;
        let result = recipients::Entity::insert(recipients::ActiveModel {
            id: NotSet,
            form_id: Set(draft.form_id.0),
            from_name: Set(fields.from_name.clone()),
            from_email: Set(fields.from_email.clone()),
            to_name: Set(fields.to_name.clone()),
            to_email: Set(fields.to_email.clone()),
            subject: Set(fields.subject.clone()),
            text: Set(fields.text.clone()),
            html: Set(fields.html.clone()),
            settings: Set(settings),
            created_at: Set(draft.created_at),
            updated_at: Set(None),
            locked_at: Set(None),
            locked_by: Set(None),
        })
        .exec(&self.db)
        .await
        .map(|r| r.last_insert_id);

        if let Some(id) = inserted_id(result, "insert recipient")? {
            return Ok(RecipientId(id));
        }
        let model = recipients::Entity::find()
            .filter(recipients::Column::FormId.eq(draft.form_id.0))
            .filter(recipients::Column::ToEmail.eq(fields.to_email.as_str()))
            .one(&self.db)
            .await
            .store_context("find inserted recipient")?
            .ok_or_else(|| missing_after_insert("find inserted recipient", "recipients"))?;
        Ok(RecipientId(model.id))
    }
}
