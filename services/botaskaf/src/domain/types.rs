use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use botaskaf_domain::id::{FormId, RecipientId, UserId};
use botaskaf_domain::user::UserType;

use crate::domain::settings::{FormSettings, RecipientSettings, UserSettings};

/// Default lifetime of a cached entity: 7 days.
pub const CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Tolerated clock skew when a token claims to be issued in the future.
pub const TOKEN_FUTURE_SKEW_SECS: i64 = 60;

/// Named key spaces of the entity cache. One entity may live in several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheGroup {
    Forms,
    FormsByUuid,
    Users,
    Recipients,
}

impl CacheGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Forms => "forms",
            Self::FormsByUuid => "forms-by-uuid",
            Self::Users => "users",
            Self::Recipients => "recipients",
        }
    }
}

/// Edit lock held on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lock {
    pub at: DateTime<Utc>,
    pub by: UserId,
    pub by_name: String,
}

// ── User ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub user_type: UserType,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub lock: Option<Lock>,
    pub settings: UserSettings,
    /// Depends on who is looking; never cached.
    #[serde(skip)]
    pub edit_url: Option<String>,
}

impl User {
    pub fn is_valid(&self) -> bool {
        self.id.is_persisted() && self.user_type != UserType::Invalid
    }

    pub fn is_admin(&self) -> bool {
        self.user_type.is_admin()
    }

    /// Copy with `last_seen` replaced; `self` is left untouched.
    pub fn with_last_seen(&self, at: DateTime<Utc>) -> Self {
        Self {
            last_seen: Some(at),
            ..self.clone()
        }
    }

    pub fn with_edit_url(mut self, viewer: Option<&User>) -> Self {
        self.edit_url = match viewer {
            Some(v) if v.id == self.id => Some("/users/me".to_owned()),
            Some(v) if v.is_admin() => Some(format!("/users/{}", self.id)),
            _ => None,
        };
        self
    }

    /// Form suitable for embedding in another entity: viewer-dependent
    /// fields stripped.
    pub fn embedded(&self) -> Self {
        Self {
            edit_url: None,
            ..self.clone()
        }
    }
}

/// Insert payload for a new account. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub user_type: UserType,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub settings: UserSettings,
    pub created_at: DateTime<Utc>,
}

impl UserDraft {
    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            user_type: self.user_type,
            email: self.email,
            display_name: self.display_name,
            created_at: self.created_at,
            updated_at: self.created_at,
            last_seen: None,
            lock: None,
            settings: self.settings,
            edit_url: None,
        }
    }
}

/// Account plus its stored password hash, used only by login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: Option<String>,
}

// ── Form ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub id: FormId,
    pub uuid: Uuid,
    /// Upper-case hex AES-128 key. Server side only.
    pub secret: String,
    pub name: String,
    pub domain: String,
    pub owner: Option<User>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lock: Option<Lock>,
    pub settings: FormSettings,
    pub recipient_count: u64,
    /// Action links, filled only for the owner or an administrator.
    #[serde(skip)]
    pub urls: BTreeMap<String, String>,
}

impl Form {
    pub fn is_valid(&self) -> bool {
        self.id.is_persisted()
    }

    pub fn owner_id(&self) -> Option<UserId> {
        self.owner.as_ref().map(|u| u.id)
    }

    pub fn can_edit(&self, viewer: &User) -> bool {
        viewer.is_valid() && (viewer.is_admin() || self.owner_id() == Some(viewer.id))
    }

    pub fn with_urls(mut self, viewer: Option<&User>) -> Self {
        self.urls.clear();
        if viewer.is_some_and(|v| self.can_edit(v)) {
            self.urls
                .insert("self".to_owned(), format!("/forms/{}", self.id));
            self.urls
                .insert("recipients".to_owned(), format!("/forms/{}/recipients", self.id));
            self.urls.insert(
                "token".to_owned(),
                format!("/contactform/{}/token", self.uuid.simple()),
            );
        }
        self
    }

    pub fn embedded(&self) -> Self {
        Self {
            urls: BTreeMap::new(),
            ..self.clone()
        }
    }
}

/// Row data for a new form, before the store assigns an id.
#[derive(Debug, Clone)]
pub struct FormDraft {
    pub uuid: Uuid,
    pub secret: String,
    pub owner: UserId,
    pub name: String,
    pub domain: String,
    pub description: Option<String>,
    pub settings: FormSettings,
    pub created_at: DateTime<Utc>,
}

impl FormDraft {
    pub fn into_form(self, id: FormId, owner: User) -> Form {
        Form {
            id,
            uuid: self.uuid,
            secret: self.secret,
            name: self.name,
            domain: self.domain,
            owner: Some(owner.embedded()),
            description: self.description,
            created_at: self.created_at,
            updated_at: self.created_at,
            lock: None,
            settings: self.settings,
            recipient_count: 0,
            urls: BTreeMap::new(),
        }
    }
}

/// Stored form row with foreign keys still unresolved.
#[derive(Debug, Clone)]
pub struct FormRecord {
    pub id: FormId,
    pub uuid: Uuid,
    pub owner_id: Option<UserId>,
    pub secret: String,
    pub name: String,
    pub domain: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub lock: Option<Lock>,
    pub settings: FormSettings,
    pub recipient_count: u64,
}

impl FormRecord {
    pub fn into_form(self, owner: Option<User>) -> Form {
        Form {
            id: self.id,
            uuid: self.uuid,
            secret: self.secret,
            name: self.name,
            domain: self.domain,
            owner,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
            lock: self.lock,
            settings: self.settings,
            recipient_count: self.recipient_count,
            urls: BTreeMap::new(),
        }
    }
}

// ── Recipient ────────────────────────────────────────────────────────────────

/// Delivery target. Carries a copy of its parent form taken at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub form: Form,
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub to_name: Option<String>,
    pub to_email: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub settings: RecipientSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub lock: Option<Lock>,
}

impl Recipient {
    pub fn is_valid(&self) -> bool {
        self.id.is_persisted()
    }
}

/// Recipient fields shared by drafts and stored rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientFields {
    pub from_name: Option<String>,
    pub from_email: Option<String>,
    pub to_name: Option<String>,
    pub to_email: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub settings: RecipientSettings,
}

#[derive(Debug, Clone)]
pub struct RecipientDraft {
    pub form_id: FormId,
    pub fields: RecipientFields,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RecipientRecord {
    pub id: RecipientId,
    pub form_id: FormId,
    pub fields: RecipientFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub lock: Option<Lock>,
}

impl RecipientRecord {
    pub fn into_recipient(self, form: Form) -> Recipient {
        let RecipientFields {
            from_name,
            from_email,
            to_name,
            to_email,
            subject,
            text,
            html,
            settings,
        } = self.fields;
        Recipient {
            id: self.id,
            form: form.embedded(),
            from_name,
            from_email,
            to_name,
            to_email,
            subject,
            text,
            html,
            settings,
            created_at: self.created_at,
            updated_at: self.updated_at,
            lock: self.lock,
        }
    }
}
