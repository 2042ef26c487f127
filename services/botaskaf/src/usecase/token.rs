use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use botaskaf_cipher::{CipherError, decrypt, encrypt};

use crate::domain::repository::{EntityCache, FormRepository, UserRepository};
use crate::domain::types::TOKEN_FUTURE_SKEW_SECS;
use crate::error::BotaskafError;
use crate::usecase::cache::Cached;
use crate::usecase::form::{FormLookup, load_form};

/// Time-bound anti-spam token handed to the public contact form widget.
pub struct IssueTokenUseCase<F: FormRepository, U: UserRepository, C: EntityCache> {
    pub forms: F,
    pub users: U,
    pub cached: Cached<C>,
}

impl<F, U, C> IssueTokenUseCase<F, U, C>
where
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    pub async fn execute(&self, uuid: Uuid, now: DateTime<Utc>) -> Result<String, BotaskafError> {
        let form = load_form(&self.forms, &self.users, &self.cached, FormLookup::Uuid(uuid), None)
            .await?;
        if !form.is_valid() || form.secret.is_empty() {
            return Err(BotaskafError::Cipher(CipherError::InvalidSecret));
        }
        encrypt(&form.secret, now).map_err(BotaskafError::Cipher)
    }
}

/// Checks a token submitted with a contact form message.
pub struct VerifyTokenUseCase<F: FormRepository, U: UserRepository, C: EntityCache> {
    pub forms: F,
    pub users: U,
    pub cached: Cached<C>,
    pub max_age: Duration,
}

impl<F, U, C> VerifyTokenUseCase<F, U, C>
where
    F: FormRepository,
    U: UserRepository,
    C: EntityCache,
{
    /// Returns the issue time. Tokens from the future beyond the allowed skew
    /// and tokens older than `max_age` are rejected.
    pub async fn execute(
        &self,
        uuid: Uuid,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, BotaskafError> {
        let form = load_form(&self.forms, &self.users, &self.cached, FormLookup::Uuid(uuid), None)
            .await?;
        let issued = decrypt(&form.secret, token).map_err(|_| BotaskafError::InvalidToken)?;
        if issued > now + Duration::seconds(TOKEN_FUTURE_SKEW_SECS) {
            return Err(BotaskafError::InvalidToken);
        }
        if now - issued > self.max_age {
            return Err(BotaskafError::InvalidToken);
        }
        Ok(issued)
    }
}
