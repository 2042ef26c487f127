use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use tracing::warn;

use botaskaf_core::config::Config;

use crate::domain::types::CACHE_TTL_SECS;
use crate::infra::migrate::{MigrationMode, MigrationModeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    None,
    Memory,
    Redis,
}

/// Service configuration, read from `BOTASKAF_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct BotaskafConfig {
    /// Relational store URL (postgres, mysql or sqlite).
    pub database_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cache: CacheBackend,
    /// Required when `cache` is `redis`.
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_token_max_age_secs")]
    pub token_max_age_secs: u64,
    #[serde(default = "default_db_migration")]
    pub db_migration: String,
    #[serde(default)]
    pub migration_lock: Option<PathBuf>,
    /// Enables `POST /setup` when set.
    #[serde(default)]
    pub setup_token: Option<String>,
}

fn default_port() -> u16 {
    3110
}

fn default_cache_ttl_secs() -> u64 {
    CACHE_TTL_SECS
}

fn default_token_max_age_secs() -> u64 {
    3600
}

fn default_db_migration() -> String {
    "migrate".to_owned()
}

impl Config for BotaskafConfig {
    const PREFIX: Option<&'static str> = Some("BOTASKAF_");
}

impl BotaskafConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn token_max_age(&self) -> anyhow::Result<chrono::Duration> {
        i64::try_from(self.token_max_age_secs)
            .ok()
            .and_then(chrono::TimeDelta::try_seconds)
            .with_context(|| {
                format!(
                    "BOTASKAF_TOKEN_MAX_AGE_SECS out of range: {}",
                    self.token_max_age_secs
                )
            })
    }

    /// Unknown mode names fall back to `migrate`; a bad step count is fatal.
    pub fn migration_mode(&self) -> anyhow::Result<MigrationMode> {
        match self.db_migration.parse::<MigrationMode>() {
            Ok(mode) => Ok(mode),
            Err(e @ MigrationModeError::UnknownMode(_)) => {
                warn!(error = %e, "falling back to migrate");
                Ok(MigrationMode::Migrate)
            }
            Err(e @ MigrationModeError::InvalidSteps(_)) => {
                Err(anyhow::Error::new(e).context("invalid BOTASKAF_DB_MIGRATION"))
            }
        }
    }

    pub fn migration_lock_path(&self) -> PathBuf {
        self.migration_lock
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("botaskaf_db.lock"))
    }
}
