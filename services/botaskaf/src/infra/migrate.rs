use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context as _;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use botaskaf_migration::Migrator;

/// What to do with the schema at process start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationMode {
    /// Apply pending migrations.
    Migrate,
    /// Roll back `n` migrations (all when `None`) and re-apply everything.
    Refresh(Option<u32>),
    /// Roll back `n` migrations.
    Rollback(u32),
    /// Roll back every migration.
    Reset,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MigrationModeError {
    /// Not a mode name. Startup falls back to `migrate`.
    #[error("unknown migration mode: {0}")]
    UnknownMode(String),
    /// A known mode with an unusable step count. Startup aborts.
    #[error("invalid number of steps for migration mode: {0}")]
    InvalidSteps(String),
}

impl FromStr for MigrationMode {
    type Err = MigrationModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, steps) = match s.split_once('=') {
            Some((name, steps)) => (name.trim().to_ascii_lowercase(), Some(steps.trim())),
            None => (s.to_ascii_lowercase(), None),
        };
        let steps = match (name.as_str(), steps) {
            ("refresh" | "rollback", Some(raw)) => Some(
                raw.parse::<u32>()
                    .map_err(|_| MigrationModeError::InvalidSteps(s.to_owned()))?,
            ),
            (_, Some(_)) => return Err(MigrationModeError::UnknownMode(s.to_owned())),
            (_, None) => None,
        };
        match (name.as_str(), steps) {
            ("migrate", _) => Ok(Self::Migrate),
            ("refresh", None | Some(0)) => Ok(Self::Refresh(None)),
            ("refresh", Some(n)) => Ok(Self::Refresh(Some(n))),
            ("rollback", None) => Ok(Self::Rollback(1)),
            ("rollback", Some(n)) => Ok(Self::Rollback(n)),
            ("reset", _) => Ok(Self::Reset),
            _ => Err(MigrationModeError::UnknownMode(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    Applied,
    /// Another instance holds the lock and is migrating.
    Skipped,
}

async fn apply(db: &DatabaseConnection, mode: MigrationMode) -> Result<(), sea_orm::DbErr> {
    match mode {
        MigrationMode::Migrate => Migrator::up(db, None).await,
        MigrationMode::Refresh(None) => Migrator::refresh(db).await,
        MigrationMode::Refresh(Some(n)) => {
            Migrator::down(db, Some(n)).await?;
            Migrator::up(db, None).await
        }
        MigrationMode::Rollback(n) => Migrator::down(db, Some(n)).await,
        MigrationMode::Reset => Migrator::reset(db).await,
    }
}

/// Runs `mode` once across every instance sharing `lock_path`.
///
/// The lock is taken without blocking. An instance that loses the race skips
/// migration; any other failure must abort startup.
pub async fn run_startup_migrations(
    db: &DatabaseConnection,
    mode: MigrationMode,
    lock_path: &Path,
) -> anyhow::Result<MigrationOutcome> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path)
        .with_context(|| format!("open migration lock {}", lock_path.display()))?;
    let mut lock = fd_lock::RwLock::new(file);
    let _guard = match lock.try_write() {
        Ok(guard) => guard,
        Err(e) if e.kind() == ErrorKind::WouldBlock => {
            info!(lock = %lock_path.display(), "migration lock held elsewhere, skipping");
            return Ok(MigrationOutcome::Skipped);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("lock {}", lock_path.display()));
        }
    };

    info!(?mode, "running database migrations");
    apply(db, mode)
        .await
        .with_context(|| format!("database migration ({mode:?}) failed"))?;
    info!(?mode, "database migrations finished");
    Ok(MigrationOutcome::Applied)
}
