use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use botaskaf::config::{BotaskafConfig, CacheBackend};
use botaskaf::infra::cache::{AppCache, MemoryEntityCache, RedisEntityCache};
use botaskaf::infra::migrate::{MigrationOutcome, run_startup_migrations};
use botaskaf::router::build_router;
use botaskaf::state::AppState;
use botaskaf_core::config::Config;
use botaskaf_core::tracing::init_tracing;

fn build_cache(config: &BotaskafConfig) -> anyhow::Result<AppCache> {
    Ok(match config.cache {
        CacheBackend::None => AppCache::None,
        CacheBackend::Memory => AppCache::Memory(MemoryEntityCache::new()),
        CacheBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("BOTASKAF_REDIS_URL is required when BOTASKAF_CACHE=redis")?;
            let pool = deadpool_redis::Config::from_url(url)
                .create_pool(Some(deadpool_redis::Runtime::Tokio1))
                .context("failed to create Redis pool")?;
            AppCache::Redis(RedisEntityCache { pool })
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = BotaskafConfig::from_env().context("invalid BOTASKAF_* configuration")?;
    let mode = config.migration_mode()?;
    let token_max_age = config.token_max_age()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let lock_path = config.migration_lock_path();
    if run_startup_migrations(&db, mode, &lock_path).await? == MigrationOutcome::Skipped {
        info!("migrations handled by another instance");
    }

    let cache = build_cache(&config)?;
    info!(backend = ?config.cache, ttl_secs = config.cache_ttl_secs, "entity cache ready");

    let state = AppState {
        db,
        cache,
        cache_ttl: config.cache_ttl(),
        token_max_age,
        setup_token: config.setup_token.clone(),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("botaskaf service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
