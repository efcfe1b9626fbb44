use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use freelance_api_rust::app::{build_router, AppState};
use freelance_api_rust::authz::PolicyTable;
use freelance_api_rust::config::AppConfig;
use freelance_api_rust::database::{
    DatabaseManager, MemoryStore, MissionStore, PgMissionStore, PgRoleStore, RoleStore,
};
use freelance_api_rust::services::RoleResolver;
use freelance_api_rust::types::{Identity, Role};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting Freelance API in {:?} mode", config.environment);

    // A broken policy stops startup rather than serving with a partial table
    let policy = PolicyTable::load(config.authz.policy_file.as_deref()).context("failed to load authorization policy")?;
    for role in policy.roles() {
        tracing::info!("Policy for {}: {} patterns", role, policy.patterns_for(role).len());
    }

    let (accounts, missions) = open_stores(&config).await?;
    bootstrap_admin(&config, accounts.as_ref()).await?;
    let port = config.server.port;

    let state = AppState::new(config, policy, accounts, missions)?;
    spawn_cache_purge(state.roles.clone());

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Freelance API listening on http://{}", bind_addr);
    axum::serve(listener, build_router(state)).await.context("server error")?;
    Ok(())
}

async fn open_stores(config: &AppConfig) -> anyhow::Result<(Arc<dyn RoleStore>, Arc<dyn MissionStore>)> {
    if config.database.url.is_some() {
        let pool = DatabaseManager::connect(&config.database).await?;
        return Ok((Arc::new(PgRoleStore::new(pool.clone())), Arc::new(PgMissionStore::new(pool))));
    }

    tracing::warn!("DATABASE_URL not set, using the in-memory store");
    let store = MemoryStore::new();
    Ok((Arc::new(store.clone()), Arc::new(store)))
}

/// Create or promote the configured first administrator
async fn bootstrap_admin(config: &AppConfig, accounts: &dyn RoleStore) -> anyhow::Result<()> {
    let Some(admin) = &config.authz.bootstrap_admin else {
        return Ok(());
    };

    accounts
        .upsert_role(&Identity::new(admin.as_str()), Role::Admin)
        .await
        .with_context(|| format!("failed to bootstrap administrator '{}'", admin))?;
    tracing::info!("Bootstrap administrator '{}' is ADMIN", admin);
    Ok(())
}

/// Drop expired role cache entries once per TTL
fn spawn_cache_purge(roles: Arc<RoleResolver>) {
    let period = roles.ttl().max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = roles.purge_expired();
            if purged > 0 {
                tracing::debug!("Purged {} expired role cache entries", purged);
            }
        }
    });
}
