use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crm_api::auth::AuthKeys;
use crm_api::config::{config, AppConfig, StoreBackend};
use crm_api::database::DatabaseManager;
use crm_api::identity::GrantTable;
use crm_api::store::seed::{parse_seed, seed_users};
use crm_api::store::{MemoryStore, PgStore, Store};
use crm_api::{app, AppState};

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    let store: Arc<dyn Store> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => {
            let db = DatabaseManager::connect(&config.database)
                .await
                .context("connecting to PostgreSQL")?;
            if config.database.run_migrations {
                db.migrate().await.context("applying schema")?;
            }
            Arc::new(PgStore::new(db))
        }
    };

    match &config.store.seed_file {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading seed file {}", path))?;
            let users = parse_seed(&json)?;
            let created = seed_users(store.as_ref(), &users).await?;
            tracing::info!("Seeded {} of {} users from {}", created, users.len(), path);
        }
        None if config.store.backend == StoreBackend::Memory => {
            tracing::warn!("No CRM_SEED_FILE set; the in-memory store has no users to log in with");
        }
        None => {}
    }
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crm_api=info,tower_http=info")),
        )
        .init();

    let config = config();
    tracing::info!("Starting CRM API in {:?} mode", config.environment);

    let keys = AuthKeys::from_config(&config.security).context("JWT_SECRET must be set")?;
    let store = open_store(config).await?;
    let state = AppState::new(store, GrantTable::default(), keys);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("CRM API listening on http://{}", bind_addr);
    axum::serve(listener, app(state, config)).await?;
    Ok(())
}
