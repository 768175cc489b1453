use std::sync::Arc;

use recommendations_api::{
    config::{Config, StoreKind},
    db::{self, MemoryStore, PgStore, Store},
    routes::{create_router, AppState},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recommendations_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match config.store {
        StoreKind::Postgres => {
            let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
            db::run_migrations(&pool).await?;
            tracing::info!(max_connections = config.database_max_connections, "Connected to PostgreSQL");
            Arc::new(PgStore::new(pool))
        }
        StoreKind::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let app = create_router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
