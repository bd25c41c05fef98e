//! # Tasklane API Server
//!
//! Multi-user task-management backend: registration, login and owner-scoped
//! task CRUD over a JSON API.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/tasklane \
//! JWT_SECRET=$(openssl rand -hex 32) \
//!     cargo run -p tasklane-api
//! ```
//!
//! `DATABASE_URL=memory://` runs against an in-process store.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tasklane_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasklane_shared::db::{
    memory::MemoryStore,
    migrations::run_migrations,
    pool::{close_pool, create_pool, PoolConfig},
    postgres::PgStore,
    store::Store,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tasklane_api=debug,tasklane_shared=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Tasklane API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;

    let mut pg_pool = None;

    let store: Arc<dyn Store> = if config.database.is_memory() {
        tracing::warn!("Using in-memory store; data will not survive a restart");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool(PoolConfig::from(&config.database))
            .await
            .context("Failed to connect to database")?;

        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        pg_pool = Some(pool.clone());
        Arc::new(PgStore::new(pool))
    };

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(pool) = pg_pool {
        close_pool(pool).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, exiting...");
}
