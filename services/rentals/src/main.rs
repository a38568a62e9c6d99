//! Movie rental HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage and the token validator into the router, then
//! serves the API and the metrics listener until shutdown.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use rentals::app::{AppState, build_router};
use rentals::auth::TokenValidator;
use rentals::config::{RentalsConfig, StorageBackend};
use rentals::observability;
use rentals::store::RentalStore;
use rentals::store::memory::InMemoryStore;
use rentals::store::postgres::PostgresStore;
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RentalsConfig::from_env_or_yaml().context("load rentals config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: RentalsConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("rentals");
    let state = build_state(&config).await?;
    tracing::info!(
        backend = state.store.backend_name(),
        durable = state.store.is_durable(),
        issuer = %config.auth.issuer,
        "rental store ready"
    );
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);
    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "rentals listening");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    metrics_task.abort();
    let _ = metrics_task.await;
    tracing::info!("rentals stopped");
    Ok(())
}

async fn build_state(config: &RentalsConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn RentalStore> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(
                PostgresStore::connect(pg)
                    .await
                    .context("connect postgres store")?,
            )
        }
    };
    let token_validator = TokenValidator::new(&config.auth)?;
    Ok(AppState {
        store,
        token_validator,
    })
}
