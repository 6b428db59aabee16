use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod domain;
mod health;
mod http;
mod messaging;
mod metrics;
mod persistence;
mod utils;

use config::{Settings, StoreSettings};
use domain::order::OrderService;
use health::{HealthCheckable, StoreHealth};
use messaging::ProductClient;
use persistence::{InMemoryOrderRepository, OrderRepository, PgOrderRepository};
use utils::{retry_with_backoff, RetryConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO, override with RUST_LOG
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,orders_ms=debug"))
        )
        .init();

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::info!(
        http_port = settings.http_port,
        policy = ?settings.status_policy,
        "Starting orders service"
    );

    // === 1. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Order store ===
    let (repository, pg): (Arc<dyn OrderRepository>, Option<PgOrderRepository>) = match &settings.store {
        StoreSettings::Postgres { url, max_connections } => {
            let (url, max_connections) = (url.as_str(), *max_connections);
            let pg = retry_with_backoff(RetryConfig::startup(), move |attempt| {
                tracing::info!(attempt, "Connecting to Postgres...");
                PgOrderRepository::connect(url, max_connections)
            })
            .await
            .context("failed to connect to Postgres")?;
            pg.init_schema().await.context("failed to initialise schema")?;
            (Arc::new(pg.clone()) as Arc<dyn OrderRepository>, Some(pg))
        }
        StoreSettings::Memory => {
            tracing::warn!("Using in-memory order store, orders will not survive a restart");
            (Arc::new(InMemoryOrderRepository::new()) as Arc<dyn OrderRepository>, None)
        }
    };

    // === 3. Product client (request/reply over Redpanda) ===
    let products = Arc::new(
        ProductClient::start(settings.product_client(), metrics.clone())
            .context("failed to start product client")?,
    );

    // === 4. Order service + HTTP ===
    let orders = Arc::new(OrderService::new(
        repository.clone(),
        products.clone(),
        settings.status_policy,
        metrics.clone(),
    ));

    let health_checks: Vec<Arc<dyn HealthCheckable>> = vec![
        Arc::new(StoreHealth::new(repository)) as Arc<dyn HealthCheckable>,
        products.clone() as Arc<dyn HealthCheckable>,
    ];

    let state = http::AppState {
        orders,
        metrics,
        health_checks,
    };

    let served = http::serve(state, settings.http_port).await;

    // === 5. Shutdown ===
    tracing::info!("HTTP server stopped, shutting down");
    products.shutdown().await;
    if let Some(pg) = pg {
        pg.close().await;
    }

    served.context("HTTP server failed")?;
    tracing::info!("Orders service stopped");
    Ok(())
}
