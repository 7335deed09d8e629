//! API server entry point.

use std::sync::Arc;

use api::config::{Config, LogFormat};
use api::routes::orders::SharedRepository;
use catalog_client::HttpBookCatalog;
use messaging::InMemoryMessageBus;
use order_store::{InMemoryOrderRepository, PostgresOrderRepository};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn connect_repository(config: &Config) -> Result<SharedRepository, BoxError> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, orders are kept in memory");
        return Ok(Arc::new(InMemoryOrderRepository::new()));
    };

    let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
    let repository = PostgresOrderRepository::new(pool);
    repository.run_migrations().await?;
    tracing::info!("connected to PostgreSQL, migrations applied");
    Ok(Arc::new(repository))
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // 1. Configuration and tracing
    let config = Config::from_env();
    init_tracing(&config);

    // 2. Install Prometheus metrics recorder
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder()?;

    // 3. Collaborators
    let repository = connect_repository(&config).await?;
    let catalog = Arc::new(HttpBookCatalog::new(config.catalog.clone())?);
    let bus = Arc::new(InMemoryMessageBus::new());
    let (state, consumer) =
        api::create_state(repository, catalog, bus, &config.destinations);

    // 4. Dispatch consumer
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_handle = consumer.spawn(shutdown_rx);

    // 5. Serve
    let app = api::create_app(state, metrics_handle);
    let addr = config.addr();
    tracing::info!(%addr, catalog = %config.catalog.base_url, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 6. Stop the consumer
    let _ = shutdown_tx.send(true);
    match consumer_handle.await {
        Ok(Ok(stats)) => tracing::info!(?stats, "dispatch consumer finished"),
        Ok(Err(e)) => tracing::error!(error = %e, "dispatch consumer failed"),
        Err(e) => tracing::error!(error = %e, "dispatch consumer task panicked"),
    }

    tracing::info!("server shut down gracefully");
    Ok(())
}
