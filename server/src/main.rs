use axum::Router;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use doorcheck_server::config::{Config, StoreBackend};
use doorcheck_server::routes::create_routes;
use doorcheck_server::state::AppState;
use doorcheck_server::store::{
    EventStore, MemoryEventStore, MemoryTicketStore, PgEventStore, PgTicketStore, TicketStore,
};

const DB_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let config = Config::from_env();

    let (tickets, events): (Arc<dyn TicketStore>, Arc<dyn EventStore>) = match config.store_backend
    {
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(DB_ACQUIRE_TIMEOUT)
                .connect(&config.database_url)
                .await
                .expect("Failed to connect to database");

            tracing::info!("Successfully connected to database");

            sqlx::migrate!()
                .run(&pool)
                .await
                .expect("Failed to run migrations");

            tracing::info!("Migrations run successfully");

            (
                Arc::new(PgTicketStore::new(pool.clone())),
                Arc::new(PgEventStore::new(pool)),
            )
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory ticket store; tickets are lost on restart");
            (
                Arc::new(MemoryTicketStore::new()),
                Arc::new(MemoryEventStore::new()),
            )
        }
    };

    if config.access.check_in_is_open() {
        tracing::warn!("CHECKIN_STATION_KEYS is not set; anyone who can reach /api/checkin can admit tickets");
    } else {
        tracing::info!(
            stations = config.access.station_count(),
            "Check-in restricted to configured stations"
        );
    }
    if !config.access.admin_enabled() {
        tracing::info!("ADMIN_TOKEN is not set; event settings are read-only");
    }

    let state = AppState::new(tickets, events, config.retry, config.access.clone());
    let app: Router = create_routes(state, &config);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");
    tracing::info!("Server running at http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
