//! Claim Ledger - API Server Binary
//!
//! Starts the HTTP API server for the claim ledger system.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin claims-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin claims-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_STORE_BACKEND` - "postgres" (default) or "memory"
//! * `API_LEDGER_BACKEND` - "rpc" (default) or "memory"
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `LEDGER_ENDPOINT` - Ledger node RPC endpoint
//! * `LEDGER_CREDENTIAL_REF` - Name of the signing credential
//! * `LEDGER_CONTRACT_REF` - Claims contract identity on the ledger
//! * `LEDGER_CONFIRMATION_TIMEOUT_MS` - Confirmation wait budget

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::HealthCheckable;
use domain_claims::adapters::{MemoryLedger, RpcLedgerGateway};
use domain_claims::{
    AuditSink, ClaimLifecycleService, ClaimStore, LedgerGateway, MemoryAuditSink,
    MemoryClaimStore,
};
use infra_db::{create_pool, ensure_schema, PgAuditSink, PgClaimStore};
use interface_api::config::{ledger_config_from_env, ApiConfig};
use interface_api::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config();
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = %config.store_backend,
        ledger = %config.ledger_backend,
        "Starting Claim Ledger API Server"
    );

    let (store, audit) = build_store(&config).await?;
    let (ledger, ledger_health) = build_ledger(&config);

    let lifecycle = Arc::new(ClaimLifecycleService::new(store, ledger, audit));

    let state = AppState {
        lifecycle,
        ledger_health,
        config: config.clone(),
    };
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr().parse()?;
    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads API configuration from environment variables.
///
/// Falls back to individual variables and then defaults when the prefixed
/// form is absent.
fn load_config() -> ApiConfig {
    ApiConfig::from_env().unwrap_or_else(|_| ApiConfig {
        host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
        port: std::env::var("API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080),
        jwt_secret: std::env::var("API_JWT_SECRET")
            .unwrap_or_else(|_| "dev-secret-change-in-production".to_string()),
        jwt_expiration_secs: std::env::var("API_JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600),
        database_url: std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("API_DATABASE_URL"))
            .unwrap_or_else(|_| "postgres://localhost/claims".to_string()),
        log_level: std::env::var("API_LOG_LEVEL")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string()),
        store_backend: std::env::var("API_STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string()),
        ledger_backend: std::env::var("API_LEDGER_BACKEND")
            .unwrap_or_else(|_| "rpc".to_string()),
    })
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Wires the claim store and audit sink for the configured backend.
async fn build_store(
    config: &ApiConfig,
) -> Result<(Arc<dyn ClaimStore>, Arc<dyn AuditSink>), Box<dyn std::error::Error>> {
    match config.store_backend.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory claim store; data will not survive a restart");
            Ok((
                Arc::new(MemoryClaimStore::new()),
                Arc::new(MemoryAuditSink::new()),
            ))
        }
        _ => {
            let pool = create_pool(&config.database_url).await?;
            ensure_schema(&pool).await?;
            Ok((
                Arc::new(PgClaimStore::new(pool.clone())),
                Arc::new(PgAuditSink::new(pool)),
            ))
        }
    }
}

/// Wires the ledger gateway for the configured backend.
fn build_ledger(config: &ApiConfig) -> (Arc<dyn LedgerGateway>, Arc<dyn HealthCheckable>) {
    match config.ledger_backend.as_str() {
        "memory" => {
            tracing::warn!("Using in-process ledger; no external chain is involved");
            let ledger = Arc::new(MemoryLedger::new());
            (ledger.clone(), ledger)
        }
        _ => {
            let ledger_config = ledger_config_from_env();
            tracing::info!(endpoint = %ledger_config.endpoint, "Using RPC ledger gateway");
            let ledger = Arc::new(RpcLedgerGateway::new(ledger_config));
            (ledger.clone(), ledger)
        }
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// This enables graceful shutdown of the server, allowing in-flight
/// requests to complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
