//! CampusGate Server
//!
//! Single sign-on gateway in front of the university identity (CAS) portal and
//! the course registration portal:
//! - One login establishes both portal sessions
//! - Registration pages come back as structured JSON
//! - Timetable, exam and grade reads are relayed from the student app
//! - Sessions are bounded, expire after inactivity and live only in memory
//!
//! Usage:
//! ```bash
//! # With config file
//! campusgate-server --config campusgate.yaml
//!
//! # Environment variables override the file, --port overrides both
//! CAMPUSGATE_MAX_SESSIONS=20 campusgate-server --config campusgate.yaml --port 8080
//! ```
//!
//! Test with:
//! ```bash
//! curl http://localhost:3001/api/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "2110123", "password": "..."}'
//!
//! curl http://localhost:3001/api/dkmh/periods -H "Authorization: Bearer <token>"
//! ```

mod config;
mod error;
mod middleware;
mod routes;

use anyhow::anyhow;
use campusgate_core::SessionStore;
use campusgate_gateway::AuthenticationOrchestrator;
use campusgate_observability::{HealthState, Metrics, SessionCapacityCheck, health_router};
use campusgate_session::{InMemorySessionStore, spawn_sweep_task};
use clap::Parser;
use config::ServerConfig;
use routes::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// CampusGate Server - university portal SSO gateway
#[derive(Parser)]
#[command(name = "campusgate-server")]
#[command(about = "Single sign-on gateway for the university portals", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, value_name = "FILE", env = "CAMPUSGATE_CONFIG")]
    config: Option<String>,

    /// Port to listen on
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        ServerConfig::from_file(config_path)
            .map_err(|e| anyhow!("failed to load {}: {}", config_path, e))?
    } else {
        ServerConfig::default()
    };

    // Merge environment variables (they override config file)
    config.merge_env();

    // CLI flags have the highest precedence
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration: {}", e))?;

    let log_level = match config.logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!("{}", log_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &cli.config {
        Some(path) => info!("📁 Loaded configuration from: {}", path),
        None => info!("📁 Using default configuration"),
    }

    let metrics = Metrics::new().map_err(|e| anyhow!("failed to register metrics: {}", e))?;
    let metrics = Arc::new(metrics);

    let store = Arc::new(InMemorySessionStore::new(&config.session));
    let store: Arc<dyn SessionStore> = store;
    info!(
        "🔐 Session store: {} sessions max, {}s idle expiry",
        config.session.max_sessions, config.session.ttl_secs
    );

    let orchestrator = Arc::new(AuthenticationOrchestrator::new(
        store.clone(),
        config.portals.portal_config(),
        metrics.clone(),
    )?);
    info!("   Identity portal:     {}", config.portals.identity_login_url);
    info!("   Registration portal: {}", config.portals.app_base_url);

    let sweep_metrics = metrics.clone();
    let sweep_task = spawn_sweep_task(
        store.clone(),
        config.session.sweep_interval(),
        move |removed, remaining| {
            sweep_metrics.record_sessions_expired(removed);
            sweep_metrics.set_active_sessions(remaining);
        },
    );

    let health_state = HealthState::with_readiness_checker(
        metrics,
        Arc::new(SessionCapacityCheck::new(store)),
    );

    let app = routes::app(
        AppState { orchestrator },
        health_router(health_state),
        config.server.cors_origin.as_deref(),
    )
    .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("");
    info!("✅ CampusGate listening on http://{}", addr);
    info!("   Auth:");
    info!("   - Login:  POST http://{}/api/auth/login", addr);
    info!("   - Logout: POST http://{}/api/auth/logout", addr);
    info!("   - Status: GET  http://{}/api/auth/status", addr);
    info!("   Registration:        http://{}/api/dkmh/*", addr);
    info!("   Student data:        http://{}/api/student/*", addr);
    info!("   Observability:");
    info!("   - Health check:       http://{}/healthz", addr);
    info!("   - Readiness check:    http://{}/readyz", addr);
    info!("   - Prometheus metrics: http://{}/metrics", addr);
    info!("");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweep_task.shutdown().await;
    info!("Server stopped");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
