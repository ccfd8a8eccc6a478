//! QuikChat Server: real-time delivery for direct and group chat.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use quikchat_api::probe::{BufferProbe, DatabaseProbe, HealthProbe};
use quikchat_api::{AppState, build_app};
use quikchat_auth::JwtAuthenticator;
use quikchat_cache::BufferManager;
use quikchat_cache::memory::CachedUserDirectory;
use quikchat_core::config::AppConfig;
use quikchat_core::traits::{EventBuffer, GroupDirectory, UserDirectory};
use quikchat_database::{DatabasePool, PgEventStore, PgGroupDirectory, PgUserDirectory};
use quikchat_realtime::RealtimeEngine;
use quikchat_service::EventService;
use quikchat_worker::{BufferSweep, CronScheduler};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e:#}");
        std::process::exit(1);
    }
}

/// Load `config/default.toml` (or `QUIKCHAT_CONFIG`), the `QUIKCHAT_ENV`
/// overlay, and `QUIKCHAT__*` environment overrides.
fn load_configuration() -> anyhow::Result<AppConfig> {
    let base = std::env::var("QUIKCHAT_CONFIG").unwrap_or_else(|_| "config/default".to_string());
    let env = std::env::var("QUIKCHAT_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load_from(&base, &env)
        .with_context(|| format!("loading '{base}' (env: {env})"))
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting QuikChat v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Database connection + migrations ─────────────────
    let db = DatabasePool::connect(&config.database)
        .await
        .context("database connection failed")?;

    // ── Step 2: Event buffer ─────────────────────────────────────
    let buffer = BufferManager::new(&config.cache)
        .await
        .context("event buffer init failed")?;
    tracing::info!(backend = buffer.backend(), "Event buffer initialized");
    let buffer: Arc<dyn EventBuffer> = Arc::new(buffer);

    // ── Step 3: Stores and directories ───────────────────────────
    let store = Arc::new(PgEventStore::new(db.pool().clone()));
    let users: Arc<dyn UserDirectory> = Arc::new(CachedUserDirectory::new(
        Arc::new(PgUserDirectory::new(db.pool().clone())),
        &config.cache.profiles,
    ));
    let groups: Arc<dyn GroupDirectory> = Arc::new(PgGroupDirectory::new(db.pool().clone()));
    let events = EventService::new(Arc::clone(&buffer), store.clone());

    // ── Step 4: Real-time engine ─────────────────────────────────
    let engine = RealtimeEngine::new(config.realtime.clone(), events.clone(), users, groups);

    // ── Step 5: Reconciliation sweep ─────────────────────────────
    let scheduler = if config.worker.enabled {
        let sweep = Arc::new(BufferSweep::new(Arc::clone(&buffer), store, &config.worker));
        let scheduler = CronScheduler::new().await?;
        scheduler
            .register_buffer_sweep(sweep, &config.worker.sweep_schedule)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Buffer sweep disabled");
        None
    };

    // ── Step 6: HTTP server ──────────────────────────────────────
    let probes: Vec<Arc<dyn HealthProbe>> = vec![
        Arc::new(DatabaseProbe(db.clone())),
        Arc::new(BufferProbe(Arc::clone(&buffer))),
    ];
    let state = AppState::new(
        Arc::new(JwtAuthenticator::new(&config.auth)),
        events,
        engine.clone(),
        probes,
    );
    let app = build_app(state, &config.server.cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("QuikChat server listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    });
    let mut server = tokio::spawn(server.into_future());

    tokio::select! {
        joined = &mut server => {
            joined.context("server task failed")?.context("server error")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            // Open sockets keep the server alive until the engine closes them.
            engine.shutdown().await;
            let _ = shutdown_tx.send(true);

            let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
            match tokio::time::timeout(grace, &mut server).await {
                Ok(joined) => joined.context("server task failed")?.context("server error")?,
                Err(_) => {
                    tracing::warn!(
                        grace_secs = grace.as_secs(),
                        "Connections still open after grace period, aborting"
                    );
                    server.abort();
                }
            }
        }
    }

    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler shutdown failed");
        }
    }
    db.close().await;

    tracing::info!("QuikChat server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
