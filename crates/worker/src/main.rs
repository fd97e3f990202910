use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vault_events::{EventBus, EventLogger};
use vault_pipeline::{FfmpegTools, PgStore, Transcoder};
use vault_worker::config::WorkerConfig;
use vault_worker::startup::reconcile_unless_shutdown;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env().context("DATABASE_URL must be set")?;

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vault_worker=debug,vault_pipeline=debug".into()),
        )
        .with(config.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!config.json_logs).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!(
        workers = config.transcoder.workers,
        queue_capacity = config.transcoder.queue_capacity,
        waveform_bars = config.transcoder.waveform_bars,
        encode_timeout_secs = config.transcoder.encode_timeout.map(|d| d.as_secs()),
        reconcile_on_startup = config.reconcile_on_startup,
        "Loaded worker configuration"
    );

    // --- Database ---
    let pool = vault_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    vault_db::health_check(&pool)
        .await
        .context("Database health check failed")?;

    vault_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let logger_handle = tokio::spawn(EventLogger::run(event_bus.subscribe()));

    // --- Transcoder ---
    let transcoder = Transcoder::new(
        Arc::new(PgStore::new(pool.clone())),
        Arc::new(FfmpegTools::new(config.transcoder.encode_timeout)),
        event_bus.clone(),
        config.transcoder.clone(),
    );
    transcoder.start();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let interrupted = config.reconcile_on_startup
        && reconcile_unless_shutdown(&transcoder, shutdown.as_mut()).await;
    if !interrupted {
        shutdown.await;
    }

    // --- Shutdown ---
    transcoder.stop().await;

    // The transcoder holds a clone of the bus; both must go before the
    // logger sees the channel close.
    drop(transcoder);
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), logger_handle).await;

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
