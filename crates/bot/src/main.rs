//! Karakeep Telegram bot.
//!
//! Receives Telegram updates on a webhook, saves messages to each user's
//! Karakeep server and reports progress by editing an acknowledgment.

mod config;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use database::{Database, SecretBox, SqliteUserStore};
use karakeep_client::KarakeepConnector;
use keep_core::UserStore;
use orchestrator::Pipeline;
use telegram_client::{BotConfig, TelegramClient};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use update_listener::{webhook_router, UpdateDispatcher, WebhookState};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        addr = %config.listen_addr,
        path = %config.webhook_path,
        secret = config.webhook_secret.is_some(),
        version = %config.version,
        "Starting Karakeep bot"
    );

    let db = Database::open_file(&config.db_path).await?;
    db.migrate().await?;
    info!(path = %config.db_path.display(), "Database ready");

    let secret = SecretBox::from_secret(&config.master_key)?;
    let store: Arc<dyn UserStore> = Arc::new(SqliteUserStore::new(db.clone(), secret));

    let telegram = Arc::new(TelegramClient::new(
        BotConfig::new(&config.telegram_token).with_api_url(&config.telegram_api_url),
    )?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let pipeline = Arc::new(
        Pipeline::new(
            telegram.clone(),
            telegram.clone(),
            Arc::new(KarakeepConnector::default()),
            Arc::clone(&store),
        )
        .with_config(config.pipeline())
        .with_shutdown(shutdown_rx),
    );

    let dispatcher = Arc::new(UpdateDispatcher::new(
        pipeline,
        store,
        telegram,
        config.version.clone(),
        config.media_group_delay,
    ));

    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(webhook_router(
            &config.webhook_path,
            WebhookState::new(dispatcher, config.webhook_secret.clone()),
        ));

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Webhook server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Wakes every in-flight polling waiter.
            let _ = shutdown_tx.send(true);
        })
        .await?;

    db.close().await;
    info!("Shutdown complete");

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl-C handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C"),
        () = terminate => info!("Received SIGTERM"),
    }
}
