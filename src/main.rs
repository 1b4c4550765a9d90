use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use devtrack_api::config::AppConfig;
use devtrack_api::database::Database;
use devtrack_api::media::{CloudinaryStore, MediaStore};
use devtrack_api::routes;
use devtrack_api::services::mailer::{LogMailer, Mailer, SesMailer};
use devtrack_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    devtrack_api::init_tracing();

    let config = AppConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    info!("Starting DevTrack API in {:?} mode", config.environment);

    let db = Database::connect_lazy(&config.database).context("database pool")?;
    if config.database.run_migrations {
        match db.migrate().await {
            Ok(()) => {}
            // the server still answers /health while the database is down
            Err(e) => warn!("Migrations not applied: {}", e),
        }
    }

    let store = CloudinaryStore::new(config.cloudinary.clone()).context("media client")?;
    if !store.is_configured() {
        warn!(
            "Image uploads disabled, missing {}",
            config.missing_cloudinary_settings().join(", ")
        );
    }
    let media: Arc<dyn MediaStore> = Arc::new(store);

    let mailer: Arc<dyn Mailer> = match config.mail.from.clone() {
        Some(from) => Arc::new(SesMailer::from_env(from).await),
        None => {
            warn!("MAIL_FROM not set, outgoing mail is only logged");
            Arc::new(LogMailer)
        }
    };

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(config, db.clone(), media, mailer);
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("DevTrack API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server")?;

    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
