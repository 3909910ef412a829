//! # Contact Hub API Server
//!
//! REST/JSON API for users, contacts and addresses, with JWT access tokens,
//! rotating refresh tokens and emailed confirmation codes.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/contacthub \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p contacthub-api
//! ```

use anyhow::Context;
use chrono::Utc;
use contacthub_api::{
    app::{build_router, AppState},
    config::Config,
};
use contacthub_shared::{
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    mail::{smtp::SmtpMailer, LogMailer, Mailer},
    store::{postgres::PgStore, Store},
};
use std::{sync::Arc, time::Duration};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired refresh tokens and confirmation codes are deleted
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "Contact Hub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let pool = create_pool(
        &DatabaseConfig::new(config.database.url.clone())
            .with_max_connections(config.database.max_connections),
    )
    .await
    .context("Failed to connect to the database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let mailer: Arc<dyn Mailer> = match config.mail.smtp_settings() {
        Some(settings) => {
            tracing::info!(host = %settings.host, port = settings.port, "Sending mail through SMTP");
            Arc::new(SmtpMailer::new(&settings)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, confirmation mail will only be logged");
            Arc::new(LogMailer)
        }
    };

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
    spawn_purge_task(store.clone());

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(store, mailer, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Human-readable logs by default, JSON when `LOG_FORMAT=json`
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "contacthub_api=debug,contacthub_shared=debug,tower_http=debug".into()
            }),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Deletes expired refresh tokens and spent confirmation codes periodically
fn spawn_purge_task(store: Arc<dyn Store>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let now = Utc::now();

            match store.purge_expired_refresh_tokens(now).await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "Purged expired refresh tokens"),
                Err(e) => tracing::warn!(error = %e, "Failed to purge expired refresh tokens"),
            }

            match store.purge_expired_confirmation_codes(now).await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "Purged spent confirmation codes"),
                Err(e) => tracing::warn!(error = %e, "Failed to purge confirmation codes"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
