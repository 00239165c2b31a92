//! # Sellos G API Server
//!
//! HTTP backend for the Sellos G shop: staff and customer authentication,
//! the product catalogue, order management and back-office notifications.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p sellos-api
//! ```

use sellos_api::{
    app::{build_router, AppState},
    config::Config,
};
use sellos_shared::{
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pg_store::PgStore,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    mail::{LogMailer, Mailer, SmtpMailer},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "sellos_api=debug,sellos_shared=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(config.api.json_logs);

    tracing::info!(
        "Sellos G API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    if !config.api.production {
        ensure_database_exists(&config.database.url).await?;
    }

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    run_migrations(&pool).await?;

    let mailer: Arc<dyn Mailer> = match config.mail.smtp_settings() {
        Some(settings) => {
            tracing::info!(host = %settings.host, port = settings.port, "SMTP mail enabled");
            Arc::new(SmtpMailer::new(&settings)?)
        }
        None => {
            tracing::warn!("SMTP_HOST not set; emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), mailer, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown signal received, closing database pool");
    close_pool(pool).await;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
