mod activation;
mod config;
mod error;
mod handlers;
mod mailer;
mod models;
mod pagination;
mod rest;
mod search;
mod session;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::activation::ActivationSigner;
use crate::config::Config;
use crate::mailer::Mailer;
use crate::session::SessionKeys;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<Config>,
    pub activation: ActivationSigner,
    pub sessions: SessionKeys,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let secret = config.secret_key.as_bytes();
        Self {
            activation: ActivationSigner::new(secret, config.activation_timeout),
            sessions: SessionKeys::new(secret, config.session_ttl),
            db,
            config: Arc::new(config),
            mailer,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "parkslab=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let connect_options: SqliteConnectOptions = config.database_url.parse()?;
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options.create_if_missing(true))
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let mailer = mailer::create_mailer(&config.mail)?;
    tracing::info!(
        activation_timeout_secs = config.activation_timeout.as_secs(),
        mail_from = %config.mail.from_address,
        "configuration loaded"
    );

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(pool, config, mailer);

    let app = rest::router(app_state);
    tracing::info!("REST API listening on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
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

    tracing::info!("shutting down");
}
