mod config;
mod db;
mod docs;
mod i18n;
mod routes;
mod rpc;
mod services;
mod state;

use std::process::ExitCode;

use crate::config::{AppConfig, ConfigError};
use crate::docs::DocsIndex;

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; real env vars still apply.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "better_t_stack=info,tower_http=info".into()),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;

    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("database initialized");

    // Docs search is optional: without content the index is just empty.
    let docs = match DocsIndex::load(&config.docs_dir).await {
        Ok(index) => {
            tracing::info!(pages = index.len(), dir = %config.docs_dir.display(), "docs index loaded");
            index
        }
        Err(e) => {
            tracing::warn!(error = %e, "docs index unavailable; search disabled");
            DocsIndex::default()
        }
    };

    let port = config.port;
    let state = state::AppState::new(pool, config, docs);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "better-t-stack listening");
    axum::serve(listener, app).await?;
    Ok(())
}
