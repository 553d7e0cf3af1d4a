mod config;
mod db;
mod errors;
mod extraction;
mod inference;
mod models;
mod resumes;
mod routes;
mod state;
mod upload;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::resumes::files::FileStore;
use crate::resumes::store::PgResumeStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; missing or malformed variables abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screening API v{}", env!("CARGO_PKG_VERSION"));

    let policy = config.upload_policy()?;
    info!(
        "Upload policy: max {}MB, extensions [{}]",
        policy.max_megabytes(),
        policy.extensions().collect::<Vec<_>>().join(", ")
    );

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    let files = FileStore::new(config.upload_dir.clone());
    info!("Storing uploads under {}", files.root().display());

    let state = AppState {
        store: Arc::new(PgResumeStore::new(db)),
        files,
        policy: Arc::new(policy),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
