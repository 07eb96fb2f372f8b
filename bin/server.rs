// Agency Directory - Web Server
// Startup finishes (schema + seed) before the listener is bound.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use agency_directory::api::{router, AppState};
use agency_directory::{initialize, logging, Config, DirectoryService};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    logging::init(&config.log);

    info!(agency = %config.agency_name, store = ?config.store, database = %config.database, "starting agency directory");

    // Single initialization phase; no request traffic yet
    let store = config.open_store().context("Failed to open record store")?;
    let report = initialize(&*store).context("Failed to initialize record store")?;
    if report.skipped() {
        info!(people = store.person_count()?, "using existing data");
    }

    let directory = DirectoryService::new(Arc::clone(&store));
    let app = router(AppState::new(directory, &config));

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(addr = %config.bind, "server running");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
