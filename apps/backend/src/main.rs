//! # Receipt Manager Backend Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load settings (`../config.yaml`, or the environment when `RUN_IN_DOCKER` is set)
//! 3. Provision the TLS certificate when `useSSL` is on
//! 4. Ensure the API token and write the web UI settings
//! 5. Select the database, create the schema, check health

use anyhow::Context;
use receipt_backend::{init_tracing, AppContext, BootstrapPaths};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Starting Receipt Manager backend...");

    let ctx = AppContext::new(BootstrapPaths::default());
    let db = ctx
        .bootstrap()
        .await
        .context("Backend bootstrap failed")?;

    let settings = ctx.settings()?;
    info!(
        mode = %db.mode(),
        ssl = settings.use_ssl,
        port = %settings.backend_port,
        "Backend ready"
    );

    Ok(())
}
