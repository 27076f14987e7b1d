//! Binary entry point: wire settings, store, pipeline, and server.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use voxchart::api::{self, ApiContext};
use voxchart::config::Settings;
use voxchart::db::{Database, RecordStore};
use voxchart::pipeline::{GeminiClient, IntakePipeline};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "startup failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;

    let db = Database::open(&settings.database.path)?;
    let store = RecordStore::new(db.connection());

    let client = Arc::new(GeminiClient::new(&settings.gemini));
    let pipeline = IntakePipeline::new(client, store.clone());

    let ctx = ApiContext { pipeline, store };
    let handle = api::start(settings.server.addr(), ctx).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    handle.shutdown().await;

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("voxchart=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
