use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod rescorer;

use common::{
    database::{self, DatabaseConfig},
    repositories::Repositories,
};
use config::WorkerConfig;
use rescorer::RiskRescorer;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting risk worker");

    let config = WorkerConfig::from_env();

    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;
    if !database::health_check(&pool).await? {
        anyhow::bail!("Failed to connect to database");
    }

    let rescorer = RiskRescorer::new(Repositories::postgres(pool), config.batch_size);
    let mut scheduler = rescorer.start(&config.schedule).await?;

    info!("Risk worker started successfully");

    // Keep the worker running
    tokio::signal::ctrl_c().await?;
    info!("Shutting down risk worker");
    scheduler.shutdown().await?;

    Ok(())
}
