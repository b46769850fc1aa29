use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::application::{DatasetUseCase, SummaryEngine};
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::csv::RecordParser;
use crate::infrastructure::db::SqliteDatasetStore;
use crate::interfaces::http::start_server;

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Build the dataset service from configuration
pub async fn build_use_case(config: &AppConfig) -> Result<DatasetUseCase> {
    let parser = RecordParser::new().with_delimiter(config.parser.delimiter_byte()?);
    let store =
        SqliteDatasetStore::init(&config.database.url, config.database.max_connections).await?;

    DatasetUseCase::new(
        SummaryEngine::new(parser),
        Arc::new(store),
        config.datasets.clone(),
    )
    .with_public_base_url(&config.server.public_base_url)
}

pub async fn run() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = AppConfig::load()?;
    init_tracing(&config.log_filter);

    tracing::info!(
        database = %config.database.url,
        retention_limit = config.datasets.retention_limit,
        "Starting chemstat"
    );

    let datasets = Arc::new(build_use_case(&config).await?);
    let server = start_server(datasets, &config.server)?;
    server.await?;

    tracing::info!("Server stopped");
    Ok(())
}
