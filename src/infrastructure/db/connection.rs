use crate::domain::error::{AppError, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

const DATASETS_SCHEMA_V1: &str = include_str!("../../../resources/datasets/schema.sql");
const DATASETS_SCHEMA_VERSION: i64 = 1;

/// Open the datasets database and bring its schema up to date
pub async fn connect_datasets_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let in_memory = is_in_memory(database_url);

    let mut options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse datasets DB URL: {e}")))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    if !in_memory {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    // An in-memory database lives exactly as long as its single connection
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    let pool = pool_options
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to connect datasets DB: {e}")))?;

    apply_migrations(&pool).await?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Datasets DB health check failed: {e}")))?;

    Ok(pool)
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

async fn apply_migrations(pool: &SqlitePool) -> Result<()> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to read datasets DB user_version: {e}"))
        })?;

    if version > DATASETS_SCHEMA_VERSION {
        return Err(AppError::DatabaseError(format!(
            "Datasets DB schema too new: user_version={} > supported={}",
            version, DATASETS_SCHEMA_VERSION
        )));
    }

    if version < 1 {
        for statement in DATASETS_SCHEMA_V1.split(';') {
            let sql = statement.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql).execute(pool).await.map_err(|e| {
                AppError::DatabaseError(format!("Failed to apply datasets schema statement: {e}"))
            })?;
        }
        tracing::info!(version = DATASETS_SCHEMA_VERSION, "Datasets schema applied");
    }

    let pragma = format!("PRAGMA user_version = {}", DATASETS_SCHEMA_VERSION);
    sqlx::query(&pragma)
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to set user_version: {e}")))?;

    Ok(())
}
