use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;

use super::connection::connect_datasets_pool;
use super::DatasetStore;
use crate::domain::equipment::{NewDataset, StoredDataset, Summary};
use crate::domain::error::{AppError, Result};

pub struct SqliteDatasetStore {
    pool: SqlitePool,
}

impl SqliteDatasetStore {
    pub async fn init(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = connect_datasets_pool(database_url, max_connections).await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatasetStore for SqliteDatasetStore {
    async fn insert(&self, dataset: NewDataset) -> Result<StoredDataset> {
        let summary_json = serde_json::to_string(&dataset.summary)
            .map_err(|e| AppError::DatabaseError(format!("Failed to encode summary: {e}")))?;

        let result = sqlx::query(
            "INSERT INTO datasets (filename, csv_content, row_count, summary_json, uploaded_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&dataset.filename)
        .bind(&dataset.content)
        .bind(dataset.summary.count)
        .bind(&summary_json)
        .bind(dataset.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert dataset: {e}")))?;

        Ok(StoredDataset {
            id: result.last_insert_rowid(),
            filename: dataset.filename,
            row_count: dataset.summary.count,
            uploaded_at: dataset.uploaded_at,
            summary: dataset.summary,
        })
    }

    async fn get(&self, id: i64) -> Result<StoredDataset> {
        let row = sqlx::query_as::<_, DatasetEntity>(
            "SELECT id, filename, row_count, summary_json, uploaded_at FROM datasets WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch dataset: {e}")))?;

        match row {
            Some(entity) => entity.try_into(),
            None => Err(AppError::NotFound(format!("Dataset not found: {}", id))),
        }
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<StoredDataset>> {
        let rows = sqlx::query_as::<_, DatasetEntity>(
            "SELECT id, filename, row_count, summary_json, uploaded_at FROM datasets \
             ORDER BY uploaded_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list datasets: {e}")))?;

        rows.into_iter().map(StoredDataset::try_from).collect()
    }

    async fn csv_content(&self, id: i64) -> Result<Vec<u8>> {
        let content: Option<Vec<u8>> =
            sqlx::query_scalar("SELECT csv_content FROM datasets WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(format!("Failed to fetch dataset content: {e}"))
                })?;

        content.ok_or_else(|| AppError::NotFound(format!("Dataset not found: {}", id)))
    }

    async fn retain_latest(&self, keep: i64) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM datasets WHERE id NOT IN (
                SELECT id FROM datasets ORDER BY uploaded_at DESC, id DESC LIMIT ?
             )",
        )
        .bind(keep.max(0))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to prune datasets: {e}")))?;

        Ok(result.rows_affected())
    }
}

// Internal entity for database mapping
#[derive(sqlx::FromRow)]
struct DatasetEntity {
    id: i64,
    filename: String,
    row_count: i64,
    summary_json: String,
    uploaded_at: DateTime<Utc>,
}

impl TryFrom<DatasetEntity> for StoredDataset {
    type Error = AppError;

    fn try_from(e: DatasetEntity) -> Result<Self> {
        let summary: Summary = serde_json::from_str(&e.summary_json).map_err(|err| {
            AppError::DatabaseError(format!("Stored summary for dataset {} is unreadable: {err}", e.id))
        })?;

        Ok(Self {
            id: e.id,
            filename: e.filename,
            row_count: e.row_count,
            uploaded_at: e.uploaded_at,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store() -> SqliteDatasetStore {
        SqliteDatasetStore::init("sqlite::memory:", 1).await.unwrap()
    }

    fn new_dataset(name: &str, count: i64, uploaded_at: DateTime<Utc>) -> NewDataset {
        let mut summary = Summary {
            count,
            ..Summary::empty()
        };
        if count > 0 {
            summary.type_distribution.insert("Pump".to_string(), count);
        }
        NewDataset {
            filename: name.to_string(),
            content: format!("type\n{}", "Pump\n".repeat(count as usize)).into_bytes(),
            summary,
            uploaded_at,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let store = store().await;
        let inserted = store
            .insert(new_dataset("a.csv", 2, Utc::now()))
            .await
            .unwrap();

        let fetched = store.get(inserted.id).await.unwrap();
        assert_eq!(fetched.filename, "a.csv");
        assert_eq!(fetched.row_count, 2);
        assert_eq!(fetched.summary, inserted.summary);

        let content = store.csv_content(inserted.id).await.unwrap();
        assert_eq!(content, b"type\nPump\nPump\n".to_vec());
    }

    #[tokio::test]
    async fn test_missing_dataset_is_not_found() {
        let store = store().await;
        assert!(matches!(store.get(99).await, Err(AppError::NotFound(_))));
        assert!(matches!(store.csv_content(99).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_recent_is_newest_first() {
        let store = store().await;
        let base = Utc::now();
        for i in 0..3 {
            store
                .insert(new_dataset(&format!("{i}.csv"), i, base + Duration::seconds(i)))
                .await
                .unwrap();
        }

        let names: Vec<_> = store
            .list_recent(2)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.filename)
            .collect();
        assert_eq!(names, vec!["2.csv", "1.csv"]);
    }

    #[tokio::test]
    async fn test_retain_latest_prunes_oldest() {
        let store = store().await;
        let base = Utc::now();
        let mut ids = Vec::new();
        for i in 0..7 {
            let stored = store
                .insert(new_dataset(&format!("{i}.csv"), 1, base + Duration::seconds(i)))
                .await
                .unwrap();
            ids.push(stored.id);
        }

        let removed = store.retain_latest(5).await.unwrap();

        assert_eq!(removed, 2);
        assert!(matches!(store.get(ids[0]).await, Err(AppError::NotFound(_))));
        assert!(matches!(store.get(ids[1]).await, Err(AppError::NotFound(_))));
        assert_eq!(store.list_recent(10).await.unwrap().len(), 5);
    }
}
