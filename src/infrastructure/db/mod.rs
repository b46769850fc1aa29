pub mod connection;
pub mod sqlite;

use crate::domain::equipment::{NewDataset, StoredDataset};
use crate::domain::error::Result;
use async_trait::async_trait;

pub use sqlite::SqliteDatasetStore;

/// Persistence for uploaded datasets
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn insert(&self, dataset: NewDataset) -> Result<StoredDataset>;

    /// `AppError::NotFound` when no dataset has this id
    async fn get(&self, id: i64) -> Result<StoredDataset>;

    /// Newest first
    async fn list_recent(&self, limit: i64) -> Result<Vec<StoredDataset>>;

    async fn csv_content(&self, id: i64) -> Result<Vec<u8>>;

    /// Delete everything but the `keep` newest datasets, returning the number removed
    async fn retain_latest(&self, keep: i64) -> Result<u64>;
}
