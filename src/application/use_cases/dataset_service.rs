// ============================================================
// DATASET USE CASE
// ============================================================
// Upload policy, persistence and retrieval of equipment datasets

use std::sync::Arc;

use chrono::Utc;
use url::Url;

use crate::application::use_cases::summary_engine::SummaryEngine;
use crate::domain::equipment::{DatasetDetail, DatasetEntry, NewDataset};
use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::DatasetPolicy;
use crate::infrastructure::db::DatasetStore;

const ACCEPTED_EXTENSION: &str = ".csv";

/// A rendered report ready for download
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub filename: String,
    pub content: Vec<u8>,
}

pub struct DatasetUseCase {
    engine: SummaryEngine,
    store: Arc<dyn DatasetStore>,
    policy: DatasetPolicy,
    public_base_url: Option<Url>,
}

impl DatasetUseCase {
    pub fn new(engine: SummaryEngine, store: Arc<dyn DatasetStore>, policy: DatasetPolicy) -> Self {
        Self {
            engine,
            store,
            policy,
            public_base_url: None,
        }
    }

    /// Use absolute `csv_file` links rooted at `base`
    pub fn with_public_base_url(mut self, base: &str) -> Result<Self> {
        let normalized = format!("{}/", base.trim_end_matches('/'));
        let url = Url::parse(&normalized).map_err(|e| {
            AppError::ValidationError(format!("Invalid public base URL '{}': {}", base, e))
        })?;
        self.public_base_url = Some(url);
        Ok(self)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.policy.max_upload_bytes
    }

    /// Summarize and persist an uploaded CSV file, then apply retention
    pub async fn upload(&self, filename: &str, content: Vec<u8>) -> Result<DatasetDetail> {
        let filename = base_name(filename);
        if !filename.to_ascii_lowercase().ends_with(ACCEPTED_EXTENSION) {
            return Err(AppError::ValidationError(format!(
                "Only {} files are accepted, got '{}'",
                ACCEPTED_EXTENSION, filename
            )));
        }
        if content.is_empty() {
            return Err(AppError::ValidationError("Uploaded file is empty".to_string()));
        }
        if content.len() > self.policy.max_upload_bytes {
            return Err(AppError::PayloadTooLarge(format!(
                "File is {} bytes, limit is {} bytes",
                content.len(),
                self.policy.max_upload_bytes
            )));
        }

        let summary = self.engine.summarize(&content)?;
        let stored = self
            .store
            .insert(NewDataset {
                filename: filename.to_string(),
                content,
                summary,
                uploaded_at: Utc::now(),
            })
            .await?;

        tracing::info!(
            dataset_id = stored.id,
            filename = %stored.filename,
            rows = stored.row_count,
            "Dataset uploaded"
        );

        let removed = self.store.retain_latest(self.policy.retention_limit).await?;
        if removed > 0 {
            tracing::info!(
                removed,
                retention_limit = self.policy.retention_limit,
                "Pruned old datasets"
            );
        }

        let csv_file = self.csv_file_url(stored.id);
        Ok(stored.into_detail(csv_file))
    }

    /// Most recent datasets, newest first
    pub async fn list(&self) -> Result<Vec<DatasetEntry>> {
        let datasets = self.store.list_recent(self.policy.retention_limit).await?;
        Ok(datasets
            .iter()
            .map(|d| d.entry(self.csv_file_url(d.id)))
            .collect())
    }

    pub async fn get(&self, id: i64) -> Result<DatasetDetail> {
        let stored = self.store.get(id).await?;
        let csv_file = self.csv_file_url(stored.id);
        Ok(stored.into_detail(csv_file))
    }

    /// Original filename and raw bytes of an uploaded file
    pub async fn csv_content(&self, id: i64) -> Result<(String, Vec<u8>)> {
        let stored = self.store.get(id).await?;
        let content = self.store.csv_content(id).await?;
        Ok((stored.filename, content))
    }

    /// Render the stored summary of a dataset as a PDF report
    pub async fn report(&self, id: i64) -> Result<RenderedReport> {
        let stored = self.store.get(id).await?;
        let metadata = stored.report_metadata();

        let content = self
            .engine
            .render_report(&metadata, &stored.summary)
            .map_err(|e| {
                tracing::error!(dataset_id = id, error = %e, "Report rendering failed");
                e
            })?;

        tracing::info!(dataset_id = id, bytes = content.len(), "Report rendered");
        Ok(RenderedReport {
            filename: metadata.report_filename(),
            content,
        })
    }

    fn csv_file_url(&self, id: i64) -> Option<String> {
        let path = format!("api/datasets/{}/csv/", id);
        match &self.public_base_url {
            Some(base) => base.join(&path).ok().map(String::from),
            None => Some(format!("/{}", path)),
        }
    }
}

/// Strip any client-side directory components from an upload name
fn base_name(filename: &str) -> &str {
    filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::SqliteDatasetStore;

    const CSV: &[u8] = b"Equipment Name,Type,Flowrate,Pressure,Temperature\nPump-1,Pump,120,5.2,110\nValve-1,Valve,60,4.1,105\n";

    async fn use_case(policy: DatasetPolicy) -> DatasetUseCase {
        let store = SqliteDatasetStore::init("sqlite::memory:", 1).await.unwrap();
        DatasetUseCase::new(SummaryEngine::default(), Arc::new(store), policy)
    }

    #[tokio::test]
    async fn test_upload_returns_detail() {
        let datasets = use_case(DatasetPolicy::default())
            .await
            .with_public_base_url("http://localhost:8000/")
            .unwrap();

        let detail = datasets.upload("plant/sample.csv", CSV.to_vec()).await.unwrap();

        assert_eq!(detail.entry.filename, "sample.csv");
        assert_eq!(detail.entry.row_count, 2);
        assert_eq!(detail.summary.count, 2);
        assert_eq!(
            detail.entry.csv_file.as_deref(),
            Some(format!("http://localhost:8000/api/datasets/{}/csv/", detail.entry.id).as_str())
        );

        let fetched = datasets.get(detail.entry.id).await.unwrap();
        assert_eq!(fetched, detail);
    }

    #[tokio::test]
    async fn test_upload_policy_violations() {
        let datasets = use_case(DatasetPolicy {
            retention_limit: 5,
            max_upload_bytes: 64,
        })
        .await;

        assert!(matches!(
            datasets.upload("data.xlsx", CSV.to_vec()).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            datasets.upload("data.csv", Vec::new()).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            datasets.upload("data.csv", CSV.to_vec()).await,
            Err(AppError::PayloadTooLarge(_))
        ));
        assert!(matches!(
            datasets.upload("DATA.CSV", b"type\n\xC3\x28\n".to_vec()).await,
            Err(AppError::MalformedInput(_))
        ));
        assert!(datasets.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retention_keeps_newest() {
        let datasets = use_case(DatasetPolicy {
            retention_limit: 2,
            max_upload_bytes: 1024,
        })
        .await;

        let mut ids = Vec::new();
        for name in ["a.csv", "b.csv", "c.csv"] {
            ids.push(datasets.upload(name, CSV.to_vec()).await.unwrap().entry.id);
        }

        let listed: Vec<_> = datasets.list().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(listed, vec![ids[2], ids[1]]);
        assert!(matches!(datasets.get(ids[0]).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_report_and_csv_content() {
        let datasets = use_case(DatasetPolicy::default()).await;
        let id = datasets.upload("sample.csv", CSV.to_vec()).await.unwrap().entry.id;

        let report = datasets.report(id).await.unwrap();
        assert_eq!(report.filename, format!("report_{}.pdf", id));
        assert!(report.content.starts_with(b"%PDF"));

        let (filename, content) = datasets.csv_content(id).await.unwrap();
        assert_eq!(filename, "sample.csv");
        assert_eq!(content, CSV.to_vec());

        assert!(matches!(datasets.report(id + 100).await, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("C:\\Users\\me\\data.csv"), "data.csv");
        assert_eq!(base_name("/tmp/x/data.csv"), "data.csv");
        assert_eq!(base_name("data.csv"), "data.csv");
    }
}
