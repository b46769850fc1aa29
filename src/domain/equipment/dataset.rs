use super::{ReportMetadata, Summary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dataset about to be persisted
#[derive(Debug, Clone)]
pub struct NewDataset {
    pub filename: String,
    pub content: Vec<u8>,
    pub summary: Summary,
    pub uploaded_at: DateTime<Utc>,
}

/// Dataset as read back from storage (raw content stays in the store)
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDataset {
    pub id: i64,
    pub filename: String,
    pub row_count: i64,
    pub uploaded_at: DateTime<Utc>,
    pub summary: Summary,
}

impl StoredDataset {
    pub fn entry(&self, csv_file: Option<String>) -> DatasetEntry {
        DatasetEntry {
            id: self.id,
            filename: self.filename.clone(),
            row_count: self.row_count,
            csv_file,
            uploaded_at: self.uploaded_at,
        }
    }

    pub fn into_detail(self, csv_file: Option<String>) -> DatasetDetail {
        DatasetDetail {
            entry: self.entry(csv_file),
            summary: self.summary,
        }
    }

    pub fn report_metadata(&self) -> ReportMetadata {
        ReportMetadata {
            dataset_id: self.id,
            filename: self.filename.clone(),
            uploaded_at: Some(self.uploaded_at),
        }
    }
}

/// Listing entry as it appears on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub id: i64,
    pub filename: String,
    pub row_count: i64,
    pub csv_file: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Listing entry plus its summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDetail {
    #[serde(flatten)]
    pub entry: DatasetEntry,
    pub summary: Summary,
}
