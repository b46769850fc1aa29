// ============================================================
// EQUIPMENT DOMAIN LAYER
// ============================================================
// Core types for equipment datasets, their summaries and reports
// No I/O, no async

mod dataset;
mod record;
mod report;
mod summary;

pub use dataset::{DatasetDetail, DatasetEntry, NewDataset, StoredDataset};
pub use record::{EquipmentRecord, NumericField};
pub use report::{ReportLayout, ReportLine, ReportMetadata, PLACEHOLDER};
pub use summary::{FieldValues, Summary, UNKNOWN_TYPE};
