pub mod error;

// Equipment datasets, summaries and reports
pub mod equipment;
