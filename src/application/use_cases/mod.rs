pub mod aggregator;
pub mod dataset_service;
pub mod report_renderer;
pub mod summary_engine;
pub mod type_classifier;
