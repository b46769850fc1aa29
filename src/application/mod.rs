pub mod use_cases;

pub use use_cases::dataset_service::{DatasetUseCase, RenderedReport};
pub use use_cases::summary_engine::SummaryEngine;
