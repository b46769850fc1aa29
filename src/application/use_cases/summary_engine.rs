// ============================================================
// SUMMARY ENGINE
// ============================================================
// Parse -> aggregate, and summary -> report document

use crate::application::use_cases::aggregator::aggregate;
use crate::application::use_cases::report_renderer::ReportRenderer;
use crate::domain::equipment::{ReportMetadata, Summary};
use crate::domain::error::Result;
use crate::infrastructure::csv::RecordParser;

/// Stateless entry point for summarization and report rendering.
///
/// Holds only immutable settings; every call is independent and can run
/// concurrently with any other.
#[derive(Debug, Clone, Default)]
pub struct SummaryEngine {
    parser: RecordParser,
    renderer: ReportRenderer,
}

impl SummaryEngine {
    pub fn new(parser: RecordParser) -> Self {
        Self {
            parser,
            renderer: ReportRenderer::new(),
        }
    }

    /// Summarize raw CSV content.
    ///
    /// Fails only with `AppError::MalformedInput` (no header row, or bytes
    /// that are not text). Bad cells and empty rows never fail the call.
    pub fn summarize(&self, raw_content: &[u8]) -> Result<Summary> {
        let text = self.parser.decode(raw_content)?;
        let records = self.parser.parse(&text)?;
        Ok(aggregate(records))
    }

    /// Render a summary report as PDF bytes
    pub fn render_report(&self, metadata: &ReportMetadata, summary: &Summary) -> Result<Vec<u8>> {
        self.renderer.render(metadata, summary)
    }
}
