// ============================================================
// REPORT RENDERER
// ============================================================
// Lay out a Summary as a fixed report and write it as PDF

use crate::domain::equipment::{
    NumericField, ReportLayout, ReportLine, ReportMetadata, Summary, PLACEHOLDER,
};
use crate::domain::error::Result;
use crate::infrastructure::pdf::PdfWriter;

const REPORT_TITLE: &str = "Equipment Parameter Report";
const FIELD_COLUMN_WIDTH: usize = 12;
const VALUE_COLUMN_WIDTH: usize = 14;
const TYPE_COLUMN_WIDTH: usize = 24;
const COUNT_COLUMN_WIDTH: usize = 8;
/// Characters per header line; Helvetica 11pt stays inside the A4 margins
const HEADER_WIDTH: usize = 64;
const DATASET_PREFIX: &str = "Dataset: ";
const CONTINUATION_INDENT: &str = "  ";

/// Renders summaries into printable report documents
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer {
    writer: PdfWriter,
}

impl ReportRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the report as PDF bytes.
    ///
    /// Fails with `AppError::Render` when the summary is inconsistent.
    pub fn render(&self, metadata: &ReportMetadata, summary: &Summary) -> Result<Vec<u8>> {
        let layout = self.layout(metadata, summary)?;
        self.writer.write(&layout)
    }

    /// Build the report content: identification, row count, field
    /// statistics, then type distribution.
    pub fn layout(&self, metadata: &ReportMetadata, summary: &Summary) -> Result<ReportLayout> {
        summary.validate_shape()?;

        let mut layout = ReportLayout::new();
        layout.push(ReportLine::Title(REPORT_TITLE.to_string()));

        // Header region; the upload timestamp only ever appears here
        let filename_width = HEADER_WIDTH - DATASET_PREFIX.len();
        for (i, chunk) in wrap(&metadata.filename, filename_width).into_iter().enumerate() {
            let prefix = if i == 0 { DATASET_PREFIX } else { CONTINUATION_INDENT };
            layout.push(ReportLine::Text(format!("{}{}", prefix, chunk)));
        }
        layout.push(ReportLine::Text(format!("Dataset ID: {}", metadata.dataset_id)));
        if let Some(uploaded_at) = metadata.uploaded_at {
            layout.push(ReportLine::Text(format!(
                "Uploaded: {}",
                uploaded_at.format("%Y-%m-%d %H:%M:%S UTC")
            )));
        }
        layout.push(ReportLine::Rule);

        layout.push(ReportLine::Text(format!("Total rows: {}", summary.count)));
        layout.push(ReportLine::Blank);

        layout.push(ReportLine::Heading("Field Statistics".to_string()));
        layout.push(ReportLine::Row(format!(
            "{:<fw$}{:>vw$}{:>vw$}{:>vw$}",
            "Field",
            "Average",
            "Min",
            "Max",
            fw = FIELD_COLUMN_WIDTH,
            vw = VALUE_COLUMN_WIDTH
        )));
        for field in NumericField::ALL {
            layout.push(ReportLine::Row(format!(
                "{:<fw$}{:>vw$}{:>vw$}{:>vw$}",
                field.label(),
                format_value(summary.averages.get(field)),
                format_value(summary.min.get(field)),
                format_value(summary.max.get(field)),
                fw = FIELD_COLUMN_WIDTH,
                vw = VALUE_COLUMN_WIDTH
            )));
        }
        layout.push(ReportLine::Blank);

        layout.push(ReportLine::Heading("Type Distribution".to_string()));
        let distribution = summary.sorted_distribution();
        if distribution.is_empty() {
            layout.push(ReportLine::Text("No records".to_string()));
        } else {
            layout.push(ReportLine::Row(format!(
                "{:<tw$}{:>cw$}",
                "Type",
                "Count",
                tw = TYPE_COLUMN_WIDTH,
                cw = COUNT_COLUMN_WIDTH
            )));
            let largest = distribution.first().map(|(_, n)| *n).unwrap_or(0).max(1);
            for (label, count) in distribution {
                let mut chunks = wrap(label, TYPE_COLUMN_WIDTH - 1).into_iter();
                let first = chunks.next().unwrap_or_default();
                layout.push(ReportLine::BarRow {
                    text: format!(
                        "{:<tw$}{:>cw$}",
                        first,
                        count,
                        tw = TYPE_COLUMN_WIDTH,
                        cw = COUNT_COLUMN_WIDTH
                    ),
                    fraction: count as f64 / largest as f64,
                });
                for chunk in chunks {
                    layout.push(ReportLine::Row(format!("{}{}", CONTINUATION_INDENT, chunk)));
                }
            }
        }

        Ok(layout)
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}", v),
        None => PLACEHOLDER.to_string(),
    }
}

/// Split `text` into lines of at most `width` characters, breaking at the
/// last space that fits and hard-splitting words longer than a line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rest: Vec<char> = text.chars().collect();
    let mut lines = Vec::new();

    while rest.len() > width {
        let space = rest[..=width].iter().rposition(|c| *c == ' ').filter(|&i| i > 0);
        match space {
            Some(i) => {
                lines.push(rest[..i].iter().collect());
                rest.drain(..=i);
            }
            None => {
                lines.push(rest[..width].iter().collect());
                rest.drain(..width);
            }
        }
    }
    lines.push(rest.into_iter().collect());
    lines
}
