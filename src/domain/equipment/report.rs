// ============================================================
// REPORT LAYOUT
// ============================================================
// Format-independent description of a rendered summary report

use chrono::{DateTime, Utc};

/// Rendered in place of an absent numeric value
pub const PLACEHOLDER: &str = "-";

/// Identification of the dataset a report describes
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMetadata {
    pub dataset_id: i64,
    pub filename: String,
    pub uploaded_at: Option<DateTime<Utc>>,
}

impl ReportMetadata {
    /// Download name for the report, `report_<id>.pdf`
    pub fn report_filename(&self) -> String {
        format!("report_{}.pdf", self.dataset_id)
    }
}

/// One line of a report
#[derive(Debug, Clone, PartialEq)]
pub enum ReportLine {
    Title(String),
    Heading(String),
    Text(String),
    /// Fixed-width table row
    Row(String),
    /// Table row followed by a bar scaled to `fraction` (0.0 - 1.0)
    BarRow { text: String, fraction: f64 },
    /// Marks the end of the header region
    Rule,
    Blank,
}

/// Ordered report content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportLayout {
    pub lines: Vec<ReportLine>,
}

impl ReportLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: ReportLine) {
        self.lines.push(line);
    }

    /// Plain text of every line, in order
    pub fn text_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                ReportLine::Title(text)
                | ReportLine::Heading(text)
                | ReportLine::Text(text)
                | ReportLine::Row(text)
                | ReportLine::BarRow { text, .. } => Some(text.as_str()),
                ReportLine::Rule | ReportLine::Blank => None,
            })
            .collect()
    }
}
