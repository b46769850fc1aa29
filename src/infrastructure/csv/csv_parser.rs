// ============================================================
// RECORD PARSER
// ============================================================
// Decode uploaded CSV bytes and turn rows into typed equipment records

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::equipment::{EquipmentRecord, NumericField};
use crate::domain::error::{AppError, Result};

static HEADER_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_\-]+").unwrap());

/// CSV parser producing [`EquipmentRecord`]s
#[derive(Debug, Clone)]
pub struct RecordParser {
    /// Delimiter character (default: comma)
    delimiter: u8,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl RecordParser {
    /// Create a new parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Decode raw upload bytes into text.
    ///
    /// A byte order mark selects UTF-8 or UTF-16; anything else is read as
    /// UTF-8. Malformed sequences are an error, never replaced.
    pub fn decode(&self, raw: &[u8]) -> Result<String> {
        let (encoding, bom_len) = Encoding::for_bom(raw).unwrap_or((UTF_8, 0));
        let body = raw.get(bom_len..).unwrap_or_default();

        encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .map(|text| text.into_owned())
            .ok_or_else(|| {
                AppError::MalformedInput(format!(
                    "content is not valid {} text",
                    encoding.name()
                ))
            })
    }

    /// Start parsing CSV text. Rows are read lazily from the returned stream.
    pub fn parse<'a>(&self, content: &'a str) -> Result<RecordStream<'a>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::All)
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::MalformedInput(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AppError::MalformedInput(
                "CSV content has no header row".to_string(),
            ));
        }

        let columns = ColumnMap::from_headers(&headers);
        tracing::debug!(
            headers = headers.len(),
            has_type = columns.equipment_type.is_some(),
            "CSV header resolved"
        );

        Ok(RecordStream {
            rows: reader.into_records(),
            columns,
            emitted: 0,
            skipped: 0,
        })
    }
}

/// Lazy, single-use sequence of parsed records
pub struct RecordStream<'a> {
    rows: StringRecordsIntoIter<&'a [u8]>,
    columns: ColumnMap,
    emitted: usize,
    skipped: usize,
}

impl Iterator for RecordStream<'_> {
    type Item = EquipmentRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(result) = self.rows.next() else {
                tracing::debug!(
                    records = self.emitted,
                    skipped = self.skipped,
                    "CSV parse finished"
                );
                return None;
            };

            match result {
                Ok(row) if row.iter().all(|cell| cell.trim().is_empty()) => {
                    self.skipped += 1;
                }
                Ok(row) => {
                    self.emitted += 1;
                    return Some(self.columns.record(&row));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable CSV row");
                    self.skipped += 1;
                }
            }
        }
    }
}

/// Positions of the recognized columns in the header row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnMap {
    equipment_name: Option<usize>,
    equipment_type: Option<usize>,
    flowrate: Option<usize>,
    pressure: Option<usize>,
    temperature: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let mut map = Self::default();

        for (idx, header) in headers.iter().enumerate() {
            let slot = match normalize_header(header).as_str() {
                "type" | "equipment type" => &mut map.equipment_type,
                "equipment name" | "name" => &mut map.equipment_name,
                "flowrate" | "flow rate" => &mut map.flowrate,
                "pressure" => &mut map.pressure,
                "temperature" => &mut map.temperature,
                _ => continue,
            };
            // First matching column wins
            if slot.is_none() {
                *slot = Some(idx);
            }
        }

        map
    }

    fn numeric_column(&self, field: NumericField) -> Option<usize> {
        match field {
            NumericField::Flowrate => self.flowrate,
            NumericField::Pressure => self.pressure,
            NumericField::Temperature => self.temperature,
        }
    }

    fn record(&self, row: &StringRecord) -> EquipmentRecord {
        let mut record = EquipmentRecord {
            equipment_name: text_cell(row, self.equipment_name),
            equipment_type: text_cell(row, self.equipment_type),
            ..EquipmentRecord::default()
        };

        for field in NumericField::ALL {
            let value = cell(row, self.numeric_column(field)).and_then(parse_number);
            record.set_value(field, value);
        }

        record
    }
}

/// Lowercase a header and collapse whitespace, underscores and dashes
fn normalize_header(header: &str) -> String {
    HEADER_SEPARATOR
        .replace_all(header.trim(), " ")
        .trim()
        .to_lowercase()
}

fn cell(row: &StringRecord, idx: Option<usize>) -> Option<&str> {
    idx.and_then(|i| row.get(i))
}

fn text_cell(row: &StringRecord, idx: Option<usize>) -> Option<String> {
    cell(row, idx).map(|value| value.to_string())
}

/// Finite number, or `None` for blank and invalid cells
fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}
