// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// Text decoding and CSV parsing into equipment records

mod csv_parser;

pub use csv_parser::{RecordParser, RecordStream};
