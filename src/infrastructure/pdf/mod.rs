// ============================================================
// PDF INFRASTRUCTURE LAYER
// ============================================================
// Report document output

mod pdf_writer;

pub use pdf_writer::PdfWriter;
