// ============================================================
// PDF WRITER
// ============================================================
// Write a report layout as an uncompressed, reproducible PDF

use encoding_rs::WINDOWS_1252;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::domain::equipment::{ReportLayout, ReportLine};
use crate::domain::error::{AppError, Result};

const A4_WIDTH: i64 = 595;
const A4_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;

/// Courier glyphs are 0.6 em wide
const COURIER_ADVANCE_PER_MILLE: i64 = 600;
const BAR_GAP: i64 = 12;
const BAR_HEIGHT: i64 = 7;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";
const FONT_MONO: &str = "F3";

/// Writes [`ReportLayout`]s as A4 PDF documents
#[derive(Debug, Clone)]
pub struct PdfWriter {
    page_width: i64,
    page_height: i64,
    margin: i64,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH,
            page_height: A4_HEIGHT,
            margin: MARGIN,
        }
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the layout. Identical layouts produce identical bytes.
    pub fn write(&self, layout: &ReportLayout) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let resources_id = add_font_resources(&mut doc);

        let mut page_ids: Vec<ObjectId> = Vec::new();
        for operations in self.paginate(layout) {
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| AppError::Render(format!("Failed to encode page content: {}", e)))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id);
        }

        let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let media_box: Vec<Object> = vec![
            Object::Integer(0),
            Object::Integer(0),
            self.page_width.into(),
            self.page_height.into(),
        ];
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
            "MediaBox" => media_box,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| AppError::Render(format!("Failed to write PDF: {}", e)))?;

        tracing::debug!(
            pages = page_ids.len(),
            bytes = buffer.len(),
            "Report PDF written"
        );
        Ok(buffer)
    }

    /// Split the layout into per-page operation lists
    fn paginate(&self, layout: &ReportLayout) -> Vec<Vec<Operation>> {
        let top = self.page_height - self.margin;
        let mut pages = Vec::new();
        let mut ops = Vec::new();
        let mut y = top;

        for line in &layout.lines {
            let height = line_height(line);
            if y - height < self.margin && !ops.is_empty() {
                pages.push(std::mem::take(&mut ops));
                y = top;
            }
            y -= height;
            self.draw(&mut ops, line, y);
        }

        // Always emit at least one page
        if !ops.is_empty() || pages.is_empty() {
            pages.push(ops);
        }
        pages
    }

    fn draw(&self, ops: &mut Vec<Operation>, line: &ReportLine, baseline: i64) {
        match line {
            ReportLine::Title(text) => text_op(ops, FONT_BOLD, 16, self.margin, baseline, text),
            ReportLine::Heading(text) => text_op(ops, FONT_BOLD, 12, self.margin, baseline, text),
            ReportLine::Text(text) => text_op(ops, FONT_REGULAR, 11, self.margin, baseline, text),
            ReportLine::Row(text) => text_op(ops, FONT_MONO, 10, self.margin, baseline, text),
            ReportLine::BarRow { text, fraction } => {
                text_op(ops, FONT_MONO, 10, self.margin, baseline, text);

                let text_width = text.chars().count() as i64 * 10 * COURIER_ADVANCE_PER_MILLE / 1000;
                let x = self.margin + text_width + BAR_GAP;
                let available = (self.page_width - self.margin - x).max(0);
                let width = (available as f64 * fraction.clamp(0.0, 1.0)).round() as i64;
                if width > 0 {
                    ops.push(Operation::new(
                        "re",
                        vec![x.into(), baseline.into(), width.into(), BAR_HEIGHT.into()],
                    ));
                    ops.push(Operation::new("f", vec![]));
                }
            }
            ReportLine::Rule => {
                let y = baseline + 4;
                ops.push(Operation::new("m", vec![self.margin.into(), y.into()]));
                ops.push(Operation::new(
                    "l",
                    vec![(self.page_width - self.margin).into(), y.into()],
                ));
                ops.push(Operation::new("S", vec![]));
            }
            ReportLine::Blank => {}
        }
    }
}

fn add_font_resources(doc: &mut Document) -> ObjectId {
    let regular = add_font(doc, "Helvetica");
    let bold = add_font(doc, "Helvetica-Bold");
    let mono = add_font(doc, "Courier");

    doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_REGULAR => regular,
            FONT_BOLD => bold,
            FONT_MONO => mono,
        },
    })
}

fn add_font(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => Object::Name(base_font.as_bytes().to_vec()),
        "Encoding" => "WinAnsiEncoding",
    })
}

fn line_height(line: &ReportLine) -> i64 {
    match line {
        ReportLine::Title(_) => 24,
        ReportLine::Heading(_) => 18,
        ReportLine::Text(_) => 16,
        ReportLine::Row(_) | ReportLine::BarRow { .. } => 14,
        ReportLine::Rule => 12,
        ReportLine::Blank => 10,
    }
}

fn text_op(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(win_ansi(text))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Encode for the `WinAnsiEncoding` fonts; unmappable characters become `?`
fn win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let (bytes, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if unmappable || c.is_control() {
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_with_rows(rows: usize) -> ReportLayout {
        let mut layout = ReportLayout::new();
        layout.push(ReportLine::Title("Report".to_string()));
        layout.push(ReportLine::Rule);
        for i in 0..rows {
            layout.push(ReportLine::BarRow {
                text: format!("Type {i}"),
                fraction: 0.5,
            });
        }
        layout
    }

    fn page_texts(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .keys()
            .map(|n| doc.extract_text(&[*n]).unwrap())
            .collect()
    }

    #[test]
    fn test_write_is_deterministic() {
        let writer = PdfWriter::new();
        let layout = layout_with_rows(3);

        let first = writer.write(&layout).unwrap();
        let second = writer.write(&layout).unwrap();

        assert!(first.starts_with(b"%PDF-1.5"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_text_is_extractable() {
        let bytes = PdfWriter::new().write(&layout_with_rows(2)).unwrap();
        let text = page_texts(&bytes).join("\n");

        assert!(text.contains("Report"));
        assert!(text.contains("Type 1"));
    }

    #[test]
    fn test_long_layouts_flow_onto_more_pages() {
        let bytes = PdfWriter::new().write(&layout_with_rows(120)).unwrap();
        let pages = page_texts(&bytes);

        assert!(pages.len() > 1);
        assert!(pages.last().unwrap().contains("Type 119"));
    }

    #[test]
    fn test_empty_layout_still_has_a_page() {
        let bytes = PdfWriter::new().write(&ReportLayout::new()).unwrap();
        assert_eq!(page_texts(&bytes).len(), 1);
    }

    #[test]
    fn test_win_ansi_keeps_latin1_letters() {
        assert_eq!(win_ansi("Kühler °C"), b"K\xFChler \xB0C".to_vec());
        assert_eq!(win_ansi("Pump \u{6CF5}"), b"Pump ?".to_vec());
    }

    #[test]
    fn test_latin1_text_is_extractable() {
        let mut layout = ReportLayout::new();
        layout.push(ReportLine::Row("Kühler 1".to_string()));
        layout.push(ReportLine::Row("Kähler 1".to_string()));

        let text = PdfWriter::new().write(&layout).map(|b| page_texts(&b).join("\n")).unwrap();

        assert!(text.contains("Kühler 1"));
        assert!(text.contains("Kähler 1"));
    }
}
