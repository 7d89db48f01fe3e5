//! PDF text layer reader using lopdf
//!
//! Walks each page's content stream and reports every shown string with the
//! matrix that places it on the page. No clustering happens here; see
//! `layout` for that.

use crate::pdf::layout::GlyphRun;
use crate::utils::error::ExtractError;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;

const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
// TJ adjustments below this (thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = -200.0;
// Average glyph advance as a fraction of the font size.
const APPROX_GLYPH_WIDTH: f32 = 0.5;

type FontMap<'a> = BTreeMap<Vec<u8>, &'a Dictionary>;

/// Quick signature check before handing bytes to the parser.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    head.windows(5).any(|w| w == b"%PDF-")
}

/// Reads every page's text runs, in page order.
pub fn read_pages(bytes: &[u8]) -> Result<Vec<Vec<GlyphRun>>, ExtractError> {
    if !looks_like_pdf(bytes) {
        return Err(ExtractError::UnsupportedContent("document is not a PDF".to_string()));
    }
    let doc = Document::load_mem(bytes)
        .map_err(|e| ExtractError::UnsupportedContent(format!("unreadable PDF: {}", e)))?;

    let pages = doc.get_pages();
    tracing::debug!("PDF has {} pages", pages.len());

    let mut out = Vec::with_capacity(pages.len());
    for (page_num, &page_id) in pages.iter() {
        match page_runs(&doc, page_id) {
            Ok(runs) => out.push(runs),
            Err(e) => {
                // One bad content stream should not sink the whole document.
                tracing::warn!("Skipping text of page {}: {}", page_num, e);
                out.push(Vec::new());
            }
        }
    }
    Ok(out)
}

/// Multiply two 2D transformation matrices
/// Matrix format: [a, b, c, d, e, f] representing:
/// | a  b  0 |
/// | c  d  0 |
/// | e  f  1 |
fn multiply(m1: &[f32; 6], m2: &[f32; 6]) -> [f32; 6] {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Graphics and text state for one content stream.
struct TextState<'a> {
    doc: &'a Document,
    fonts: FontMap<'a>,
    ctm: [f32; 6],
    ctm_stack: Vec<[f32; 6]>,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    font: Vec<u8>,
    font_size: f32,
    leading: Option<f32>,
    runs: Vec<GlyphRun>,
}

impl<'a> TextState<'a> {
    fn new(doc: &'a Document, fonts: FontMap<'a>) -> Self {
        Self {
            doc,
            fonts,
            ctm: IDENTITY,
            ctm_stack: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            leading: None,
            runs: Vec::new(),
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.leading.unwrap_or(self.font_size * 1.2);
        self.move_line(0.0, -leading);
    }

    fn decode(&self, bytes: &[u8]) -> String {
        if let Some(font) = self.fonts.get(&self.font) {
            if let Ok(encoding) = font.get_font_encoding(self.doc) {
                if let Ok(text) = Document::decode_text(&encoding, bytes) {
                    return text;
                }
            }
        }
        // Fallback: UTF-16BE with BOM, then Latin-1
        if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
            let utf16: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            return String::from_utf16_lossy(&utf16);
        }
        bytes.iter().map(|&b| b as char).collect()
    }

    fn show(&mut self, text: String) {
        let glyphs = text.chars().count() as f32;
        if !text.trim().is_empty() {
            self.runs.push(GlyphRun {
                text,
                transform: multiply(&self.text_matrix, &self.ctm),
            });
        }
        // No glyph widths here; advance by an estimate so runs shown
        // without repositioning keep their order.
        let advance = glyphs * self.font_size * APPROX_GLYPH_WIDTH;
        self.text_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, advance, 0.0], &self.text_matrix);
    }

    fn show_array(&mut self, items: &[Object]) {
        let mut text = String::new();
        for item in items {
            match item {
                Object::String(bytes, _) => text.push_str(&self.decode(bytes)),
                other => {
                    if number(other).is_some_and(|n| n < TJ_SPACE_THRESHOLD) && !text.ends_with(' ') {
                        text.push(' ');
                    }
                }
            }
        }
        self.show(text);
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(saved) = self.ctm_stack.pop() {
                    self.ctm = saved;
                }
            }
            "cm" if operands.len() >= 6 => {
                let mut m = IDENTITY;
                for (slot, operand) in m.iter_mut().zip(operands) {
                    if let Some(n) = number(operand) {
                        *slot = n;
                    }
                }
                self.ctm = multiply(&m, &self.ctm);
            }
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" if operands.len() >= 2 => {
                if let Ok(name) = operands[0].as_name() {
                    self.font = name.to_vec();
                }
                if let Some(size) = number(&operands[1]) {
                    self.font_size = size;
                }
            }
            "TL" => self.leading = operands.first().and_then(number),
            "Td" | "TD" if operands.len() >= 2 => {
                let tx = number(&operands[0]).unwrap_or(0.0);
                let ty = number(&operands[1]).unwrap_or(0.0);
                if operator == "TD" {
                    self.leading = Some(-ty);
                }
                self.move_line(tx, ty);
            }
            "Tm" if operands.len() >= 6 => {
                let mut m = IDENTITY;
                for (slot, operand) in m.iter_mut().zip(operands) {
                    if let Some(n) = number(operand) {
                        *slot = n;
                    }
                }
                self.text_matrix = m;
                self.line_matrix = m;
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "TJ" => {
                if let Some(Ok(items)) = operands.first().map(|o| o.as_array()) {
                    self.show_array(items);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    let text = self.decode(bytes);
                    self.show(text);
                }
            }
            _ => {}
        }
    }
}

fn page_runs(doc: &Document, page_id: ObjectId) -> Result<Vec<GlyphRun>, lopdf::Error> {
    let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
    let content = Content::decode(&doc.get_page_content(page_id)?)?;

    let mut state = TextState::new(doc, fonts);
    for op in &content.operations {
        state.apply(op.operator.as_str(), &op.operands);
    }
    Ok(state.runs)
}
