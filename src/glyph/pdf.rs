//! PDF-backed [`GlyphSource`].
//!
//! Text runs are taken from the text-showing operators of each page's
//! content stream, positioned by the text matrix alone. The current
//! transformation matrix and font encodings are not consulted: strings are
//! decoded as UTF-16BE when they carry a byte order mark, otherwise as UTF-8
//! with a GB18030 fallback.

use std::path::Path;

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, instrument, trace};

use super::{DocumentInfo, GlyphSource, Page, TextRun};
use crate::error::{Error, Result};
use crate::util::decode_text;

/// Kerning adjustment (thousandths of an em) treated as a word gap in `TJ`.
const TJ_SPACE_ADJUSTMENT: f32 = -200.0;

pub struct PdfGlyphSource {
    document: Document,
    pages: Vec<ObjectId>,
}

impl PdfGlyphSource {
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|e| Error::SourceUnreadable(format!("not a readable PDF: {e}")))?;
        Ok(Self::from_document(document))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(&std::fs::read(path)?)
    }

    pub fn from_document(document: Document) -> Self {
        // get_pages is keyed by 1-based page number
        let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
        debug!(pages = pages.len(), "PDF loaded");
        Self { document, pages }
    }

    fn info_field(&self, key: &[u8]) -> Option<String> {
        let info = match self.document.trailer.get(b"Info").ok()? {
            Object::Reference(id) => self.document.get_dictionary(*id).ok()?,
            Object::Dictionary(dict) => dict,
            _ => return None,
        };
        let value = match info.get(key).ok()? {
            Object::Reference(id) => self.document.get_object(*id).ok()?,
            other => other,
        };
        match value {
            Object::String(bytes, _) => {
                let text = decode_pdf_string(bytes);
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            _ => None,
        }
    }
}

impl GlyphSource for PdfGlyphSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn get_page(&self, number: usize) -> Result<Page> {
        let id = number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .ok_or_else(|| Error::EntryFailed {
                path: format!("page {number}"),
                reason: "no such page".into(),
            })?;
        let content = self.document.get_page_content(*id)?;
        let content = Content::decode(&content)?;
        Ok(Page {
            number,
            runs: collect_runs(&content),
        })
    }

    fn document_info(&self) -> DocumentInfo {
        DocumentInfo {
            title: self.info_field(b"Title"),
            author: self.info_field(b"Author"),
        }
    }
}

/// Text and line matrices, reduced to what baseline tracking needs.
#[derive(Debug, Clone, Copy)]
struct TextState {
    /// Line matrix `[a b c d e f]`.
    line: [f32; 6],
    leading: f32,
}

impl TextState {
    const IDENTITY: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

    fn new() -> Self {
        Self {
            line: Self::IDENTITY,
            leading: 0.0,
        }
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.line;
        self.line[4] = tx * a + ty * c + e;
        self.line[5] = tx * b + ty * d + f;
    }

    fn next_line(&mut self) {
        self.translate(0.0, -self.leading);
    }

    fn baseline(&self) -> f32 {
        self.line[5]
    }
}

fn collect_runs(content: &Content) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut state = TextState::new();

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => state.line = TextState::IDENTITY,
            "Tm" => {
                if let Some(m) = numbers::<6>(operands) {
                    state.line = m;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    state.translate(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = numbers::<2>(operands) {
                    state.leading = -ty;
                    state.translate(tx, ty);
                }
            }
            "TL" => {
                if let Some([leading]) = numbers::<1>(operands) {
                    state.leading = leading;
                }
            }
            "T*" => state.next_line(),
            "Tj" => push_run(&mut runs, operands.first(), &state),
            "'" => {
                state.next_line();
                push_run(&mut runs, operands.first(), &state);
            }
            "\"" => {
                state.next_line();
                push_run(&mut runs, operands.get(2), &state);
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let text = array_text(items);
                    if !text.is_empty() {
                        runs.push(TextRun::new(text, state.baseline()));
                    }
                }
            }
            _ => {}
        }
    }

    trace!(runs = runs.len(), "collected text runs");
    runs
}

fn push_run(runs: &mut Vec<TextRun>, operand: Option<&Object>, state: &TextState) {
    if let Some(Object::String(bytes, _)) = operand {
        let text = decode_pdf_string(bytes);
        if !text.is_empty() {
            runs.push(TextRun::new(text, state.baseline()));
        }
    }
}

fn array_text(items: &[Object]) -> String {
    let mut text = String::new();
    for item in items {
        match item {
            Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
            other => {
                if let Some(adjustment) = number(other)
                    && adjustment < TJ_SPACE_ADJUSTMENT
                    && !text.ends_with(' ')
                {
                    text.push(' ');
                }
            }
        }
    }
    text
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f32; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, object) in out.iter_mut().zip(operands) {
        *slot = number(object)?;
    }
    Some(out)
}

fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let (text, _) = encoding_rs::UTF_16BE.decode_without_bom_handling(rest);
        return text.into_owned();
    }
    decode_text(bytes, None).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{Stream, StringFormat, dictionary};

    fn utf16(text: &str) -> Object {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        Object::String(bytes, StringFormat::Hexadecimal)
    }

    fn build(operations: Vec<Operation>, title: Option<&str>) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        if let Some(title) = title {
            let info_id = doc.add_object(dictionary! {
                "Title" => utf16(title),
                "Author" => Object::string_literal("Someone"),
            });
            doc.trailer.set("Info", info_id);
        }
        doc
    }

    #[test]
    fn test_runs_follow_text_matrix() {
        let doc = build(
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal("A")]),
                Operation::new("Tj", vec![Object::string_literal("B")]),
                Operation::new("TL", vec![14.into()]),
                Operation::new("T*", vec![]),
                Operation::new("Tj", vec![utf16("中文")]),
                Operation::new("ET", vec![]),
            ],
            None,
        );
        let source = PdfGlyphSource::from_document(doc);
        assert_eq!(source.page_count(), 1);

        let page = source.get_page(1).unwrap();
        let ys: Vec<f32> = page.runs.iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![700.0, 700.0, 686.0]);
        assert_eq!(crate::glyph::reconstruct_page(&page, 5.0).text, "A B\n中文");
    }

    #[test]
    fn test_tj_array_gaps() {
        let items = vec![
            Object::string_literal("Hel"),
            Object::Integer(-20),
            Object::string_literal("lo"),
            Object::Integer(-300),
            Object::string_literal("world"),
        ];
        assert_eq!(array_text(&items), "Hello world");
    }

    #[test]
    fn test_document_info() {
        let source = PdfGlyphSource::from_document(build(vec![], Some("標題")));
        let info = source.document_info();
        assert_eq!(info.title.as_deref(), Some("標題"));
        assert_eq!(info.author.as_deref(), Some("Someone"));

        let bare = PdfGlyphSource::from_document(build(vec![], None));
        assert_eq!(bare.document_info(), DocumentInfo::default());
    }

    #[test]
    fn test_missing_page() {
        let source = PdfGlyphSource::from_document(build(vec![], None));
        assert!(matches!(source.get_page(2), Err(Error::EntryFailed { .. })));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        assert!(matches!(
            PdfGlyphSource::from_bytes(b"%PDF-1.4 nothing else"),
            Err(Error::SourceUnreadable(_))
        ));
    }
}
