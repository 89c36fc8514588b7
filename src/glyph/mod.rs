//! Line reconstruction from positioned glyph runs.
//!
//! Paginated sources carry text as runs placed at baseline coordinates, in
//! content-stream order rather than reading order. Lines are recovered with a
//! single heuristic: a run whose baseline moves more than a threshold away
//! from the previous run's baseline starts a new line. Multi-column or
//! irregular layouts come out interleaved; there is no attempt at real text
//! flow analysis.

#[cfg(feature = "pdf")]
mod pdf;

#[cfg(feature = "pdf")]
pub use pdf::PdfGlyphSource;

use tracing::{debug, warn};

use crate::error::Result;

/// A fragment of text placed at a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Baseline Y coordinate in page space.
    pub y: f32,
}

impl TextRun {
    pub fn new(text: impl Into<String>, y: f32) -> Self {
        Self {
            text: text.into(),
            y,
        }
    }
}

/// The runs of one page, in stream order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// 1-based page number.
    pub number: usize,
    pub runs: Vec<TextRun>,
}

/// Reconstructed text of one page, lines separated by `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub number: usize,
    pub text: String,
}

impl PageText {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Title and author stored in a paginated document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Page-level read access to a paginated document.
pub trait GlyphSource {
    fn page_count(&self) -> usize;

    /// Runs of page `number` (1-based).
    fn get_page(&self, number: usize) -> Result<Page>;

    fn document_info(&self) -> DocumentInfo;
}

/// In-memory [`GlyphSource`] over already extracted pages.
#[derive(Debug, Clone, Default)]
pub struct MemoryGlyphSource {
    pages: Vec<Page>,
    info: DocumentInfo,
}

impl MemoryGlyphSource {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            info: DocumentInfo::default(),
        }
    }

    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }
}

impl GlyphSource for MemoryGlyphSource {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn get_page(&self, number: usize) -> Result<Page> {
        number
            .checked_sub(1)
            .and_then(|i| self.pages.get(i))
            .cloned()
            .ok_or_else(|| crate::Error::EntryFailed {
                path: format!("page {number}"),
                reason: "no such page".into(),
            })
    }

    fn document_info(&self) -> DocumentInfo {
        self.info.clone()
    }
}

/// Group runs into lines by baseline proximity.
///
/// Lines are trimmed; lines left empty are dropped.
pub fn reconstruct_lines(runs: &[TextRun], threshold: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut buffer = String::new();
    let mut last_y: Option<f32> = None;

    for run in runs {
        if let Some(prev) = last_y
            && (run.y - prev).abs() > threshold
        {
            flush_line(&mut buffer, &mut lines);
        }
        buffer.push_str(&run.text);
        buffer.push(' ');
        last_y = Some(run.y);
    }
    flush_line(&mut buffer, &mut lines);
    lines
}

fn flush_line(buffer: &mut String, lines: &mut Vec<String>) {
    let line = buffer.trim();
    if !line.is_empty() {
        lines.push(line.to_string());
    }
    buffer.clear();
}

pub fn reconstruct_page(page: &Page, threshold: f32) -> PageText {
    PageText::new(page.number, reconstruct_lines(&page.runs, threshold).join("\n"))
}

/// Reconstruct every page of `source` in page order.
///
/// A page that cannot be read comes out empty. `on_page` is called after
/// each page with `(done, total)`.
pub fn reconstruct_document<S, F>(source: &S, threshold: f32, mut on_page: F) -> Vec<PageText>
where
    S: GlyphSource + ?Sized,
    F: FnMut(usize, usize),
{
    let total = source.page_count();
    let mut pages = Vec::with_capacity(total);
    for number in 1..=total {
        let text = match source.get_page(number) {
            Ok(page) => {
                let text = reconstruct_page(&page, threshold);
                debug!(page = number, runs = page.runs.len(), lines = text.lines().count(), "reconstructed page");
                text
            }
            Err(e) => {
                warn!(page = number, error = %e, "page unreadable, leaving it empty");
                PageText::new(number, "")
            }
        };
        pages.push(text);
        on_page(number, total);
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_LINE_BREAK_THRESHOLD;

    fn runs(pairs: &[(&str, f32)]) -> Vec<TextRun> {
        pairs.iter().map(|&(t, y)| TextRun::new(t, y)).collect()
    }

    #[test]
    fn test_baseline_jump_breaks_line() {
        let page = Page {
            number: 1,
            runs: runs(&[("A", 100.0), ("B", 100.0), ("C", 50.0)]),
        };
        let text = reconstruct_page(&page, DEFAULT_LINE_BREAK_THRESHOLD);
        assert_eq!(text.text, "A B\nC");
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["A B", "C"]);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let lines = reconstruct_lines(&runs(&[("上", 100.0), ("標", 105.0), ("下", 110.5)]), 5.0);
        assert_eq!(lines, vec!["上 標", "下"]);
    }

    #[test]
    fn test_drift_follows_previous_run() {
        // each step is within threshold even though the total drift is not
        let lines = reconstruct_lines(&runs(&[("a", 0.0), ("b", 4.0), ("c", 8.0), ("d", 12.0)]), 5.0);
        assert_eq!(lines, vec!["a b c d"]);
    }

    #[test]
    fn test_blank_runs_dropped() {
        let lines = reconstruct_lines(&runs(&[(" ", 700.0), ("正文", 680.0), ("", 600.0)]), 5.0);
        assert_eq!(lines, vec!["正文"]);
        assert!(reconstruct_lines(&[], 5.0).is_empty());
    }

    #[test]
    fn test_document_keeps_page_order() {
        let source = MemoryGlyphSource::new(vec![
            Page {
                number: 1,
                runs: runs(&[("一", 10.0)]),
            },
            Page {
                number: 2,
                runs: Vec::new(),
            },
        ]);
        let mut progress = Vec::new();
        let pages = reconstruct_document(&source, 5.0, |done, total| progress.push((done, total)));
        assert_eq!(pages, vec![PageText::new(1, "一"), PageText::new(2, "")]);
        assert!(pages[1].is_empty());
        assert_eq!(progress, vec![(1, 2), (2, 2)]);
        assert!(source.get_page(3).is_err());
        assert!(source.get_page(0).is_err());
    }
}
