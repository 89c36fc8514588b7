//! Chapter segmentation: ordering, titles and anchors.

use tracing::{debug, warn};

use super::reader::ArchiveSource;
use crate::book::{ArchiveEntry, Chapter, EntryKind};
use crate::error::{Error, Result};
use crate::markdown::{SlugAllocator, escape_markdown, render_element};
use crate::markup::{self, Element};
use crate::script::ScriptNormalizer;

/// Where a chapter title may come from, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// The document's `<title>` element.
    TitleElement,
    /// An `<h1>`–`<h3>` heading.
    Heading(u8),
    /// Any element whose `class` contains "title".
    TitleClass,
}

impl TitleSource {
    pub const ORDER: [TitleSource; 5] = [
        TitleSource::TitleElement,
        TitleSource::Heading(1),
        TitleSource::Heading(2),
        TitleSource::Heading(3),
        TitleSource::TitleClass,
    ];

    fn matches(self, element: &Element) -> bool {
        match self {
            TitleSource::TitleElement => element.is("title"),
            TitleSource::Heading(level) => {
                element.name.len() == 2
                    && element.name.starts_with('h')
                    && element.name.as_bytes()[1] == b'0' + level
            }
            TitleSource::TitleClass => element
                .attr("class")
                .is_some_and(|class| class.to_ascii_lowercase().contains("title")),
        }
    }
}

/// Cut `title` to `max_chars` characters, marking the cut with `...`.
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }
    let mut cut: String = title.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

/// The first non-empty title found in a parsed document.
pub fn title_from_tree(document: &Element, max_chars: usize) -> Option<String> {
    TitleSource::ORDER.iter().find_map(|source| {
        let mut candidates = Vec::new();
        document.find_all(&|e| source.matches(e), &mut candidates);
        candidates
            .into_iter()
            .map(Element::plain_text)
            .find(|text| !text.is_empty())
            .map(|text| truncate_title(&text, max_chars))
    })
}

/// The first non-empty title found in a markup document.
pub fn extract_title(markup: &str, max_chars: usize) -> Option<String> {
    title_from_tree(&markup::parse(markup), max_chars)
}

/// Markup entry paths in chapter order: byte-wise ascending.
pub fn content_paths<I: IntoIterator<Item = String>>(paths: I) -> Vec<String> {
    let mut content: Vec<String> = paths
        .into_iter()
        .filter(|p| EntryKind::from_path(p) == EntryKind::Markup)
        .collect();
    content.sort_unstable();
    content.dedup();
    content
}

/// Builds the chapter list of one document, keeping anchors unique.
#[derive(Debug)]
pub struct ChapterSegmenter<'a> {
    normalizer: &'a ScriptNormalizer,
    title_max_chars: usize,
    slugs: SlugAllocator,
    chapters: Vec<Chapter>,
}

impl<'a> ChapterSegmenter<'a> {
    pub fn new(normalizer: &'a ScriptNormalizer, title_max_chars: usize) -> Self {
        Self {
            normalizer,
            title_max_chars,
            slugs: SlugAllocator::new(),
            chapters: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    /// Add the chapter for one markup entry, or a placeholder if it could
    /// not be read.
    pub fn push_entry(&mut self, path: &str, entry: Result<ArchiveEntry>) {
        let ordinal = self.chapters.len() + 1;
        match entry.and_then(|e| self.render_entry(&e)) {
            Ok((title, body)) => {
                let title = title.unwrap_or_else(|| format!("Chapter {ordinal}"));
                debug!(%path, %title, "segmented chapter");
                self.push_chapter(path, title, body);
            }
            Err(e) => {
                warn!(%path, error = %e, "chapter unreadable, inserting placeholder");
                let body = format!(
                    "*This chapter could not be read ({}).*",
                    escape_markdown(path)
                );
                self.push_chapter(path, format!("Chapter {ordinal}"), body);
            }
        }
    }

    /// Add a chapter whose title and body are already known.
    pub fn push_chapter(&mut self, source_path: &str, title: String, body: String) {
        let order = self.chapters.len() + 1;
        let anchor = self.slugs.allocate(&title, order);
        self.chapters.push(Chapter {
            source_path: source_path.to_string(),
            order,
            title,
            anchor,
            body,
        });
    }

    fn render_entry(&self, entry: &ArchiveEntry) -> Result<(Option<String>, String)> {
        if entry.kind != EntryKind::Markup {
            return Err(Error::EntryFailed {
                path: entry.path.clone(),
                reason: "not a markup document".into(),
            });
        }
        let text = self.normalizer.to_traditional(&entry.text());
        let document = markup::parse(&text);
        let title = title_from_tree(&document, self.title_max_chars);
        Ok((title, render_element(&document)))
    }

    pub fn finish(self) -> Vec<Chapter> {
        self.chapters
    }
}

/// Segment every markup entry of `source` into chapters.
pub fn segment_chapters<S: ArchiveSource + ?Sized>(
    source: &mut S,
    normalizer: &ScriptNormalizer,
    title_max_chars: usize,
) -> Vec<Chapter> {
    let mut segmenter = ChapterSegmenter::new(normalizer, title_max_chars);
    for path in content_paths(source.entry_paths()) {
        let entry = source.read_entry(&path);
        segmenter.push_entry(&path, entry);
    }
    segmenter.finish()
}
