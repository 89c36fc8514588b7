use std::borrow::Cow;

use crate::util::decode_text;

/// Default title when the package descriptor has none.
pub const DEFAULT_TITLE: &str = "Converted eBook";

/// What an archive entry holds, derived from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    /// HTML/XHTML content document.
    Markup,
    /// CSS stylesheet.
    Style,
    /// Everything else: images, fonts, descriptors, navigation files.
    Binary,
}

impl EntryKind {
    /// Classify an archive path by extension (case-insensitive).
    pub fn from_path(path: &str) -> Self {
        if path.ends_with('/') {
            return EntryKind::Directory;
        }
        let lower = path.to_ascii_lowercase();
        if lower.ends_with(".html") || lower.ends_with(".xhtml") || lower.ends_with(".htm") {
            EntryKind::Markup
        } else if lower.ends_with(".css") {
            EntryKind::Style
        } else {
            EntryKind::Binary
        }
    }

    /// Markup and stylesheet entries are the ones the rewriter replaces.
    pub fn is_text(self) -> bool {
        matches!(self, EntryKind::Markup | EntryKind::Style)
    }
}

/// One file inside a packaged document.
///
/// Entries are never mutated in place; rewriting produces a new entry with
/// the same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub kind: EntryKind,
    pub data: Vec<u8>,
}

impl ArchiveEntry {
    /// Create an entry, classifying it from its path.
    pub fn new(path: impl Into<String>, data: Vec<u8>) -> Self {
        let path = path.into();
        Self {
            kind: EntryKind::from_path(&path),
            path,
            data,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            data: Vec::new(),
        }
    }

    /// Decode the entry content as text (BOM-aware, legacy encodings tolerated).
    pub fn text(&self) -> Cow<'_, str> {
        decode_text(&self.data, None)
    }

    /// A new entry at the same path carrying replacement text.
    pub fn with_text(&self, text: String) -> Self {
        Self {
            path: self.path.clone(),
            kind: self.kind,
            data: text.into_bytes(),
        }
    }
}

/// Title and author of a converted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: Option<String>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            author: None,
        }
    }
}

impl DocumentMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let author = author.into();
        self.author = if author.trim().is_empty() {
            None
        } else {
            Some(author)
        };
        self
    }
}

/// One chapter of a flattened document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub source_path: String,
    /// 1-based position in the final document.
    pub order: usize,
    pub title: String,
    /// Unique within one document.
    pub anchor: String,
    /// Rendered Markdown body.
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_kind_from_path() {
        assert_eq!(EntryKind::from_path("OEBPS/ch1.xhtml"), EntryKind::Markup);
        assert_eq!(EntryKind::from_path("Text/Chapter.HTML"), EntryKind::Markup);
        assert_eq!(EntryKind::from_path("page.htm"), EntryKind::Markup);
        assert_eq!(EntryKind::from_path("Styles/main.css"), EntryKind::Style);
        assert_eq!(EntryKind::from_path("Images/cover.jpg"), EntryKind::Binary);
        assert_eq!(EntryKind::from_path("content.opf"), EntryKind::Binary);
        assert_eq!(EntryKind::from_path("OEBPS/"), EntryKind::Directory);
    }

    #[test]
    fn test_with_text_keeps_path_and_kind() {
        let entry = ArchiveEntry::new("a/b.css", b"p {}".to_vec());
        let rewritten = entry.with_text("p { color: red; }".into());
        assert_eq!(rewritten.path, "a/b.css");
        assert_eq!(rewritten.kind, EntryKind::Style);
        assert_eq!(entry.data, b"p {}");
    }

    #[test]
    fn test_metadata_defaults() {
        let meta = DocumentMetadata::default();
        assert_eq!(meta.title, "Converted eBook");
        assert!(meta.author.is_none());
        assert!(DocumentMetadata::new("T").with_author("  ").author.is_none());
    }
}
