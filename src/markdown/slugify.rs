//! Anchor slugs for chapter headings.

use std::collections::HashSet;

/// CJK Unified Ideographs plus Extension A and compatibility ideographs.
fn is_cjk_ideograph(c: char) -> bool {
    matches!(c,
        '\u{3400}'..='\u{4dbf}' | '\u{4e00}'..='\u{9fff}' | '\u{f900}'..='\u{faff}')
}

/// Generate an anchor slug from a title.
///
/// Lowercases, keeps ASCII word characters, CJK ideographs and hyphens,
/// turns whitespace runs into single hyphens and drops everything else.
///
/// ```
/// use hengban::markdown::slugify;
///
/// assert_eq!(slugify("Chapter One"), "chapter-one");
/// assert_eq!(slugify("第一章　開始！"), "第一章-開始");
/// assert_eq!(slugify("snake_case -- ok"), "snake_case-ok");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if is_cjk_ideograph(c) {
            slug.push(c);
        } else if (c.is_whitespace() || c == '-') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Hands out slugs that are unique within one document.
///
/// A repeated slug gets `-2`, `-3`, … appended; a title with no usable
/// characters gets `chapter-N`.
#[derive(Debug, Default)]
pub struct SlugAllocator {
    used: HashSet<String>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh slug for `title`, the `ordinal`-th chapter (1-based).
    pub fn allocate(&mut self, title: &str, ordinal: usize) -> String {
        let mut base = slugify(title);
        if base.is_empty() {
            base = format!("chapter-{ordinal}");
        }

        let mut candidate = base.clone();
        let mut suffix = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}
