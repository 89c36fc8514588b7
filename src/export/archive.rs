//! Repackaging: every entry keeps its path, text entries are restyled.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, info};

use crate::book::{ArchiveEntry, EntryKind};
use crate::epub::{ArchiveSink, ArchiveSource, write_entries};
use crate::error::{Error, Result};
use crate::script::ScriptNormalizer;
use crate::transform::LayoutRules;
use crate::transform::css::rewrite_stylesheet;
use crate::transform::html::rewrite_markup;

static XML_ENCODING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\A(\s*<\?xml\b[^>]*?\bencoding\s*=\s*["'])([^"']*)(["'])"#).unwrap()
});

static CSS_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\A(\s*@charset\s+["'])([^"']*)(["'])"#).unwrap());

/// Rewrites the entries of a packaged document.
#[derive(Debug)]
pub struct ArchiveRewriter<'a> {
    rules: LayoutRules,
    normalizer: &'a ScriptNormalizer,
}

impl<'a> ArchiveRewriter<'a> {
    pub fn new(rules: LayoutRules, normalizer: &'a ScriptNormalizer) -> Self {
        Self { rules, normalizer }
    }

    /// The replacement for one entry.
    ///
    /// Markup and stylesheets are script-converted and restyled, and always
    /// come out as UTF-8. Everything else is copied unchanged.
    pub fn rewrite_entry(&self, entry: &ArchiveEntry) -> ArchiveEntry {
        match entry.kind {
            EntryKind::Markup => {
                let text = self.normalizer.to_traditional(&entry.text());
                let text = declare_utf8(&XML_ENCODING_RE, &text);
                entry.with_text(rewrite_markup(&text, &self.rules))
            }
            EntryKind::Style => {
                let text = self.normalizer.to_traditional(&entry.text());
                let text = declare_utf8(&CSS_CHARSET_RE, &text);
                entry.with_text(rewrite_stylesheet(&text, &self.rules))
            }
            EntryKind::Directory | EntryKind::Binary => entry.clone(),
        }
    }

    /// Rewrite every entry of `source` in memory, in archive order.
    ///
    /// An entry that cannot be read aborts the run: a repackaged archive with
    /// a missing member is not a faithful copy.
    pub fn rewrite_all<S, F>(&self, source: &mut S, mut on_entry: F) -> Result<Vec<ArchiveEntry>>
    where
        S: ArchiveSource + ?Sized,
        F: FnMut(usize, usize),
    {
        let paths = source.entry_paths();
        let total = paths.len();
        let mut rewritten = Vec::with_capacity(total);

        for (i, path) in paths.iter().enumerate() {
            let entry = source
                .read_entry(path)
                .map_err(|e| Error::SourceUnreadable(format!("{path}: {e}")))?;
            let out = self.rewrite_entry(&entry);
            debug!(%path, kind = ?entry.kind, changed = out.data != entry.data, "rewrote entry");
            rewritten.push(out);
            on_entry(i + 1, total);
        }

        let text_entries = rewritten.iter().filter(|e| e.kind.is_text()).count();
        info!(entries = total, rewritten = text_entries, "archive rewritten");
        Ok(rewritten)
    }

    /// Rewrite `source` into `sink`.
    pub fn repackage<S, K, F>(&self, source: &mut S, sink: &mut K, on_entry: F) -> Result<usize>
    where
        S: ArchiveSource + ?Sized,
        K: ArchiveSink + ?Sized,
        F: FnMut(usize, usize),
    {
        let entries = self.rewrite_all(source, on_entry)?;
        write_entries(sink, &entries)?;
        Ok(entries.len())
    }
}

/// Point an encoding declaration at UTF-8, since rewritten text is re-encoded.
fn declare_utf8(re: &Regex, text: &str) -> String {
    match re.captures(text) {
        Some(caps) if !caps[2].eq_ignore_ascii_case("utf-8") => {
            re.replace(text, "${1}UTF-8${3}").into_owned()
        }
        _ => text.to_string(),
    }
}
