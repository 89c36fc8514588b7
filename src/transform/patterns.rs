//! Cached regex patterns for style and layout rewriting.
//!
//! Uses LazyLock to compile patterns once on first use.

use regex_lite::Regex;
use std::sync::LazyLock;

// === Declarations ===

/// Any vertical writing-mode declaration, vendor-prefixed or not
/// (`vertical-rl`, `vertical-lr`, `sideways-*`, legacy `tb-rl`).
pub static VERTICAL_WRITING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?:-(?:webkit|epub|moz|ms)-)?writing-mode\s*:\s*(?:vertical|sideways|tb)[^;}"'<>]*;?"#,
    )
    .unwrap()
});

/// Any text-orientation declaration.
pub static TEXT_ORIENTATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:-(?:webkit|epub|moz|ms)-)?text-orientation\s*:[^;}"'<>]*;?"#).unwrap()
});

// === Markup structure ===

/// Opening `<html>` tag, attributes captured.
pub static HTML_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html(\s[^>]*)?>").unwrap());

/// Opening `<body>` tag, attributes captured.
pub static BODY_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body(\s[^>]*)?>").unwrap());

/// Closing `</head>` tag.
pub static HEAD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").unwrap());

/// Leading XML declaration and doctype.
pub static PROLOG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*(?:<\?xml[^>]*\?>\s*)?(?:<!DOCTYPE[^>]*>\s*)?").unwrap()
});

/// `style="..."` or `style='...'` within a tag's attribute list.
pub static STYLE_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)(\s)style\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

// === Injected blocks ===

/// A `<style>` element injected by an earlier run, with its trailing newline.
pub static INJECTED_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<style[^>]*\bid\s*=\s*["']hengban-layout["'][^>]*>.*?</style>\n?"#).unwrap()
});

/// A stylesheet rule block appended by an earlier run.
pub static INJECTED_CSS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\n?/\* hengban:begin \*/.*?/\* hengban:end \*/\n?").unwrap()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_variants_match() {
        for decl in [
            "writing-mode: vertical-rl;",
            "WRITING-MODE:vertical-lr",
            "-webkit-writing-mode: vertical-rl;",
            "-epub-writing-mode: tb-rl;",
            "writing-mode: sideways-rl;",
        ] {
            assert!(VERTICAL_WRITING_RE.is_match(decl), "{decl}");
        }
        assert!(!VERTICAL_WRITING_RE.is_match("writing-mode: horizontal-tb;"));
    }

    #[test]
    fn test_vertical_match_stops_at_attribute_quote() {
        let tag = r#"<p style="writing-mode: vertical-rl">"#;
        let m = VERTICAL_WRITING_RE.find(tag).unwrap();
        assert_eq!(m.as_str(), "writing-mode: vertical-rl");
    }

    #[test]
    fn test_prefixed_match_includes_prefix() {
        let m = VERTICAL_WRITING_RE
            .find("a{-webkit-writing-mode:vertical-rl;}")
            .unwrap();
        assert_eq!(m.as_str(), "-webkit-writing-mode:vertical-rl;");
    }

    #[test]
    fn test_injected_style_block() {
        let html = "<head><style id=\"hengban-layout\">* {}</style>\n</head>";
        assert_eq!(INJECTED_STYLE_RE.replace_all(html, ""), "<head></head>");
    }
}
