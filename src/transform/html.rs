//! Markup rewriting: horizontal root/body and an injected layout block.

use regex_lite::{Captures, Regex};
use tracing::debug;

use super::css::strip_vertical_declarations;
use super::patterns::{
    BODY_OPEN_RE, HEAD_CLOSE_RE, HTML_OPEN_RE, INJECTED_STYLE_RE, PROLOG_RE, STYLE_ATTR_RE,
};
use super::{LayoutRules, STYLE_BLOCK_ID};

/// Declarations forced onto the root and body elements.
const HORIZONTAL_STYLE: &str = "writing-mode: horizontal-tb; direction: ltr;";

/// Where the layout `<style>` block goes, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// Immediately before `</head>`.
    BeforeHeadClose,
    /// Immediately before the `<html` opener.
    BeforeRoot,
    /// At the start of the document, after any XML declaration or doctype.
    AfterProlog,
}

impl Injection {
    pub const ORDER: [Injection; 3] = [
        Injection::BeforeHeadClose,
        Injection::BeforeRoot,
        Injection::AfterProlog,
    ];

    fn locate(self, html: &str) -> Option<usize> {
        match self {
            Injection::BeforeHeadClose => HEAD_CLOSE_RE.find(html).map(|m| m.start()),
            Injection::BeforeRoot => HTML_OPEN_RE.find(html).map(|m| m.start()),
            Injection::AfterProlog => Some(PROLOG_RE.find(html).map_or(0, |m| m.end())),
        }
    }

    /// The first strategy that applies to `html`, with its byte offset.
    pub fn choose(html: &str) -> (Injection, usize) {
        Self::ORDER
            .iter()
            .find_map(|s| s.locate(html).map(|pos| (*s, pos)))
            .unwrap_or((Injection::AfterProlog, 0))
    }
}

/// Rewrite one markup document for horizontal reading.
///
/// Vertical writing declarations are removed everywhere, the root and body
/// elements get an inline horizontal/ltr style, and the layout rule block is
/// injected into the head. A block from an earlier run is replaced.
pub fn rewrite_markup(html: &str, rules: &LayoutRules) -> String {
    let cleaned = INJECTED_STYLE_RE.replace_all(html, "");
    let cleaned = strip_vertical_declarations(&cleaned);
    let cleaned = force_horizontal(&HTML_OPEN_RE, &cleaned);
    let cleaned = force_horizontal(&BODY_OPEN_RE, &cleaned);

    let (strategy, pos) = Injection::choose(&cleaned);
    debug!(?strategy, "injecting layout block");

    let block = style_block(rules);
    let mut out = String::with_capacity(cleaned.len() + block.len());
    out.push_str(&cleaned[..pos]);
    out.push_str(&block);
    out.push_str(&cleaned[pos..]);
    out
}

fn style_block(rules: &LayoutRules) -> String {
    format!(
        "<style id=\"{STYLE_BLOCK_ID}\" type=\"text/css\">\n{}\n</style>\n",
        rules.css_rules()
    )
}

/// Give the first tag matched by `tag_re` an inline horizontal style,
/// merging with whatever style attribute it already carries.
fn force_horizontal(tag_re: &Regex, html: &str) -> String {
    tag_re
        .replace(html, |caps: &Captures| {
            let whole = &caps[0];
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let name_end = whole.len() - attrs.len() - 1;
            let opener = &whole[..name_end];
            let attrs = merge_style_attr(attrs);
            format!("{opener}{attrs}>")
        })
        .into_owned()
}

fn merge_style_attr(attrs: &str) -> String {
    if let Some(caps) = STYLE_ATTR_RE.captures(attrs) {
        let (value, quote) = match (caps.get(2), caps.get(3)) {
            (Some(v), _) => (v.as_str(), '"'),
            (None, Some(v)) => (v.as_str(), '\''),
            (None, None) => ("", '"'),
        };
        let merged = merged_style(value);
        let replacement = format!("{}style={quote}{merged}{quote}", &caps[1]);
        let range = caps.get(0).map_or(0..0, |m| m.range());
        let mut out = String::with_capacity(attrs.len() + HORIZONTAL_STYLE.len());
        out.push_str(&attrs[..range.start]);
        out.push_str(&replacement);
        out.push_str(&attrs[range.end..]);
        return out;
    }

    let trimmed = attrs.trim_end_matches('/');
    let self_closing = &attrs[trimmed.len()..];
    format!("{trimmed} style=\"{HORIZONTAL_STYLE}\"{self_closing}")
}

/// The forced declarations followed by the rest of an existing style value
/// with its own writing-mode and direction declarations removed.
fn merged_style(existing: &str) -> String {
    let mut merged = String::from(HORIZONTAL_STYLE);
    for decl in existing.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        let property = decl
            .split(':')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        if property == "direction" || property.ends_with("writing-mode") {
            continue;
        }
        merged.push(' ');
        merged.push_str(decl);
        merged.push(';');
    }
    merged
}
