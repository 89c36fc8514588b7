//! Markup → Markdown rendering.
//!
//! Rendering never fails. Elements outside the supported subset are dropped
//! and their text is kept.

use crate::markup::{self, Element, Node};

use super::escape::{calculate_fence_length, calculate_inline_code_ticks, escape_markdown};

/// Elements dropped together with their content.
const DROPPED: &[&str] = &[
    "script", "style", "meta", "link", "head", "title", "noscript", "template", "rp",
];

/// Elements unwrapped with a blank line on either side.
const CONTAINERS: &[&str] = &[
    "#document",
    "html",
    "body",
    "div",
    "section",
    "article",
    "main",
    "header",
    "footer",
    "aside",
    "nav",
    "figure",
    "address",
    "center",
    "hgroup",
];

/// Wide characters that are joined without a space when a source line break
/// falls between them.
fn is_wide(c: char) -> bool {
    matches!(c,
        '\u{1100}'..='\u{11ff}'
        | '\u{2e80}'..='\u{303f}'
        | '\u{3040}'..='\u{30ff}'
        | '\u{3100}'..='\u{312f}'
        | '\u{3400}'..='\u{4dbf}'
        | '\u{4e00}'..='\u{9fff}'
        | '\u{ac00}'..='\u{d7af}'
        | '\u{f900}'..='\u{faff}'
        | '\u{fe30}'..='\u{fe4f}'
        | '\u{ff00}'..='\u{ffef}')
}

/// Collapse whitespace runs to one space, or to nothing between two wide
/// characters.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if let (Some(prev), Some(next)) = (out.chars().last(), word.chars().next())
            && !(is_wide(prev) && is_wide(next))
        {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Plain text of an element for headings, list items and table cells.
fn plain_text(element: &Element) -> String {
    normalize_whitespace(&element.block_text())
}

/// Whether an element has neither text nor images.
fn is_blank(element: &Element) -> bool {
    element.text_content().trim().is_empty()
        && element
            .find(&|e| e.is("img") || e.is("image") || e.is("hr"))
            .is_none()
}

/// Rendering state: pure string accumulation.
struct RenderContext {
    output: String,
    line_prefix: String,
    at_line_start: bool,
    pending_newline: bool,
}

impl RenderContext {
    fn new() -> Self {
        Self {
            output: String::new(),
            line_prefix: String::new(),
            at_line_start: true,
            pending_newline: false,
        }
    }

    fn ensure_line_started(&mut self) {
        if self.at_line_start {
            self.output.push_str(&self.line_prefix);
            self.at_line_start = false;
        }
    }

    fn write_newline(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
    }

    /// Move to a fresh line, leaving a blank line after a finished block.
    fn separate_block(&mut self) {
        if self.pending_newline {
            if !self.at_line_start {
                self.write_newline();
            }
            self.ensure_line_started();
            self.write_newline();
            self.pending_newline = false;
        } else if !self.at_line_start {
            self.write_newline();
        }
    }

    fn start_block(&mut self) {
        self.separate_block();
        self.ensure_line_started();
    }

    fn end_block(&mut self) {
        self.pending_newline = true;
    }

    /// Request a blank line before whatever comes next.
    fn break_block(&mut self) {
        if !self.output.is_empty() {
            self.pending_newline = true;
        }
    }

    fn write_raw(&mut self, text: &str) {
        if self.pending_newline {
            self.start_block();
        }
        self.ensure_line_started();
        self.output.push_str(text);
    }

    fn write_text(&mut self, text: &str) {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            if !text.is_empty()
                && !self.at_line_start
                && !self.pending_newline
                && !self.output.ends_with(' ')
            {
                self.output.push(' ');
            }
            return;
        }

        let leading = text.starts_with(char::is_whitespace);
        let trailing = text.ends_with(char::is_whitespace);

        if self.pending_newline {
            self.start_block();
        }
        self.ensure_line_started();

        let joins_wide = self
            .output
            .chars()
            .last()
            .zip(normalized.chars().next())
            .is_some_and(|(a, b)| is_wide(a) && is_wide(b));
        if leading && !joins_wide && !self.output.ends_with([' ', '\n']) {
            self.output.push(' ');
        }
        self.output.push_str(&escape_markdown(&normalized));
        if trailing {
            self.output.push(' ');
        }
    }

    fn walk_children(&mut self, element: &Element) {
        for child in &element.children {
            match child {
                Node::Text(text) => self.write_text(text),
                Node::Element(e) => self.walk_element(e),
            }
        }
    }

    /// Render `element`'s children into a detached buffer.
    fn render_inline(&mut self, element: &Element) -> String {
        let saved_output = std::mem::take(&mut self.output);
        let saved_line_start = self.at_line_start;
        let saved_pending = self.pending_newline;
        self.at_line_start = false;
        self.pending_newline = false;

        self.walk_children(element);

        self.at_line_start = saved_line_start;
        self.pending_newline = saved_pending;
        std::mem::replace(&mut self.output, saved_output)
    }

    /// Wrap inline content in `marker` on both sides, keeping surrounding
    /// whitespace outside the markers.
    fn write_wrapped(&mut self, element: &Element, marker: &str) {
        let inner = self.render_inline(element);
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            if !inner.is_empty() {
                self.write_text(" ");
            }
            return;
        }
        if inner.starts_with(' ') && !self.output.ends_with(' ') {
            self.write_raw(" ");
        }
        self.write_raw(&format!("{marker}{trimmed}{marker}"));
        if inner.ends_with(' ') {
            self.output.push(' ');
        }
    }

    fn walk_element(&mut self, element: &Element) {
        let name = element.name.as_str();
        if DROPPED.contains(&name) {
            return;
        }

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let text = plain_text(element);
                if text.is_empty() {
                    return;
                }
                let level = usize::from(name.as_bytes()[1] - b'0');
                self.start_block();
                self.output.push_str(&"#".repeat(level));
                self.output.push(' ');
                self.output.push_str(&escape_markdown(&text));
                self.end_block();
            }

            "p" => {
                if is_blank(element) {
                    return;
                }
                self.start_block();
                self.walk_children(element);
                self.end_block();
            }

            "br" => {
                if self.pending_newline || self.output.is_empty() {
                    return;
                }
                // Trailing spaces before a soft break are noise.
                while self.output.ends_with(' ') {
                    self.output.pop();
                }
                self.write_newline();
            }

            "hr" => {
                self.start_block();
                self.output.push_str("---");
                self.end_block();
            }

            "ul" | "ol" => self.write_list(element, name == "ol"),

            "blockquote" => {
                if is_blank(element) {
                    return;
                }
                self.separate_block();
                let saved_prefix = self.line_prefix.clone();
                self.line_prefix.push_str("> ");
                self.walk_children(element);
                self.line_prefix = saved_prefix;
                self.end_block();
            }

            "pre" => self.write_code_block(element),

            "code" | "kbd" | "samp" | "tt" => {
                let content = element.text_content();
                if content.trim().is_empty() {
                    return;
                }
                let ticks = "`".repeat(calculate_inline_code_ticks(&content));
                let spacer = if content.starts_with('`') || content.ends_with('`') {
                    " "
                } else {
                    ""
                };
                self.write_raw(&format!("{ticks}{spacer}{content}{spacer}{ticks}"));
            }

            "strong" | "b" => self.write_wrapped(element, "**"),
            "em" | "i" | "cite" | "dfn" | "var" => self.write_wrapped(element, "*"),
            "u" | "ins" => self.write_wrapped(element, "++"),
            "mark" => self.write_wrapped(element, "=="),
            "s" | "del" | "strike" => self.write_wrapped(element, "~~"),

            "a" => {
                let label = self.render_inline(element);
                let label = label.trim();
                if label.is_empty() {
                    return;
                }
                match element.attr("href").map(str::trim).filter(|h| !h.is_empty()) {
                    Some(href) => self.write_raw(&format!("[{label}]({href})")),
                    None => self.write_raw(label),
                }
            }

            "img" | "image" => {
                let src = element
                    .attr("src")
                    .or_else(|| element.attr("xlink:href"))
                    .or_else(|| element.attr("href"))
                    .unwrap_or("")
                    .trim();
                if src.is_empty() {
                    return;
                }
                let alt = normalize_whitespace(element.attr("alt").unwrap_or(""));
                self.write_raw(&format!("![{}]({src})", escape_markdown(&alt)));
            }

            "table" => self.write_table(element),

            "figcaption" | "caption" => {
                let text = plain_text(element);
                if text.is_empty() {
                    return;
                }
                self.start_block();
                self.output.push_str(&format!("*{}*", escape_markdown(&text)));
                self.end_block();
            }

            "dt" => {
                let text = plain_text(element);
                if text.is_empty() {
                    return;
                }
                self.start_block();
                self.output.push_str(&format!("**{}**", escape_markdown(&text)));
                self.pending_newline = false;
            }

            "dd" => {
                if !self.at_line_start {
                    self.write_newline();
                }
                self.ensure_line_started();
                self.output.push_str(": ");
                self.walk_children(element);
                self.end_block();
            }

            "dl" => {
                self.start_block();
                self.walk_children(element);
                self.end_block();
            }

            _ if CONTAINERS.contains(&name) => {
                self.break_block();
                self.walk_children(element);
                self.break_block();
            }

            _ => self.walk_children(element),
        }
    }

    /// Lists are flattened: one marker line per item, item markup stripped.
    fn write_list(&mut self, list: &Element, ordered: bool) {
        let items: Vec<String> = list
            .child_elements()
            .filter(|e| e.is("li"))
            .map(plain_text)
            .filter(|t| !t.is_empty())
            .collect();
        if items.is_empty() {
            return;
        }

        let start = list
            .attr("start")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1);

        self.start_block();
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.write_newline();
                self.ensure_line_started();
            }
            if ordered {
                self.output.push_str(&format!("{}. ", start + i));
            } else {
                self.output.push_str("- ");
            }
            self.output.push_str(&escape_markdown(item));
        }
        self.end_block();
    }

    fn write_code_block(&mut self, pre: &Element) {
        let text = pre.text_content();
        let text = text.strip_prefix('\n').unwrap_or(&text);
        let text = text.trim_end();
        if text.trim().is_empty() {
            return;
        }

        let language = std::iter::once(pre)
            .chain(pre.child_elements().filter(|e| e.is("code")))
            .filter_map(|e| e.attr("class"))
            .flat_map(str::split_whitespace)
            .find_map(|c| {
                c.strip_prefix("language-")
                    .or_else(|| c.strip_prefix("lang-"))
            })
            .unwrap_or("");

        let fence = "`".repeat(calculate_fence_length(text));
        self.start_block();
        self.output.push_str(&fence);
        self.output.push_str(language);
        for line in text.lines() {
            self.write_newline();
            self.ensure_line_started();
            self.output.push_str(line);
        }
        self.write_newline();
        self.ensure_line_started();
        self.output.push_str(&fence);
        self.end_block();
    }

    /// Tables render row by row; the first row is always followed by a
    /// separator row.
    fn write_table(&mut self, table: &Element) {
        let mut rows = Vec::new();
        table.find_all(&|e| e.is("tr"), &mut rows);

        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| {
                row.child_elements()
                    .filter(|c| c.is("td") || c.is("th"))
                    .map(|c| escape_markdown(&plain_text(c)))
                    .collect::<Vec<_>>()
            })
            .filter(|cells| !cells.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return;
        };
        let columns = first.len();

        self.start_block();
        for (i, cells) in rows.iter().enumerate() {
            if i > 0 {
                self.write_newline();
                self.ensure_line_started();
            }
            self.output.push_str("| ");
            self.output.push_str(&cells.join(" | "));
            self.output.push_str(" |");
            if i == 0 {
                self.write_newline();
                self.ensure_line_started();
                self.output.push('|');
                self.output.push_str(&" --- |".repeat(columns));
            }
        }
        self.end_block();
    }

    fn finish(self) -> String {
        cleanup(&self.output)
    }
}

/// Trim trailing whitespace on every line, collapse runs of blank lines
/// (including bare quote markers) to one, and trim the whole document.
fn cleanup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_blank_run = false;
    for line in text.lines() {
        let line = line.trim_end();
        let blank = line.trim_end_matches(['>', ' ']).is_empty();
        if blank && in_blank_run {
            continue;
        }
        in_blank_run = blank;
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Render a markup document (or fragment) as Markdown.
pub fn html_to_markdown(html: &str) -> String {
    let document = markup::parse(html);
    render_element(&document)
}

/// Render an already parsed element and its descendants as Markdown.
pub fn render_element(element: &Element) -> String {
    let mut ctx = RenderContext::new();
    ctx.walk_element(element);
    ctx.finish()
}
