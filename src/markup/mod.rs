//! An owned markup tree for chapter documents, built by html5ever.
//!
//! Chapter files in the wild range from strict XHTML to tag soup; both go
//! through the HTML5 tree builder, so parsing never fails.

mod sink;

pub use sink::{DOCUMENT, MarkupSink, parse};

/// Elements whose boundaries separate words in extracted text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "caption", "dd", "div", "dl", "dt",
    "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr",
    "li", "main", "nav", "ol", "p", "pre", "section", "table", "tbody", "td", "tfoot", "th",
    "thead", "tr", "ul",
];

/// A node in the markup tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with lowercased, namespace-stripped name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attribute value by exact (lowercased) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search for the first descendant matching `pred`.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        for child in self.child_elements() {
            if pred(child) {
                return Some(child);
            }
            if let Some(found) = child.find(pred) {
                return Some(found);
            }
        }
        None
    }

    /// All descendant elements matching `pred`, in document order.
    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if pred(child) {
                out.push(child);
            }
            child.find_all(pred, out);
        }
    }

    pub fn is_block(&self) -> bool {
        BLOCK_ELEMENTS.contains(&self.name.as_str())
    }

    /// Concatenated text of all descendants, skipping script and style.
    ///
    /// Text is joined exactly as written; see [`Element::plain_text`] for
    /// the word-separated form.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out, false);
        out
    }

    fn collect_text(&self, out: &mut String, separate_blocks: bool) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) if e.is("script") || e.is("style") => {}
                Node::Element(e) if e.is("br") => out.push(' '),
                Node::Element(e) if separate_blocks && e.is_block() => {
                    out.push(' ');
                    e.collect_text(out, separate_blocks);
                    out.push(' ');
                }
                Node::Element(e) => e.collect_text(out, separate_blocks),
            }
        }
    }

    /// Like [`Element::text_content`], with a space on both sides of every
    /// block-level descendant.
    pub fn block_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out, true);
        out
    }

    /// Block-separated text with whitespace runs collapsed and ends trimmed.
    pub fn plain_text(&self) -> String {
        self.block_text()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_and_text() {
        let doc = parse("<div><h2 class='x'>第<b>一</b>章</h2><p>a <br/>b</p></div>");
        let h2 = doc.find(&|e| e.is("h2")).unwrap();
        assert_eq!(h2.attr("class"), Some("x"));
        assert_eq!(h2.plain_text(), "第一章");

        let p = doc.find(&|e| e.is("p")).unwrap();
        assert_eq!(p.plain_text(), "a b");

        let mut all = Vec::new();
        doc.find_all(&|e| e.is("b") || e.is("p"), &mut all);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "b");
    }

    #[test]
    fn test_text_skips_script() {
        let doc = parse("<p>x<script>var y = 1;</script>z</p>");
        assert_eq!(doc.plain_text(), "xz");
    }

    #[test]
    fn test_block_boundaries_separate_words() {
        let doc = parse("<ul><li>Fruits<ul><li>Apple</li><li>Pear</li></ul></li></ul>");
        let item = doc.find(&|e| e.is("li")).unwrap();
        assert_eq!(item.plain_text(), "Fruits Apple Pear");
        assert_eq!(item.text_content(), "FruitsApplePear");

        let doc = parse("<table><tr><td><p>alpha</p><p>beta</p></td></tr></table>");
        let cell = doc.find(&|e| e.is("td")).unwrap();
        assert_eq!(cell.plain_text(), "alpha beta");
    }

    #[test]
    fn test_inline_boundaries_join_words() {
        let doc = parse("<p>un<em>believ</em>able <span>多</span>字</p>");
        assert_eq!(doc.plain_text(), "unbelievable 多字");
    }
}
