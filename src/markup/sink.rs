//! html5ever tree sink that builds an [`Element`] tree.
//!
//! The tree builder needs shared, mutable handles while it runs (adoption
//! agency, foster parenting), so nodes live behind `Rc` until `finish`
//! converts them into the owned tree.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use html5ever::driver::ParseOpts;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName, parse_document};

use super::{Element, Node};

/// Name of the synthetic root returned by [`parse`].
pub const DOCUMENT: &str = "#document";

type Handle = Rc<SinkNode>;

enum SinkData {
    Document,
    Element {
        name: QualName,
        attrs: RefCell<Vec<Html5Attribute>>,
    },
    Text(RefCell<String>),
    /// Comments and processing instructions.
    Ignored,
}

pub struct SinkNode {
    data: SinkData,
    parent: RefCell<Option<Weak<SinkNode>>>,
    children: RefCell<Vec<Handle>>,
}

impl SinkNode {
    fn new(data: SinkData) -> Handle {
        Rc::new(Self {
            data,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
        })
    }

    fn parent(&self) -> Option<Handle> {
        self.parent.borrow().as_ref().and_then(Weak::upgrade)
    }
}

fn text_node(text: &str) -> Handle {
    SinkNode::new(SinkData::Text(RefCell::new(text.to_string())))
}

fn detach(node: &Handle) {
    if let Some(parent) = node.parent.take().and_then(|weak| weak.upgrade()) {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
}

fn append_node(parent: &Handle, child: Handle) {
    detach(&child);
    *child.parent.borrow_mut() = Some(Rc::downgrade(parent));
    parent.children.borrow_mut().push(child);
}

fn append_text(parent: &Handle, text: &str) {
    // Adjacent character tokens arrive separately; keep them in one node.
    let merged = match parent.children.borrow().last() {
        Some(last) => match &last.data {
            SinkData::Text(existing) => {
                existing.borrow_mut().push_str(text);
                true
            }
            _ => false,
        },
        None => false,
    };
    if !merged {
        append_node(parent, text_node(text));
    }
}

fn insert_before(sibling: &Handle, child: Handle) {
    let Some(parent) = sibling.parent() else {
        return;
    };
    detach(&child);
    *child.parent.borrow_mut() = Some(Rc::downgrade(&parent));
    let mut children = parent.children.borrow_mut();
    let index = children
        .iter()
        .position(|c| Rc::ptr_eq(c, sibling))
        .unwrap_or(children.len());
    children.insert(index, child);
}

/// Collects html5ever's tree construction into shared nodes.
pub struct MarkupSink {
    document: Handle,
}

impl MarkupSink {
    pub fn new() -> Self {
        Self {
            document: SinkNode::new(SinkData::Document),
        }
    }
}

impl Default for MarkupSink {
    fn default() -> Self {
        Self::new()
    }
}

static EMPTY_NAME: QualName = QualName {
    prefix: None,
    ns: html5ever::ns!(),
    local: html5ever::local_name!(""),
};

impl TreeSink for MarkupSink {
    type Handle = Handle;
    type Output = Element;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Element {
        Element {
            name: DOCUMENT.to_string(),
            attrs: Vec::new(),
            children: convert_children(&self.document),
        }
    }

    fn parse_error(&self, _msg: Cow<'static, str>) {}

    fn get_document(&self) -> Handle {
        Rc::clone(&self.document)
    }

    fn elem_name<'a>(&'a self, target: &'a Handle) -> &'a QualName {
        match &target.data {
            SinkData::Element { name, .. } => name,
            _ => &EMPTY_NAME,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Handle {
        SinkNode::new(SinkData::Element {
            name,
            attrs: RefCell::new(attrs),
        })
    }

    fn create_comment(&self, _text: StrTendril) -> Handle {
        SinkNode::new(SinkData::Ignored)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Handle {
        SinkNode::new(SinkData::Ignored)
    }

    fn append(&self, parent: &Handle, child: NodeOrText<Handle>) {
        match child {
            NodeOrText::AppendNode(node) => append_node(parent, node),
            NodeOrText::AppendText(text) => append_text(parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Handle,
        prev_element: &Handle,
        child: NodeOrText<Handle>,
    ) {
        if element.parent().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Handle) -> Handle {
        Rc::clone(target)
    }

    fn same_node(&self, x: &Handle, y: &Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(&self, sibling: &Handle, new_node: NodeOrText<Handle>) {
        let node = match new_node {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => text_node(&text),
        };
        insert_before(sibling, node);
    }

    fn add_attrs_if_missing(&self, target: &Handle, attrs: Vec<Html5Attribute>) {
        if let SinkData::Element { attrs: existing, .. } = &target.data {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|a| a.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Handle) {
        detach(target);
    }

    fn reparent_children(&self, node: &Handle, new_parent: &Handle) {
        let children = node.children.take();
        for child in children {
            *child.parent.borrow_mut() = None;
            append_node(new_parent, child);
        }
    }
}

/// `svg:image`, `IMG` and `foreignObject` all map to their lowercase local name.
fn element_name(name: &QualName) -> String {
    let local: &str = &name.local;
    let local = local.rsplit(':').next().unwrap_or(local);
    local.to_ascii_lowercase()
}

fn attr_name(attr: &Html5Attribute) -> String {
    match &attr.name.prefix {
        Some(prefix) => format!("{}:{}", &**prefix, &*attr.name.local),
        None => attr.name.local.to_ascii_lowercase().to_string(),
    }
}

fn convert_children(node: &SinkNode) -> Vec<Node> {
    node.children
        .borrow()
        .iter()
        .filter_map(|child| match &child.data {
            SinkData::Element { name, attrs } => Some(Node::Element(Element {
                name: element_name(name),
                attrs: attrs
                    .borrow()
                    .iter()
                    .map(|a| (attr_name(a), a.value.to_string()))
                    .collect(),
                children: convert_children(child),
            })),
            SinkData::Text(text) => Some(Node::Text(text.borrow().clone())),
            SinkData::Document | SinkData::Ignored => None,
        })
        .collect()
}

/// Parse a chapter document with the HTML5 algorithm.
///
/// Never fails: malformed input is repaired the way browsers repair it, and
/// the result is always rooted at a [`DOCUMENT`] element.
pub fn parse(html: &str) -> Element {
    parse_document(MarkupSink::new(), ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_root_and_implied_structure() {
        let doc = parse("<p>one<p>two");
        assert_eq!(doc.name, DOCUMENT);
        let html = doc.child_elements().next().unwrap();
        assert_eq!(html.name, "html");
        let names: Vec<_> = html.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["head", "body"]);

        let mut paragraphs = Vec::new();
        doc.find_all(&|e| e.is("p"), &mut paragraphs);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[1].text_content(), "two");
    }

    #[test]
    fn test_full_entity_table() {
        let doc = parse("<p>&hArr; &oelig; &ldquo;引&rdquo; &#x4E2D;&#25991; AT&T</p>");
        assert_eq!(doc.plain_text(), "⇔ œ “引” 中文 AT&T");
    }

    #[test]
    fn test_attribute_entities_decoded() {
        let doc = parse(r#"<a href="a.xhtml?x=1&amp;y=2" title="&lt;t&gt;">x</a>"#);
        let a = doc.find(&|e| e.is("a")).unwrap();
        assert_eq!(a.attr("href"), Some("a.xhtml?x=1&y=2"));
        assert_eq!(a.attr("title"), Some("<t>"));
    }

    #[test]
    fn test_foreign_content_names() {
        let doc = parse(r#"<svg viewBox="0 0 1 1"><image xlink:href="c.png"/><foreignObject/></svg>"#);
        let image = doc.find(&|e| e.is("image")).unwrap();
        assert_eq!(image.attr("xlink:href"), Some("c.png"));
        assert!(doc.find(&|e| e.is("foreignobject")).is_some());
    }

    #[test]
    fn test_comments_and_doctype_dropped() {
        let doc = parse("<!DOCTYPE html><!-- note --><p>a<!-- b -->c</p>");
        assert_eq!(doc.plain_text(), "ac");
    }

    #[test]
    fn test_misnested_inline_repaired() {
        let doc = parse("<p><b>bold <i>both</b> italic</i></p>");
        assert_eq!(doc.plain_text(), "bold both italic");
        let mut italics = Vec::new();
        doc.find_all(&|e| e.is("i"), &mut italics);
        assert_eq!(italics.len(), 2);
    }

    #[test]
    fn test_xhtml_self_closing_div_is_not_void() {
        let doc = parse("<div/><p>x</p>");
        assert!(doc.find(&|e| e.is("div")).is_some());
        assert_eq!(doc.plain_text(), "x");
    }
}
