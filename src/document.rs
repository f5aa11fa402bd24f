//! @dose
//! purpose: Markdown document model consumed by the changelog extractor. Parses raw bytes
//!     into an mdast tree (markdown crate, GFM options) and converts it into an owned tree of
//!     Node values tagged by NodeKind, then walks it depth-first with enter/exit events.
//!
//! when-editing:
//!     - !NodeKind is a closed enum; visitors match it exhaustively, so adding a kind breaks them
//!     - !Link reference definitions never become nodes; they only resolve LinkReference urls
//!     - Node text is computed once at conversion time, visitors never re-scan children
//!
//! invariants:
//!     - walk() visits every node exactly twice: entering=true before its children, false after
//!     - previous_sibling is the node directly before this one in its parent's children
//!     - Reference identifiers compare case-insensitively with collapsed whitespace
//!
//! gotchas:
//!     - A heading followed by a `[x]: url` line still precedes the next paragraph directly,
//!       because the definition is dropped from the tree
//!     - List item text excludes nested lists; those items are reachable as child nodes
//!     - Bare URLs and `<url>` autolinks are mdast links too; they become NodeKind::Other
//!       (keeping their text) so only bracketed links carry a destination
//!     - Inline HTML is kept verbatim in node text (`<kbd>Ctrl</kbd>` stays as written)

use markdown::mdast;
use markdown::ParseOptions;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Document is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("Failed to parse markdown: {0}")]
    Markdown(String),
    #[error("Document walk aborted: {0}")]
    Aborted(String),
}

/// Kind of a document node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Heading { level: u8 },
    List,
    ListItem,
    Paragraph,
    Link { destination: String },
    Other,
}

/// A node of the document tree with its pre-computed plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    text: String,
    children: Vec<Node>,
}

impl Node {
    pub fn new(kind: NodeKind, text: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            kind,
            text: text.into(),
            children,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Heading level, or None for anything that isn't a heading
    pub fn level(&self) -> Option<u8> {
        match self.kind {
            NodeKind::Heading { level } => Some(level),
            _ => None,
        }
    }

    /// Link destination, or None for anything that isn't a link
    pub fn destination(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Link { destination } => Some(destination),
            _ => None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn is_heading(&self, level: u8) -> bool {
        self.level() == Some(level)
    }
}

/// Position of a node during a walk
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    pub node: &'a Node,
    pub previous_sibling: Option<&'a Node>,
}

/// Receives enter/exit events from Document::walk
pub trait Visitor {
    /// Called with entering=true before the node's children and entering=false after them.
    /// Returning an error stops the walk.
    fn visit(&mut self, cursor: Cursor<'_>, entering: bool) -> Result<(), DocumentError>;
}

/// A parsed markdown document
#[derive(Debug, Clone)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Parse UTF-8 markdown bytes into a document tree
    pub fn parse(source: &[u8]) -> Result<Self, DocumentError> {
        let text = std::str::from_utf8(source)?;
        let ast = markdown::to_mdast(text, &ParseOptions::gfm())
            .map_err(|e| DocumentError::Markdown(e.to_string()))?;

        let mut definitions = HashMap::new();
        collect_definitions(&ast, &mut definitions);

        let root = convert(&ast, text, &definitions).unwrap_or_else(|| {
            Node::new(NodeKind::Document, String::new(), Vec::new())
        });
        tracing::trace!(
            definitions = definitions.len(),
            blocks = root.children.len(),
            "parsed markdown document"
        );

        Ok(Self { root })
    }

    /// Wrap an already built tree
    pub fn from_root(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Depth-first, left-to-right walk with enter and exit events
    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<(), DocumentError> {
        walk_node(&self.root, None, visitor)
    }
}

fn walk_node<V: Visitor + ?Sized>(
    node: &Node,
    previous_sibling: Option<&Node>,
    visitor: &mut V,
) -> Result<(), DocumentError> {
    let cursor = Cursor {
        node,
        previous_sibling,
    };
    visitor.visit(cursor, true)?;

    let mut previous = None;
    for child in &node.children {
        walk_node(child, previous, visitor)?;
        previous = Some(child);
    }

    visitor.visit(cursor, false)
}

fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn collect_definitions(node: &mdast::Node, definitions: &mut HashMap<String, String>) {
    if let mdast::Node::Definition(definition) = node {
        // First definition of a label wins
        definitions
            .entry(normalize_label(&definition.identifier))
            .or_insert_with(|| definition.url.clone());
    }

    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, definitions);
        }
    }
}

/// Autolinks (`<https://..>` and GFM bare URLs) don't start with `[` in the source
fn is_autolink(link: &mdast::Link, source: &str) -> bool {
    match &link.position {
        Some(position) => !source
            .get(position.start.offset..)
            .is_some_and(|rest| rest.starts_with('[')),
        None => matches!(
            link.children.as_slice(),
            [mdast::Node::Text(text)] if link.url.ends_with(text.value.as_str())
        ),
    }
}

fn convert(
    node: &mdast::Node,
    source: &str,
    definitions: &HashMap<String, String>,
) -> Option<Node> {
    let kind = match node {
        mdast::Node::Definition(_) => return None,
        mdast::Node::Root(_) => NodeKind::Document,
        mdast::Node::Heading(heading) => NodeKind::Heading {
            level: heading.depth,
        },
        mdast::Node::List(_) => NodeKind::List,
        mdast::Node::ListItem(_) => NodeKind::ListItem,
        mdast::Node::Paragraph(_) => NodeKind::Paragraph,
        mdast::Node::Link(link) if is_autolink(link, source) => NodeKind::Other,
        mdast::Node::Link(link) => NodeKind::Link {
            destination: link.url.clone(),
        },
        mdast::Node::LinkReference(reference) => {
            match definitions.get(&normalize_label(&reference.identifier)) {
                Some(url) => NodeKind::Link {
                    destination: url.clone(),
                },
                None => NodeKind::Other,
            }
        }
        _ => NodeKind::Other,
    };

    let text = match (&kind, node) {
        (NodeKind::ListItem, mdast::Node::ListItem(item)) => list_item_text(&item.children),
        (NodeKind::List | NodeKind::Document, _) => String::new(),
        _ => {
            let mut out = String::new();
            push_text(node, &mut out);
            out.trim().to_string()
        }
    };

    let children = node
        .children()
        .map(|children| {
            children
                .iter()
                .filter_map(|child| convert(child, source, definitions))
                .collect()
        })
        .unwrap_or_default();

    Some(Node::new(kind, text, children))
}

/// Text of a list item's own blocks, nested lists excluded
fn list_item_text(children: &[mdast::Node]) -> String {
    children
        .iter()
        .filter(|child| !matches!(child, mdast::Node::List(_)))
        .map(|child| {
            let mut out = String::new();
            push_text(child, &mut out);
            out.trim().to_string()
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_text(node: &mdast::Node, out: &mut String) {
    match node {
        mdast::Node::Text(text) => out.push_str(&text.value),
        mdast::Node::InlineCode(code) => out.push_str(&code.value),
        mdast::Node::InlineMath(math) => out.push_str(&math.value),
        mdast::Node::Html(html) => out.push_str(&html.value),
        mdast::Node::Break(_) => out.push('\n'),
        mdast::Node::Definition(_) => {}
        _ => {
            if let Some(children) = node.children() {
                for child in children {
                    push_text(child, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records (kind, text, entering) triples
    #[derive(Default)]
    struct Recorder {
        events: Vec<(NodeKind, String, bool)>,
    }

    impl Visitor for Recorder {
        fn visit(&mut self, cursor: Cursor<'_>, entering: bool) -> Result<(), DocumentError> {
            self.events.push((
                cursor.node.kind().clone(),
                cursor.node.text().to_string(),
                entering,
            ));
            Ok(())
        }
    }

    fn blocks(source: &str) -> Vec<Node> {
        Document::parse(source.as_bytes())
            .unwrap()
            .root()
            .children()
            .to_vec()
    }

    #[test]
    fn test_parse_block_kinds() {
        let nodes = blocks("## Title\n\nSome text.\n\n- one\n- two\n");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0].kind(), &NodeKind::Heading { level: 2 });
        assert_eq!(nodes[0].text(), "Title");
        assert_eq!(nodes[1].kind(), &NodeKind::Paragraph);
        assert_eq!(nodes[1].text(), "Some text.");
        assert_eq!(nodes[2].kind(), &NodeKind::List);
        assert_eq!(nodes[2].children().len(), 2);
        assert_eq!(nodes[2].children()[1].text(), "two");
    }

    #[test]
    fn test_inline_text_flattens_markup() {
        let nodes = blocks("- Added `foo` with **bold** and [a link](https://x.dev)\n");
        let item = &nodes[0].children()[0];
        assert_eq!(item.kind(), &NodeKind::ListItem);
        assert_eq!(item.text(), "Added foo with bold and a link");
    }

    #[test]
    fn test_inline_link_destination() {
        let nodes = blocks("## [1.0.0](https://example.com/1.0.0) - 2024-01-01\n");
        let heading = &nodes[0];
        assert_eq!(heading.text(), "1.0.0 - 2024-01-01");
        let link = heading
            .children()
            .iter()
            .find(|n| n.destination().is_some())
            .unwrap();
        assert_eq!(link.destination(), Some("https://example.com/1.0.0"));
    }

    #[test]
    fn test_autolinks_carry_no_destination() {
        let nodes = blocks("- see https://example.com/issues/1\n- and <https://example.com/issues/2>\n");
        let items = nodes[0].children();
        assert_eq!(items[0].text(), "see https://example.com/issues/1");
        assert_eq!(items[1].text(), "and https://example.com/issues/2");

        fn has_destination(node: &Node) -> bool {
            node.destination().is_some() || node.children().iter().any(has_destination)
        }
        assert!(!has_destination(&nodes[0]));
    }

    #[test]
    fn test_inline_html_kept_in_text() {
        let nodes = blocks("- Press <kbd>Ctrl</kbd> to toggle\n");
        let item = &nodes[0].children()[0];
        assert_eq!(item.text(), "Press <kbd>Ctrl</kbd> to toggle");
    }

    #[test]
    fn test_reference_link_resolves_and_definition_is_dropped() {
        let nodes = blocks("## [1.1.0] - 2024-03-01\n[1.1.0]: https://example.com/1.1.0\n\nText.\n");
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].is_heading(2));
        assert_eq!(nodes[0].text(), "1.1.0 - 2024-03-01");
        assert_eq!(
            nodes[0].children()[0].destination(),
            Some("https://example.com/1.1.0")
        );
        assert_eq!(nodes[1].kind(), &NodeKind::Paragraph);
    }

    #[test]
    fn test_reference_link_case_insensitive() {
        let nodes = blocks("## [Unreleased]\n\n[unreleased]: https://example.com/compare\n");
        assert_eq!(
            nodes[0].children()[0].destination(),
            Some("https://example.com/compare")
        );
    }

    #[test]
    fn test_unresolved_reference_is_plain_text() {
        let nodes = blocks("## [Unreleased]\n");
        assert_eq!(nodes[0].text(), "[Unreleased]");
        assert!(nodes[0].children().iter().all(|n| n.destination().is_none()));
    }

    #[test]
    fn test_list_item_text_excludes_nested_list() {
        let nodes = blocks("- parent\n  - child\n");
        let item = &nodes[0].children()[0];
        assert_eq!(item.text(), "parent");
        let nested = item
            .children()
            .iter()
            .find(|n| n.kind() == &NodeKind::List)
            .unwrap();
        assert_eq!(nested.children()[0].text(), "child");
    }

    #[test]
    fn test_walk_enter_exit_order() {
        let doc = Document::parse(b"## A\n\n- x\n").unwrap();
        let mut recorder = Recorder::default();
        doc.walk(&mut recorder).unwrap();

        let kinds: Vec<(NodeKind, bool)> = recorder
            .events
            .iter()
            .filter(|(kind, _, _)| kind != &NodeKind::Other)
            .map(|(kind, _, entering)| (kind.clone(), *entering))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (NodeKind::Document, true),
                (NodeKind::Heading { level: 2 }, true),
                (NodeKind::Heading { level: 2 }, false),
                (NodeKind::List, true),
                (NodeKind::ListItem, true),
                (NodeKind::Paragraph, true),
                (NodeKind::Paragraph, false),
                (NodeKind::ListItem, false),
                (NodeKind::List, false),
                (NodeKind::Document, false),
            ]
        );
    }

    #[test]
    fn test_walk_previous_sibling() {
        struct Siblings(Vec<Option<NodeKind>>);
        impl Visitor for Siblings {
            fn visit(&mut self, cursor: Cursor<'_>, entering: bool) -> Result<(), DocumentError> {
                if entering && cursor.node.kind() == &NodeKind::Paragraph {
                    self.0.push(cursor.previous_sibling.map(|n| n.kind().clone()));
                }
                Ok(())
            }
        }

        let doc = Document::parse(b"First.\n\n## H\n\nSecond.\n").unwrap();
        let mut siblings = Siblings(Vec::new());
        doc.walk(&mut siblings).unwrap();
        assert_eq!(
            siblings.0,
            vec![None, Some(NodeKind::Heading { level: 2 })]
        );
    }

    #[test]
    fn test_walk_aborts_on_visitor_error() {
        struct Abort(usize);
        impl Visitor for Abort {
            fn visit(&mut self, _cursor: Cursor<'_>, _entering: bool) -> Result<(), DocumentError> {
                self.0 += 1;
                Err(DocumentError::Aborted("stop".to_string()))
            }
        }

        let doc = Document::parse(b"## A\n\n## B\n").unwrap();
        let mut abort = Abort(0);
        let err = doc.walk(&mut abort).unwrap_err();
        assert!(matches!(err, DocumentError::Aborted(_)));
        assert_eq!(abort.0, 1);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = Document::parse(&[0x23, 0x20, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidUtf8(_)));
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::parse(b"").unwrap();
        assert_eq!(doc.root().kind(), &NodeKind::Document);
        assert!(doc.root().children().is_empty());
    }
}
