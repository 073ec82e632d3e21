//! Owned XML tree cached by a [`DocumentModel`](super::DocumentModel).
//!
//! `roxmltree` documents borrow the text they were parsed from, so the parse
//! result is copied into an owned structure that can outlive the buffer
//! snapshot and be shared between readers.

use std::fmt::Write as _;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use super::text::LineIndex;

/// Deepest element nesting accepted by [`XmlTree::parse`]. Parsing and every
/// walk over the tree recurse once per level.
pub const MAX_DEPTH: usize = 1024;

/// A parse failure, with the 1-based line/column reported by the parser.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TreeError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl From<roxmltree::Error> for TreeError {
    fn from(err: roxmltree::Error) -> Self {
        let pos = err.pos();
        Self {
            message: err.to_string(),
            line: pos.row,
            column: pos.col,
        }
    }
}

/// A qualified XML name as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    fn new(prefix: Option<&str>, local: &str) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()).map(str::to_string),
            local: local.to_string(),
        }
    }
}

impl std::fmt::Display for QName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub namespace: Option<String>,
    pub value: String,
}

/// A namespace declared on an element (`xmlns` or `xmlns:prefix`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub namespace: Option<String>,
    pub namespaces: Vec<NamespaceDecl>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, value: Option<String> },
}

/// A parsed document: the nodes directly under the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTree {
    pub children: Vec<XmlNode>,
}

impl XmlTree {
    /// Parse `text` into an owned tree. DTDs are accepted but not expanded
    /// into the tree.
    pub fn parse(text: &str) -> Result<Self, TreeError> {
        check_depth(text)?;
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)?;
        let children = doc.root().children().filter_map(convert_node).collect();
        Ok(Self { children })
    }

    pub fn root_element(&self) -> Option<&Element> {
        self.children.iter().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Serialize back to XML text. Attribute order and namespace declarations
    /// are preserved; the XML declaration and DOCTYPE are not.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            write_node(node, &mut out);
        }
        out
    }
}

/// Reject documents nested deeper than [`MAX_DEPTH`] before the recursive
/// parse sees them. Malformed input is left for `roxmltree` to report.
fn check_depth(text: &str) -> Result<(), TreeError> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    let offset = (reader.buffer_position() as usize).min(text.len());
                    let position = LineIndex::new(text).offset_to_position(offset);
                    return Err(TreeError {
                        message: format!("elements are nested deeper than {} levels", MAX_DEPTH),
                        line: position.line + 1,
                        column: position.character + 1,
                    });
                }
            }
            Ok(Event::End(_)) => depth = depth.saturating_sub(1),
            Ok(Event::Eof) | Err(_) => return Ok(()),
            Ok(_) => {}
        }
    }
}

fn convert_node(node: roxmltree::Node<'_, '_>) -> Option<XmlNode> {
    match node.node_type() {
        roxmltree::NodeType::Element => Some(XmlNode::Element(convert_element(node))),
        roxmltree::NodeType::Text => node.text().map(|t| XmlNode::Text(t.to_string())),
        roxmltree::NodeType::Comment => node.text().map(|t| XmlNode::Comment(t.to_string())),
        roxmltree::NodeType::PI => node.pi().map(|pi| XmlNode::ProcessingInstruction {
            target: pi.target.to_string(),
            value: pi.value.map(str::to_string),
        }),
        roxmltree::NodeType::Root => None,
    }
}

fn convert_element(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let prefix = tag.namespace().and_then(|ns| node.lookup_prefix(ns));

    // roxmltree reports every in-scope namespace; keep only those declared here.
    let inherited: Vec<(Option<&str>, &str)> = node
        .parent_element()
        .map(|p| p.namespaces().map(|ns| (ns.name(), ns.uri())).collect())
        .unwrap_or_default();
    let namespaces = node
        .namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .filter(|ns| !inherited.contains(&(ns.name(), ns.uri())))
        .map(|ns| NamespaceDecl {
            prefix: ns.name().map(str::to_string),
            uri: ns.uri().to_string(),
        })
        .collect();

    let attributes = node
        .attributes()
        .map(|attr| {
            let prefix = attr.namespace().and_then(|ns| node.lookup_prefix(ns));
            Attribute {
                name: QName::new(prefix, attr.name()),
                namespace: attr.namespace().map(str::to_string),
                value: attr.value().to_string(),
            }
        })
        .collect();

    Element {
        name: QName::new(prefix, tag.name()),
        namespace: tag.namespace().map(str::to_string),
        namespaces,
        attributes,
        children: node.children().filter_map(convert_node).collect(),
    }
}

fn write_node(node: &XmlNode, out: &mut String) {
    match node {
        XmlNode::Element(el) => {
            let _ = write!(out, "<{}", el.name);
            for ns in &el.namespaces {
                match &ns.prefix {
                    Some(prefix) => {
                        let _ = write!(out, " xmlns:{}=\"{}\"", prefix, escape(ns.uri.as_str()));
                    }
                    None => {
                        let _ = write!(out, " xmlns=\"{}\"", escape(ns.uri.as_str()));
                    }
                }
            }
            for attr in &el.attributes {
                let _ = write!(out, " {}=\"{}\"", attr.name, escape(attr.value.as_str()));
            }
            if el.children.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in &el.children {
                    write_node(child, out);
                }
                let _ = write!(out, "</{}>", el.name);
            }
        }
        XmlNode::Text(text) => out.push_str(&escape(text.as_str())),
        XmlNode::Comment(text) => {
            let _ = write!(out, "<!--{}-->", text);
        }
        XmlNode::ProcessingInstruction { target, value } => match value {
            Some(value) => {
                let _ = write!(out, "<?{} {}?>", target, value);
            }
            None => {
                let _ = write!(out, "<?{}?>", target);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child_elements(el: &Element) -> Vec<&Element> {
        el.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Element(child) => Some(child),
                _ => None,
            })
            .collect()
    }

    fn nested(depth: usize) -> String {
        format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth))
    }

    #[test]
    fn parses_elements_attributes_and_text() {
        let tree = XmlTree::parse(r#"<root id="1"><b>hi</b><c/></root>"#).unwrap();
        let root = tree.root_element().unwrap();
        assert_eq!(root.name.local, "root");
        assert_eq!(root.attributes[0].name.local, "id");
        assert_eq!(root.attributes[0].value, "1");
        let names: Vec<_> = child_elements(root)
            .iter()
            .map(|e| e.name.local.as_str())
            .collect();
        assert_eq!(names, vec!["b", "c"]);
        assert_eq!(
            child_elements(root)[0].children,
            vec![XmlNode::Text("hi".to_string())]
        );
    }

    #[test]
    fn serialization_round_trips_structure() {
        let source = r#"<a x="1 &amp; 2"><b/>text<!-- c --><d y="z">t</d></a>"#;
        let tree = XmlTree::parse(source).unwrap();
        let serialized = tree.to_xml();
        assert_eq!(serialized, source);
        assert_eq!(XmlTree::parse(&serialized).unwrap(), tree);
    }

    #[test]
    fn keeps_prefixes_and_local_declarations() {
        let source = r#"<p:a xmlns:p="urn:p" xmlns="urn:d"><b p:k="v"/></p:a>"#;
        let tree = XmlTree::parse(source).unwrap();
        let root = tree.root_element().unwrap();
        assert_eq!(root.name.to_string(), "p:a");
        assert_eq!(root.namespaces.len(), 2);

        let b = child_elements(root)[0];
        assert!(b.namespaces.is_empty());
        assert_eq!(b.namespace.as_deref(), Some("urn:d"));
        assert_eq!(b.attributes[0].name.to_string(), "p:k");
        assert_eq!(b.attributes[0].namespace.as_deref(), Some("urn:p"));

        assert_eq!(XmlTree::parse(&tree.to_xml()).unwrap(), tree);
    }

    #[test]
    fn accepts_doctype() {
        let tree = XmlTree::parse("<!DOCTYPE a><a/>").unwrap();
        assert_eq!(tree.root_element().unwrap().name.local, "a");
    }

    #[test]
    fn accepts_doctype_with_internal_subset() {
        let tree = XmlTree::parse("<!DOCTYPE a [<!ENTITY e 'x'>]><a>&e;</a>").unwrap();
        let root = tree.root_element().unwrap();
        assert_eq!(root.children, vec![XmlNode::Text("x".to_string())]);
    }

    #[test]
    fn rejects_excessive_nesting() {
        let err = XmlTree::parse(&nested(20_000)).unwrap_err();
        assert!(err.message.contains("nested deeper than 1024 levels"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn accepts_nesting_up_to_the_limit() {
        // debug builds need more than the default test thread stack here
        let handle = std::thread::Builder::new()
            .stack_size(64 << 20)
            .spawn(|| XmlTree::parse(&nested(MAX_DEPTH)).is_ok())
            .unwrap();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn nesting_check_leaves_malformed_input_to_the_parser() {
        let err = XmlTree::parse("<a><b></a>").unwrap_err();
        assert!(!err.message.contains("nested"));
    }

    #[test]
    fn reports_mismatched_tags() {
        let err = XmlTree::parse("<a><b></a>").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(!err.message.is_empty());
    }
}
