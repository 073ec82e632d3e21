//! XPath 1.0 evaluation against parsed documents, backed by `sxd-xpath`.
//!
//! The `sxd-document` package is built from an [`XmlTree`], so anything the
//! document model accepts (DOCTYPEs included) can be queried.

use serde::Serialize;
use sxd_document::dom::{self, Document};
use sxd_document::{Package, QName as SxdName};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{evaluate_xpath, Value};
use thiserror::Error;

use crate::document::{Element, XmlNode, XmlTree};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum XPathError {
    #[error("the document is not valid XML: {0}")]
    InvalidXml(String),
    #[error("{0}")]
    Query(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XPathOptions {
    pub ignore_default_namespace: bool,
}

impl Default for XPathOptions {
    fn default() -> Self {
        Self {
            ignore_default_namespace: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    Comment,
    Namespace,
    ProcessingInstruction,
}

/// One node selected by a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XPathMatch {
    pub kind: NodeKind,
    pub name: Option<String>,
    pub value: String,
}

impl std::fmt::Display for XPathMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}: {}", name, self.value),
            None => f.write_str(&self.value),
        }
    }
}

/// The value of an XPath expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum XPathOutcome {
    Nodes(Vec<XPathMatch>),
    Boolean(bool),
    Number(f64),
    String(String),
}

impl XPathOutcome {
    /// One-line description for a status message.
    pub fn summary(&self) -> String {
        match self {
            XPathOutcome::Nodes(nodes) if nodes.is_empty() => {
                "Your XPath query returned no results.".to_string()
            }
            XPathOutcome::Nodes(nodes) => {
                format!("Your XPath query returned {} node(s).", nodes.len())
            }
            XPathOutcome::Boolean(b) => format!("XPath result: {}", b),
            XPathOutcome::Number(n) => format!("XPath result: {}", n),
            XPathOutcome::String(s) => format!("XPath result: \"{}\"", s),
        }
    }

    /// Detail lines, one per selected node.
    pub fn lines(&self) -> Vec<String> {
        match self {
            XPathOutcome::Nodes(nodes) => nodes.iter().map(ToString::to_string).collect(),
            _ => vec![self.summary()],
        }
    }
}

/// Evaluate `query` against the XML in `text`.
pub fn evaluate(text: &str, query: &str, options: XPathOptions) -> Result<XPathOutcome, XPathError> {
    let tree = XmlTree::parse(text).map_err(|e| XPathError::InvalidXml(e.to_string()))?;
    evaluate_tree(&tree, query, options)
}

/// Evaluate `query` against an already parsed tree.
///
/// With `ignore_default_namespace`, unprefixed elements are placed in no
/// namespace so that `//book` matches inside `<catalog xmlns="urn:books">`.
pub fn evaluate_tree(
    tree: &XmlTree,
    query: &str,
    options: XPathOptions,
) -> Result<XPathOutcome, XPathError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(XPathError::Query("the XPath query is empty".to_string()));
    }

    let package = Package::new();
    let document = package.as_document();
    build_document(&document, tree, options);

    let value = evaluate_xpath(&document, query).map_err(|e| XPathError::Query(e.to_string()))?;

    Ok(match value {
        Value::Nodeset(nodes) => {
            XPathOutcome::Nodes(nodes.document_order().into_iter().map(describe).collect())
        }
        Value::Boolean(b) => XPathOutcome::Boolean(b),
        Value::Number(n) => XPathOutcome::Number(n),
        Value::String(s) => XPathOutcome::String(s),
    })
}

fn build_document(document: &Document<'_>, tree: &XmlTree, options: XPathOptions) {
    let root = document.root();
    for node in &tree.children {
        match node {
            XmlNode::Element(element) => {
                root.append_child(build_element(document, element, options));
            }
            XmlNode::Comment(text) => {
                root.append_child(document.create_comment(text));
            }
            XmlNode::ProcessingInstruction { target, value } => {
                root.append_child(document.create_processing_instruction(target, value.as_deref()));
            }
            // the root holds no text
            XmlNode::Text(_) => {}
        }
    }
}

fn build_element<'d>(
    document: &Document<'d>,
    element: &Element,
    options: XPathOptions,
) -> dom::Element<'d> {
    let namespace = match &element.name.prefix {
        None if options.ignore_default_namespace => None,
        _ => element.namespace.as_deref(),
    };
    let built = document.create_element(SxdName::with_namespace_uri(namespace, &element.name.local));
    if let Some(prefix) = &element.name.prefix {
        built.set_preferred_prefix(Some(prefix.as_str()));
    }

    for decl in &element.namespaces {
        match &decl.prefix {
            Some(prefix) => built.register_prefix(prefix, &decl.uri),
            None if !options.ignore_default_namespace => {
                built.set_default_namespace_uri(Some(decl.uri.as_str()))
            }
            None => {}
        }
    }

    for attribute in &element.attributes {
        let name = SxdName::with_namespace_uri(attribute.namespace.as_deref(), &attribute.name.local);
        built.set_attribute_value(name, &attribute.value);
    }

    for child in &element.children {
        match child {
            XmlNode::Element(child) => {
                built.append_child(build_element(document, child, options));
            }
            XmlNode::Text(text) => {
                built.append_child(document.create_text(text));
            }
            XmlNode::Comment(text) => {
                built.append_child(document.create_comment(text));
            }
            XmlNode::ProcessingInstruction { target, value } => {
                built.append_child(document.create_processing_instruction(target, value.as_deref()));
            }
        }
    }
    built
}

fn describe(node: Node<'_>) -> XPathMatch {
    let kind = match node {
        Node::Root(_) => NodeKind::Document,
        Node::Element(_) => NodeKind::Element,
        Node::Attribute(_) => NodeKind::Attribute,
        Node::Text(_) => NodeKind::Text,
        Node::Comment(_) => NodeKind::Comment,
        Node::Namespace(_) => NodeKind::Namespace,
        Node::ProcessingInstruction(_) => NodeKind::ProcessingInstruction,
    };
    XPathMatch {
        kind,
        name: node.expanded_name().map(|q| q.local_part().to_string()),
        value: node.string_value(),
    }
}
