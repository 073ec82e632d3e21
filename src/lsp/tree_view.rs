//! Read-only tree rendering of an XML document, served under the `xmltree`
//! URI scheme.

use std::fmt::Write as _;

use tower_lsp::lsp_types::Url;

use crate::document::{DocumentModel, Workspace, XmlNode, XmlTree};
use crate::host::{ContentError, ContentProvider};

pub const SCHEME: &str = "xmltree";

const SOURCE_PARAM: &str = "source";

/// The `xmltree:` URI showing the tree of `source`.
pub fn build_uri(source: &Url) -> Option<Url> {
    let mut uri = Url::parse(&format!("{}://tree{}", SCHEME, source.path())).ok()?;
    uri.query_pairs_mut()
        .append_pair(SOURCE_PARAM, source.as_str());
    Some(uri)
}

/// The document a tree URI was built from.
pub fn source_uri(tree_uri: &Url) -> Option<Url> {
    if tree_uri.scheme() != SCHEME {
        return None;
    }
    tree_uri
        .query_pairs()
        .find(|(key, _)| key == SOURCE_PARAM)
        .and_then(|(_, value)| Url::parse(&value).ok())
}

/// Render the model's tree, refusing stale data from an invalid parse.
pub fn tree_content(model: &DocumentModel) -> Result<String, ContentError> {
    if !model.is_valid_as_of_last_parse() {
        let reason = model
            .last_error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "the document has not been parsed".to_string());
        return Err(ContentError::NotValidXml(reason));
    }
    let tree = model
        .current_tree()
        .ok_or_else(|| ContentError::NotValidXml("the document has not been parsed".to_string()))?;
    Ok(render_tree(&tree))
}

/// One line per node, indented two spaces per level. Whitespace-only text
/// is skipped.
pub fn render_tree(tree: &XmlTree) -> String {
    let mut out = String::new();
    for node in &tree.children {
        render_node(node, 0, &mut out);
    }
    out
}

fn render_node(node: &XmlNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        XmlNode::Element(el) => {
            let _ = write!(out, "{}{}", indent, el.name);
            if !el.attributes.is_empty() {
                let attrs: Vec<String> = el
                    .attributes
                    .iter()
                    .map(|a| format!("{}=\"{}\"", a.name, a.value))
                    .collect();
                let _ = write!(out, " [{}]", attrs.join(", "));
            }
            out.push('\n');
            for child in &el.children {
                render_node(child, depth + 1, out);
            }
        }
        XmlNode::Text(text) => {
            let text = text.trim();
            if !text.is_empty() {
                let _ = writeln!(out, "{}\"{}\"", indent, text);
            }
        }
        XmlNode::Comment(text) => {
            let _ = writeln!(out, "{}<!--{}-->", indent, text);
        }
        XmlNode::ProcessingInstruction { target, value } => {
            let _ = writeln!(out, "{}<?{} {}?>", indent, target, value.as_deref().unwrap_or(""));
        }
    }
}

/// Serves `xmltree:` documents from the workspace's document models.
#[derive(Debug, Default)]
pub struct XmlTreeContentProvider;

impl ContentProvider for XmlTreeContentProvider {
    fn provide_content(&self, uri: &Url, workspace: &Workspace) -> Result<String, ContentError> {
        let source = source_uri(uri).ok_or_else(|| ContentError::BadUri(uri.clone()))?;
        let model = workspace
            .model(&source)
            .ok_or(ContentError::UnknownDocument(source))?;
        tree_content(&model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> Url {
        Url::parse(&format!("file:///work/{}", name)).unwrap()
    }

    #[test]
    fn uri_round_trip() {
        let source = file("my doc.xml");
        let tree_uri = build_uri(&source).unwrap();
        assert_eq!(tree_uri.scheme(), SCHEME);
        assert_eq!(source_uri(&tree_uri), Some(source));
    }

    #[test]
    fn non_tree_uri_has_no_source() {
        assert_eq!(source_uri(&file("a.xml")), None);
    }

    #[test]
    fn renders_nested_structure() {
        let tree = XmlTree::parse(
            "<root id=\"1\">\n  <b>hi</b>\n  <!-- note -->\n  <?pi data?>\n  <c x=\"1\" y=\"2\"/>\n</root>",
        )
        .unwrap();
        let expected = "root [id=\"1\"]\n  b\n    \"hi\"\n  <!-- note -->\n  <?pi data?>\n  c [x=\"1\", y=\"2\"]\n";
        assert_eq!(render_tree(&tree), expected);
    }

    #[test]
    fn provider_reports_invalid_xml() {
        let ws = Workspace::new();
        ws.open(file("a.xml"), "xml", "<a><b></a>".into(), 1);
        let err = XmlTreeContentProvider
            .provide_content(&build_uri(&file("a.xml")).unwrap(), &ws)
            .unwrap_err();
        assert!(matches!(err, ContentError::NotValidXml(_)));
    }

    #[test]
    fn provider_reports_stale_parse_as_invalid() {
        let ws = Workspace::new();
        ws.open(file("a.xml"), "xml", "<a/>".into(), 1);
        ws.change(&file("a.xml"), "<a>".into(), 2);
        let result = XmlTreeContentProvider.provide_content(&build_uri(&file("a.xml")).unwrap(), &ws);
        assert!(matches!(result, Err(ContentError::NotValidXml(_))));
    }

    #[test]
    fn provider_renders_open_document() {
        let ws = Workspace::new();
        ws.open(file("a.xml"), "xml", "<a><b/></a>".into(), 1);
        let content = XmlTreeContentProvider
            .provide_content(&build_uri(&file("a.xml")).unwrap(), &ws)
            .unwrap();
        assert_eq!(content, "a\n  b\n");
    }

    #[test]
    fn provider_reports_unknown_document() {
        let ws = Workspace::new();
        let err = XmlTreeContentProvider
            .provide_content(&build_uri(&file("missing.xml")).unwrap(), &ws)
            .unwrap_err();
        assert!(matches!(err, ContentError::UnknownDocument(_)));
    }
}
