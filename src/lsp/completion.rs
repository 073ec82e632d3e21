//! Completion support for XQuery.
//!
//! The context is read from the text just before the cursor: `$name`
//! completes variables seen in the buffer, `prefix:name` completes builtins
//! of that namespace, and anything else completes keywords and `fn`
//! functions by their bare name.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::*;

use crate::document::LineIndex;
use crate::types::{builtins_for_prefix, FunctionDef, KEYWORDS};

/// Characters that trigger completion.
pub const TRIGGER_CHARACTERS: &[&str] = &[":", "$"];

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][\w.\-]*)").expect("variable pattern"));

#[derive(Debug, PartialEq, Eq)]
enum CompletionContext {
    /// After `$`.
    Variable { prefix: String },
    /// After `ns:`.
    Prefixed { namespace: String, prefix: String },
    /// A bare or partial name.
    Identifier { prefix: String },
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.')
}

/// Length in bytes of the trailing run of name characters.
fn trailing_name_len(text: &str) -> usize {
    text.bytes().rev().take_while(|b| is_name_byte(*b)).count()
}

fn detect_context(source: &str, offset: usize) -> Option<CompletionContext> {
    let before = &source[..offset];
    let prefix_len = trailing_name_len(before);
    let prefix = before[before.len() - prefix_len..].to_string();
    let rest = &before[..before.len() - prefix_len];

    match rest.bytes().last() {
        Some(b'$') => Some(CompletionContext::Variable { prefix }),
        Some(b':') => {
            let head = &rest[..rest.len() - 1];
            let ns_len = trailing_name_len(head);
            // `:=` and `::` are operators, not a namespace separator
            if ns_len == 0 {
                return None;
            }
            Some(CompletionContext::Prefixed {
                namespace: head[head.len() - ns_len..].to_string(),
                prefix,
            })
        }
        _ => Some(CompletionContext::Identifier { prefix }),
    }
}

fn matches_prefix(name: &str, prefix: &str) -> bool {
    prefix.is_empty() || name.to_lowercase().starts_with(&prefix.to_lowercase())
}

/// Distinct variable names in `source`, skipping the one being typed at `offset`.
fn variables_in(source: &str, offset: usize) -> BTreeSet<&str> {
    VARIABLE
        .captures_iter(source)
        .filter_map(|cap| cap.get(1))
        .filter(|name| !(name.start() <= offset && offset <= name.end()))
        .map(|name| name.as_str())
        .collect()
}

fn variable_completions(source: &str, offset: usize, prefix: &str) -> Vec<CompletionItem> {
    variables_in(source, offset)
        .into_iter()
        .filter(|name| matches_prefix(name, prefix))
        .map(|name| CompletionItem {
            label: name.to_string(),
            kind: Some(CompletionItemKind::VARIABLE),
            sort_text: Some(format!("0_{}", name)),
            ..Default::default()
        })
        .collect()
}

fn function_item(def: &FunctionDef, sort_group: u8) -> CompletionItem {
    let insert_text = if def.signature.starts_with("()") {
        format!("{}()", def.name)
    } else {
        format!("{}(${{1}})", def.name)
    };
    CompletionItem {
        label: def.name.to_string(),
        kind: Some(CompletionItemKind::FUNCTION),
        detail: Some(format!("{}{}", def.qualified_name(), def.signature)),
        documentation: Some(Documentation::MarkupContent(MarkupContent {
            kind: MarkupKind::Markdown,
            value: def.description.to_string(),
        })),
        insert_text: Some(insert_text),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        sort_text: Some(format!("{}_{}", sort_group, def.name)),
        ..Default::default()
    }
}

fn prefixed_completions(namespace: &str, prefix: &str) -> Vec<CompletionItem> {
    builtins_for_prefix(namespace)
        .filter(|def| matches_prefix(def.name, prefix))
        .map(|def| function_item(def, 0))
        .collect()
}

fn identifier_completions(prefix: &str) -> Vec<CompletionItem> {
    let keywords = KEYWORDS
        .iter()
        .filter(|kw| matches_prefix(kw, prefix))
        .map(|kw| CompletionItem {
            label: kw.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            sort_text: Some(format!("1_{}", kw)),
            ..Default::default()
        });

    let functions = builtins_for_prefix("fn")
        .filter(|def| matches_prefix(def.name, prefix))
        .map(|def| function_item(def, 2));

    keywords.chain(functions).collect()
}

/// Generate completions at a position in an XQuery buffer.
pub fn completion_at_position(
    line_index: &LineIndex,
    position: Position,
) -> Option<CompletionResponse> {
    let source = line_index.source();
    let offset = line_index.position_to_offset(position)?;

    let items = match detect_context(source, offset)? {
        CompletionContext::Variable { prefix } => variable_completions(source, offset, &prefix),
        CompletionContext::Prefixed { namespace, prefix } => {
            prefixed_completions(&namespace, &prefix)
        }
        CompletionContext::Identifier { prefix } => identifier_completions(&prefix),
    };

    if items.is_empty() {
        None
    } else {
        Some(CompletionResponse::Array(items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(source: &str, position: Position) -> Vec<CompletionItem> {
        let line_index = LineIndex::new(source);
        match completion_at_position(&line_index, position) {
            Some(CompletionResponse::Array(items)) => items,
            _ => vec![],
        }
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn detects_contexts() {
        assert_eq!(
            detect_context("let $fo", 7),
            Some(CompletionContext::Variable {
                prefix: "fo".to_string()
            })
        );
        assert_eq!(
            detect_context("fn:co", 5),
            Some(CompletionContext::Prefixed {
                namespace: "fn".to_string(),
                prefix: "co".to_string()
            })
        );
        assert_eq!(detect_context("let $x :", 8), None);
        assert_eq!(
            detect_context("ret", 3),
            Some(CompletionContext::Identifier {
                prefix: "ret".to_string()
            })
        );
    }

    #[test]
    fn dollar_suggests_variables() {
        let source = "let $books := doc('b.xml')\nlet $bound := 1\nreturn $";
        let items = complete(source, Position::new(2, 8));
        assert_eq!(labels(&items), vec!["books", "bound"]);
        assert_eq!(items[0].kind, Some(CompletionItemKind::VARIABLE));
    }

    #[test]
    fn variable_prefix_filters() {
        let source = "let $alpha := 1 let $beta := 2 return $al";
        let items = complete(source, Position::new(0, source.len() as u32));
        assert_eq!(labels(&items), vec!["alpha"]);
    }

    #[test]
    fn namespace_prefix_suggests_builtins() {
        let items = complete("fn:sub", Position::new(0, 6));
        assert_eq!(
            labels(&items),
            vec!["subsequence", "substring", "substring-after", "substring-before"]
        );
        assert_eq!(items[0].insert_text_format, Some(InsertTextFormat::SNIPPET));
    }

    #[test]
    fn math_prefix() {
        let items = complete("math:p", Position::new(0, 6));
        assert_eq!(labels(&items), vec!["pi", "pow"]);
        assert_eq!(items[0].insert_text.as_deref(), Some("pi()"));
        assert_eq!(items[1].insert_text.as_deref(), Some("pow(${1})"));
    }

    #[test]
    fn bare_identifier_suggests_keywords_and_functions() {
        let items = complete("re", Position::new(0, 2));
        let names = labels(&items);
        assert!(names.contains(&"return"));
        assert!(names.contains(&"replace"));
        assert!(names.contains(&"reverse"));
    }

    #[test]
    fn unknown_namespace_has_no_items() {
        assert!(complete("foo:", Position::new(0, 4)).is_empty());
    }
}
