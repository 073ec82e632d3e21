//! XQuery linting and conversion of lint issues to LSP diagnostics.
//!
//! The linter is structural only: it tracks comments, string literals,
//! direct element constructors and bracket nesting, and flags `let`/`for`
//! bindings that are never referenced. It keeps no state between runs.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, DiagnosticTag, NumberOrString};

use crate::document::LineIndex;
use crate::host::DiagnosticsProvider;

static BINDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:let|for)\s+\$([A-Za-z_][\w.\-]*)").expect("binding pattern")
});

static REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][\w.\-]*)").expect("reference pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintIssue {
    pub span: Range<usize>,
    pub severity: LintSeverity,
    pub code: &'static str,
    pub message: String,
}

impl LintIssue {
    fn error(span: Range<usize>, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            span,
            severity: LintSeverity::Error,
            code,
            message: message.into(),
        }
    }
}

/// Lint an XQuery source text.
pub fn lint_xquery(source: &str) -> Vec<LintIssue> {
    let mut issues = Scanner::new(source).run();
    issues.extend(unused_bindings(source));
    issues.sort_by_key(|issue| (issue.span.start, issue.span.end));
    issues
}

/// Convert lint issues to LSP diagnostics.
pub fn to_diagnostics(issues: &[LintIssue], line_index: &LineIndex) -> Vec<Diagnostic> {
    issues
        .iter()
        .map(|issue| {
            let (severity, tags) = match issue.severity {
                LintSeverity::Error => (DiagnosticSeverity::ERROR, None),
                LintSeverity::Warning => (
                    DiagnosticSeverity::WARNING,
                    Some(vec![DiagnosticTag::UNNECESSARY]),
                ),
            };
            Diagnostic {
                range: line_index.span_to_range(&issue.span),
                severity: Some(severity),
                code: Some(NumberOrString::String(issue.code.to_string())),
                code_description: None,
                source: Some("xquery".to_string()),
                message: issue.message.clone(),
                related_information: None,
                tags,
                data: None,
            }
        })
        .collect()
}

/// Lint `source` straight to diagnostics.
pub fn xquery_diagnostics(source: &str) -> Vec<Diagnostic> {
    let line_index = LineIndex::new(source);
    to_diagnostics(&lint_xquery(source), &line_index)
}

/// Lints `xquery` buffers.
#[derive(Debug, Default)]
pub struct XQueryLintProvider;

impl DiagnosticsProvider for XQueryLintProvider {
    fn provide_diagnostics(&self, text: &str) -> Vec<Diagnostic> {
        xquery_diagnostics(text)
    }
}

/// What an open bracket on the stack belongs to.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Bracket { open: u8, at: usize },
    /// Content of a direct element constructor.
    Element { at: usize },
}

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    stack: Vec<Frame>,
    issues: Vec<LintIssue>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            stack: Vec::new(),
            issues: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<LintIssue> {
        while self.pos < self.bytes.len() {
            if matches!(self.stack.last(), Some(Frame::Element { .. })) {
                self.element_content();
            } else {
                self.expression();
            }
        }

        for frame in std::mem::take(&mut self.stack) {
            let issue = match frame {
                Frame::Bracket { open, at } => LintIssue::error(
                    at..at + 1,
                    "unbalanced-delimiter",
                    format!("unclosed '{}'", open as char),
                ),
                Frame::Element { at } => {
                    LintIssue::error(at..at + 1, "unclosed-element", "unclosed element constructor")
                }
            };
            self.issues.push(issue);
        }
        self.issues
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    // byte-wise: `pos` may sit inside a multi-byte character
    fn starts_with(&self, pat: &str) -> bool {
        self.bytes[self.pos..].starts_with(pat.as_bytes())
    }

    /// One step in expression context.
    fn expression(&mut self) {
        let start = self.pos;
        match self.bytes[self.pos] {
            b'(' if self.peek(1) == Some(b':') => self.comment(),
            b'"' | b'\'' => self.string_literal(),
            b'<' if self.starts_element_constructor() => self.start_tag(),
            open @ (b'(' | b'[' | b'{') => {
                self.stack.push(Frame::Bracket { open, at: start });
                self.pos += 1;
            }
            close @ (b')' | b']' | b'}') => {
                self.close_bracket(close, start);
                self.pos += 1;
            }
            _ => self.pos += 1,
        }
    }

    fn close_bracket(&mut self, close: u8, at: usize) {
        let expected = match close {
            b')' => b'(',
            b']' => b'[',
            _ => b'{',
        };
        match self.stack.last() {
            Some(Frame::Bracket { open, .. }) if *open == expected => {
                self.stack.pop();
            }
            Some(Frame::Bracket { open, .. }) => {
                let message = format!(
                    "mismatched '{}', expected '{}'",
                    close as char,
                    closing_for(*open) as char
                );
                self.issues
                    .push(LintIssue::error(at..at + 1, "unbalanced-delimiter", message));
                self.stack.pop();
            }
            _ => self.issues.push(LintIssue::error(
                at..at + 1,
                "unbalanced-delimiter",
                format!("unexpected '{}'", close as char),
            )),
        }
    }

    /// `(: ... :)`, which may nest.
    fn comment(&mut self) {
        let start = self.pos;
        let mut depth = 0usize;
        while self.pos < self.bytes.len() {
            if self.starts_with("(:") {
                depth += 1;
                self.pos += 2;
            } else if self.starts_with(":)") {
                depth -= 1;
                self.pos += 2;
                if depth == 0 {
                    return;
                }
            } else {
                self.pos += 1;
            }
        }
        self.issues.push(LintIssue::error(
            start..start + 2,
            "unterminated-comment",
            "unterminated comment",
        ));
    }

    /// String literal; a doubled quote is an escaped quote.
    fn string_literal(&mut self) {
        let start = self.pos;
        let quote = self.bytes[self.pos];
        self.pos += 1;
        while self.pos < self.bytes.len() {
            if self.bytes[self.pos] == quote {
                if self.peek(1) == Some(quote) {
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                return;
            }
            self.pos += 1;
        }
        self.issues.push(LintIssue::error(
            start..start + 1,
            "unterminated-string",
            "unterminated string literal",
        ));
    }

    /// A `<` starts a direct constructor when followed by a name and placed
    /// where an operand is expected, rather than after one (`$a < $b`).
    fn starts_element_constructor(&self) -> bool {
        let next_is_name = self
            .peek(1)
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_');
        if !next_is_name {
            return false;
        }

        let before = self.src[..self.pos].trim_end();
        match before.bytes().last() {
            None => true,
            Some(b'(' | b'{' | b'[' | b',' | b'=' | b';' | b'>') => true,
            Some(_) => ["return", "then", "else", "satisfies", "in"]
                .iter()
                .any(|kw| ends_with_word(before, kw)),
        }
    }

    /// Scan a start tag. Self-closing tags leave no frame.
    fn start_tag(&mut self) {
        let start = self.pos;
        self.pos += 1;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'"' | b'\'' => self.string_literal(),
                b'/' if self.peek(1) == Some(b'>') => {
                    self.pos += 2;
                    return;
                }
                b'>' => {
                    self.pos += 1;
                    self.stack.push(Frame::Element { at: start });
                    return;
                }
                _ => self.pos += 1,
            }
        }
        self.issues.push(LintIssue::error(
            start..start + 1,
            "unclosed-element",
            "unterminated start tag",
        ));
    }

    /// One step inside element content: only enclosed expressions, nested
    /// constructors and the end tag matter.
    fn element_content(&mut self) {
        if self.starts_with("{{") || self.starts_with("}}") {
            self.pos += 2;
        } else if self.starts_with("<!--") {
            let end = self.src[self.pos..]
                .find("-->")
                .map(|i| self.pos + i + 3)
                .unwrap_or(self.bytes.len());
            self.pos = end;
        } else if self.starts_with("</") {
            let end = self.src[self.pos..]
                .find('>')
                .map(|i| self.pos + i + 1)
                .unwrap_or(self.bytes.len());
            self.pos = end;
            self.stack.pop();
        } else if self.starts_with("<")
            && self
                .peek(1)
                .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        {
            self.start_tag();
        } else if self.bytes[self.pos] == b'{' {
            self.stack.push(Frame::Bracket {
                open: b'{',
                at: self.pos,
            });
            self.pos += 1;
        } else {
            self.pos += 1;
        }
    }
}

fn closing_for(open: u8) -> u8 {
    match open {
        b'(' => b')',
        b'[' => b']',
        _ => b'}',
    }
}

fn ends_with_word(text: &str, word: &str) -> bool {
    text.strip_suffix(word).is_some_and(|rest| {
        !rest
            .chars()
            .last()
            .is_some_and(|c| c.is_alphanumeric() || c == '-' || c == '_')
    })
}

/// `let`/`for` variables that are bound but never referenced.
fn unused_bindings(source: &str) -> Vec<LintIssue> {
    let mut references: HashMap<&str, usize> = HashMap::new();
    for cap in REFERENCE.captures_iter(source) {
        if let Some(name) = cap.get(1) {
            *references.entry(name.as_str()).or_default() += 1;
        }
    }

    BINDING
        .captures_iter(source)
        .filter_map(|cap| cap.get(1))
        .filter(|name| references.get(name.as_str()).copied().unwrap_or(0) <= 1)
        .map(|name| LintIssue {
            // include the '$'
            span: name.start() - 1..name.end(),
            severity: LintSeverity::Warning,
            code: "unused-variable",
            message: format!("variable ${} is declared but never used", name.as_str()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(source: &str) -> Vec<&'static str> {
        lint_xquery(source).iter().map(|i| i.code).collect()
    }

    #[test]
    fn clean_flwor() {
        let source = r#"for $b in doc("books.xml")//book
where $b/price > 30
return <title>{ $b/title/text() }</title>"#;
        assert!(lint_xquery(source).is_empty());
    }

    #[test]
    fn unclosed_paren() {
        let issues = lint_xquery("count((1, 2)");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].span, 5..6);
        assert_eq!(issues[0].message, "unclosed '('");
    }

    #[test]
    fn mismatched_bracket() {
        let issues = lint_xquery("(1, 2]");
        assert_eq!(issues[0].message, "mismatched ']', expected ')'");
    }

    #[test]
    fn unexpected_close() {
        assert_eq!(lint_xquery("1 + 2)")[0].message, "unexpected ')'");
    }

    #[test]
    fn unterminated_comment_and_string() {
        assert_eq!(codes("(: note"), vec!["unterminated-comment"]);
        assert_eq!(codes("\"abc"), vec!["unterminated-string"]);
    }

    #[test]
    fn nested_comments_and_escaped_quotes() {
        assert!(lint_xquery("(: outer (: inner :) still :) 1").is_empty());
        assert!(lint_xquery(r#""say ""hi"" (""#).is_empty());
    }

    #[test]
    fn brackets_inside_strings_and_comments_are_ignored() {
        assert!(lint_xquery(r#"concat("(", '[') (: { :)"#).is_empty());
    }

    #[test]
    fn element_content_text_is_not_code() {
        assert!(lint_xquery("<p>it's (fine</p>").is_empty());
        assert!(lint_xquery("<p a=\"{1}\">{{ literal }} { 1 + 1 }</p>").is_empty());
    }

    #[test]
    fn less_than_is_a_comparison_after_an_operand() {
        assert!(lint_xquery("let $a := 1 return $a < 2").is_empty());
    }

    #[test]
    fn non_ascii_text_is_scanned() {
        assert!(lint_xquery("let $s := \"héllo ✓\" return <p>ünïcode {$s}</p>").is_empty());
    }

    #[test]
    fn unclosed_constructor() {
        assert_eq!(codes("<a><b/>"), vec!["unclosed-element"]);
    }

    #[test]
    fn unused_variable_warning() {
        let issues = lint_xquery("let $x := 1\nlet $y := 2\nreturn $y");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, LintSeverity::Warning);
        assert_eq!(issues[0].span, 4..6);
        assert_eq!(issues[0].message, "variable $x is declared but never used");
    }

    #[test]
    fn diagnostics_carry_positions_and_codes() {
        let diagnostics = xquery_diagnostics("let $a := 1\nreturn ($a");
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.range.start.line, 1);
        assert_eq!(d.range.start.character, 7);
        assert_eq!(d.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(d.source.as_deref(), Some("xquery"));
        assert_eq!(
            d.code,
            Some(NumberOrString::String("unbalanced-delimiter".to_string()))
        );
    }
}
