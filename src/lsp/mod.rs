//! LSP protocol feature implementations.
//!
//! This module provides:
//! - XQuery linting and its diagnostics conversion
//! - XQuery completion
//! - The read-only XML tree view

mod completion;
mod diagnostics;
pub mod tree_view;

pub use completion::{completion_at_position, TRIGGER_CHARACTERS};
pub use diagnostics::{lint_xquery, to_diagnostics, xquery_diagnostics, LintIssue, LintSeverity, XQueryLintProvider};
pub use tree_view::XmlTreeContentProvider;
