//! Library-backed services: formatting, XPath evaluation and XQuery execution.

pub mod formatter;
pub mod xpath;
pub mod xquery;

pub use formatter::{format, minify, FormatError, FormatOptions, MinifyOptions};
pub use xpath::{evaluate, evaluate_tree, NodeKind, XPathError, XPathMatch, XPathOptions, XPathOutcome};
pub use xquery::{discover_input_files, execute, find_input_files, ExecutionError, ExecutionOutput, ExecutionRequest};
