//! XQuery builtin function definitions.
//!
//! This module provides:
//! - `FunctionDef`, documentation for one builtin
//! - Builtin tables for the `fn`, `xs` and `math` namespaces, plus keywords

mod builtins;
mod function;

pub use builtins::{builtins_for_prefix, BUILTINS, KEYWORDS};
pub use function::FunctionDef;
