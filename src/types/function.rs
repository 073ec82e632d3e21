//! Function definition types for XQuery.
//!
//! `FunctionDef` is documentation only: it feeds completion labels and
//! details. Evaluation happens in whatever engine runs the script.

/// Definition of an XQuery builtin function with documentation.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// Namespace prefix (e.g., "fn")
    pub prefix: &'static str,
    /// Local name (e.g., "count")
    pub name: &'static str,
    /// Function signature (e.g., "($arg as item()*) as xs:integer")
    pub signature: &'static str,
    pub description: &'static str,
}

impl FunctionDef {
    /// `prefix:name`
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.prefix, self.name)
    }
}
