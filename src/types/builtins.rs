//! XQuery builtin functions, constructors and keywords.

use std::sync::LazyLock;

use super::function::FunctionDef;

/// XQuery keywords offered in bare-identifier position.
pub const KEYWORDS: &[&str] = &[
    "ascending",
    "at",
    "case",
    "declare",
    "default",
    "descending",
    "element",
    "else",
    "every",
    "for",
    "function",
    "if",
    "import",
    "in",
    "instance of",
    "let",
    "module",
    "namespace",
    "order by",
    "return",
    "satisfies",
    "some",
    "switch",
    "then",
    "typeswitch",
    "variable",
    "where",
];

macro_rules! builtin {
    ($prefix:literal, $name:literal, $signature:literal, $description:literal) => {
        FunctionDef {
            prefix: $prefix,
            name: $name,
            signature: $signature,
            description: $description,
        }
    };
}

/// All builtins, lazily initialized, ordered by prefix then name.
pub static BUILTINS: LazyLock<Vec<FunctionDef>> = LazyLock::new(|| {
    let mut defs = vec![
        // ==================== Accessors ====================
        builtin!("fn", "data", "($arg as item()*) as xs:anyAtomicType*", "Atomizes a sequence."),
        builtin!("fn", "name", "($arg as node()?) as xs:string", "Returns the qualified name of a node."),
        builtin!("fn", "local-name", "($arg as node()?) as xs:string", "Returns the local part of a node's name."),
        builtin!("fn", "namespace-uri", "($arg as node()?) as xs:anyURI", "Returns the namespace URI of a node's name."),
        builtin!("fn", "root", "($arg as node()?) as node()?", "Returns the root of the tree containing a node."),
        builtin!("fn", "string", "($arg as item()?) as xs:string", "Returns the string value of an item."),
        builtin!("fn", "number", "($arg as xs:anyAtomicType?) as xs:double", "Converts a value to xs:double."),
        // ==================== Documents ====================
        builtin!("fn", "doc", "($uri as xs:string?) as document-node()?", "Loads a document by URI."),
        builtin!("fn", "doc-available", "($uri as xs:string?) as xs:boolean", "Whether fn:doc would succeed for a URI."),
        builtin!("fn", "collection", "($uri as xs:string?) as node()*", "Returns the nodes of a collection."),
        // ==================== Sequences ====================
        builtin!("fn", "count", "($arg as item()*) as xs:integer", "Returns the number of items in a sequence."),
        builtin!("fn", "empty", "($arg as item()*) as xs:boolean", "True if the sequence is empty."),
        builtin!("fn", "exists", "($arg as item()*) as xs:boolean", "True if the sequence is not empty."),
        builtin!("fn", "distinct-values", "($arg as xs:anyAtomicType*) as xs:anyAtomicType*", "Removes duplicate values."),
        builtin!("fn", "reverse", "($arg as item()*) as item()*", "Reverses a sequence."),
        builtin!("fn", "subsequence", "($seq as item()*, $start as xs:double, $length as xs:double) as item()*", "Returns a contiguous part of a sequence."),
        builtin!("fn", "index-of", "($seq as xs:anyAtomicType*, $search as xs:anyAtomicType) as xs:integer*", "Positions of a value in a sequence."),
        builtin!("fn", "head", "($arg as item()*) as item()?", "The first item of a sequence."),
        builtin!("fn", "tail", "($arg as item()*) as item()*", "All but the first item of a sequence."),
        builtin!("fn", "position", "() as xs:integer", "The context position."),
        builtin!("fn", "last", "() as xs:integer", "The context size."),
        // ==================== Aggregates ====================
        builtin!("fn", "sum", "($arg as xs:anyAtomicType*) as xs:anyAtomicType", "Sum of a sequence of numbers."),
        builtin!("fn", "avg", "($arg as xs:anyAtomicType*) as xs:anyAtomicType?", "Average of a sequence of numbers."),
        builtin!("fn", "min", "($arg as xs:anyAtomicType*) as xs:anyAtomicType?", "Smallest value in a sequence."),
        builtin!("fn", "max", "($arg as xs:anyAtomicType*) as xs:anyAtomicType?", "Largest value in a sequence."),
        // ==================== Strings ====================
        builtin!("fn", "concat", "($arg1 as xs:anyAtomicType?, $arg2 as xs:anyAtomicType?, ...) as xs:string", "Concatenates values as strings."),
        builtin!("fn", "string-join", "($arg1 as xs:string*, $arg2 as xs:string) as xs:string", "Joins strings with a separator."),
        builtin!("fn", "string-length", "($arg as xs:string?) as xs:integer", "Number of characters in a string."),
        builtin!("fn", "substring", "($source as xs:string?, $start as xs:double, $length as xs:double) as xs:string", "Part of a string by position."),
        builtin!("fn", "substring-before", "($arg1 as xs:string?, $arg2 as xs:string?) as xs:string", "Text before the first occurrence of a substring."),
        builtin!("fn", "substring-after", "($arg1 as xs:string?, $arg2 as xs:string?) as xs:string", "Text after the first occurrence of a substring."),
        builtin!("fn", "contains", "($arg1 as xs:string?, $arg2 as xs:string?) as xs:boolean", "Whether a string contains another."),
        builtin!("fn", "starts-with", "($arg1 as xs:string?, $arg2 as xs:string?) as xs:boolean", "Whether a string starts with another."),
        builtin!("fn", "ends-with", "($arg1 as xs:string?, $arg2 as xs:string?) as xs:boolean", "Whether a string ends with another."),
        builtin!("fn", "normalize-space", "($arg as xs:string?) as xs:string", "Collapses whitespace."),
        builtin!("fn", "upper-case", "($arg as xs:string?) as xs:string", "Converts to upper case."),
        builtin!("fn", "lower-case", "($arg as xs:string?) as xs:string", "Converts to lower case."),
        builtin!("fn", "translate", "($arg as xs:string?, $map as xs:string, $trans as xs:string) as xs:string", "Replaces characters."),
        builtin!("fn", "matches", "($input as xs:string?, $pattern as xs:string) as xs:boolean", "Whether a string matches a regular expression."),
        builtin!("fn", "replace", "($input as xs:string?, $pattern as xs:string, $replacement as xs:string) as xs:string", "Replaces regular expression matches."),
        builtin!("fn", "tokenize", "($input as xs:string?, $pattern as xs:string) as xs:string*", "Splits a string on a regular expression."),
        // ==================== Booleans ====================
        builtin!("fn", "true", "() as xs:boolean", "The boolean true."),
        builtin!("fn", "false", "() as xs:boolean", "The boolean false."),
        builtin!("fn", "not", "($arg as item()*) as xs:boolean", "Inverts the effective boolean value."),
        builtin!("fn", "boolean", "($arg as item()*) as xs:boolean", "The effective boolean value."),
        // ==================== Dates ====================
        builtin!("fn", "current-date", "() as xs:date", "The current date."),
        builtin!("fn", "current-dateTime", "() as xs:dateTime", "The current date and time."),
        // ==================== Constructors ====================
        builtin!("xs", "string", "($arg as xs:anyAtomicType?) as xs:string?", "Constructs an xs:string."),
        builtin!("xs", "boolean", "($arg as xs:anyAtomicType?) as xs:boolean?", "Constructs an xs:boolean."),
        builtin!("xs", "integer", "($arg as xs:anyAtomicType?) as xs:integer?", "Constructs an xs:integer."),
        builtin!("xs", "decimal", "($arg as xs:anyAtomicType?) as xs:decimal?", "Constructs an xs:decimal."),
        builtin!("xs", "double", "($arg as xs:anyAtomicType?) as xs:double?", "Constructs an xs:double."),
        builtin!("xs", "date", "($arg as xs:anyAtomicType?) as xs:date?", "Constructs an xs:date."),
        builtin!("xs", "dateTime", "($arg as xs:anyAtomicType?) as xs:dateTime?", "Constructs an xs:dateTime."),
        builtin!("xs", "anyURI", "($arg as xs:anyAtomicType?) as xs:anyURI?", "Constructs an xs:anyURI."),
        // ==================== Math ====================
        builtin!("math", "pi", "() as xs:double", "The constant pi."),
        builtin!("math", "sqrt", "($arg as xs:double?) as xs:double?", "Square root."),
        builtin!("math", "pow", "($x as xs:double?, $y as xs:numeric) as xs:double?", "Raises a number to a power."),
        builtin!("math", "log", "($arg as xs:double?) as xs:double?", "Natural logarithm."),
    ];
    defs.sort_by(|a, b| (a.prefix, a.name).cmp(&(b.prefix, b.name)));
    defs
});

/// Builtins in the namespace bound to `prefix`.
pub fn builtins_for_prefix(prefix: &str) -> impl Iterator<Item = &'static FunctionDef> + '_ {
    BUILTINS.iter().filter(move |def| def.prefix == prefix)
}
