//! Minify and pretty-print XML text.
//!
//! Both operations stream events from a `quick_xml::Reader` into a
//! `quick_xml::Writer`, so the document is never materialized. They work on
//! raw text and do not use the document model.

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::document::LineIndex;

#[derive(Debug, Error)]
pub enum FormatError {
    /// Position is 1-based.
    #[error("malformed XML at line {line}, column {column}: {message}")]
    Malformed {
        message: String,
        line: u32,
        column: u32,
    },
    #[error("failed to write XML: {0}")]
    Write(String),
    #[error("formatted output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinifyOptions {
    pub remove_comments: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatOptions {
    pub indent_char: u8,
    pub indent_size: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_char: b' ',
            indent_size: 2,
        }
    }
}

impl FormatOptions {
    /// Indentation from LSP formatting options.
    pub fn from_lsp(options: &tower_lsp::lsp_types::FormattingOptions) -> Self {
        if options.insert_spaces {
            Self {
                indent_char: b' ',
                indent_size: options.tab_size.max(1) as usize,
            }
        } else {
            Self {
                indent_char: b'\t',
                indent_size: 1,
            }
        }
    }
}

/// Remove whitespace-only text between markup, and optionally comments.
///
/// Text with any non-whitespace content is kept verbatim, so mixed content
/// keeps its spacing.
pub fn minify(text: &str, options: MinifyOptions) -> Result<String, FormatError> {
    let writer = Writer::new(Vec::new());
    transform(text, writer, options.remove_comments)
}

/// Re-indent the document using the given indentation.
pub fn format(text: &str, options: FormatOptions) -> Result<String, FormatError> {
    let writer = Writer::new_with_indent(Vec::new(), options.indent_char, options.indent_size);
    transform(text, writer, false)
}

fn transform(
    text: &str,
    mut writer: Writer<Vec<u8>>,
    remove_comments: bool,
) -> Result<String, FormatError> {
    let mut reader = Reader::from_str(text);
    let mut depth = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(text, reader.error_position() as usize, e.to_string()))?;

        match event {
            Event::Eof => break,
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Text(ref t) if t.iter().all(u8::is_ascii_whitespace) => continue,
            Event::Comment(_) if remove_comments => continue,
            _ => {}
        }

        writer
            .write_event(event)
            .map_err(|e| FormatError::Write(e.to_string()))?;
    }

    if depth > 0 {
        return Err(malformed(
            text,
            text.len(),
            format!("{} unclosed element(s) at end of input", depth),
        ));
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

fn malformed(text: &str, offset: usize, message: String) -> FormatError {
    let position = LineIndex::new(text).offset_to_position(offset.min(text.len()));
    FormatError::Malformed {
        message,
        line: position.line + 1,
        column: position.character + 1,
    }
}
