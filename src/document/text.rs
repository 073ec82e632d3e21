//! Text utilities for position conversion and whole-buffer ranges.
//!
//! LSP positions count columns in UTF-16 code units while buffers are stored
//! as UTF-8, so every conversion goes through a [`LineIndex`].

use tower_lsp::lsp_types::{Position, Range};

/// Pre-computed line starts for a buffer snapshot.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset where each line starts.
    line_starts: Vec<usize>,
    source: String,
}

impl LineIndex {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            line_starts,
            source,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Convert a byte offset to an LSP position.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };

        let line_start = self.line_starts[line];
        let col: usize = self.source[line_start..offset]
            .chars()
            .map(char::len_utf16)
            .sum();

        Position::new(line as u32, col as u32)
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// Returns `None` when the line is out of bounds; columns past the end of
    /// a line clamp to the line end.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;
        let line_start = *self.line_starts.get(line)?;
        let line_end = self
            .line_starts
            .get(line + 1)
            .map(|&next| next - 1)
            .unwrap_or(self.source.len());

        let mut utf16_col = 0u32;
        for (i, c) in self.source[line_start..line_end].char_indices() {
            if utf16_col >= position.character {
                return Some(line_start + i);
            }
            utf16_col += c.len_utf16() as u32;
        }

        Some(line_end)
    }

    /// Convert a byte span to an LSP range.
    pub fn span_to_range(&self, span: &std::ops::Range<usize>) -> Range {
        Range::new(
            self.offset_to_position(span.start),
            self.offset_to_position(span.end),
        )
    }

    /// The range covering the whole buffer, used for whole-document edits.
    pub fn full_range(&self) -> Range {
        Range::new(Position::new(0, 0), self.offset_to_position(self.source.len()))
    }
}

/// The range covering all of `text`.
pub fn full_range(text: &str) -> Range {
    LineIndex::new(text).full_range()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_offsets() {
        let idx = LineIndex::new("<a>\n<b/>\n</a>");
        assert_eq!(idx.offset_to_position(0), Position::new(0, 0));
        assert_eq!(idx.offset_to_position(3), Position::new(0, 3));
        assert_eq!(idx.offset_to_position(4), Position::new(1, 0));
        assert_eq!(idx.offset_to_position(9), Position::new(2, 0));
    }

    #[test]
    fn position_to_offset_round_trip() {
        let idx = LineIndex::new("hello\nworld");
        assert_eq!(idx.position_to_offset(Position::new(0, 5)), Some(5));
        assert_eq!(idx.position_to_offset(Position::new(1, 0)), Some(6));
        assert_eq!(idx.position_to_offset(Position::new(1, 99)), Some(11));
        assert_eq!(idx.position_to_offset(Position::new(2, 0)), None);
    }

    #[test]
    fn utf16_columns() {
        // '😀' is 4 bytes in UTF-8 but 2 code units in UTF-16
        let idx = LineIndex::new("<a>😀</a>");
        assert_eq!(idx.offset_to_position(7), Position::new(0, 5));
        assert_eq!(idx.position_to_offset(Position::new(0, 5)), Some(7));
    }

    #[test]
    fn full_range_covers_everything() {
        assert_eq!(
            full_range("<a>\n  <b/>\n</a>"),
            Range::new(Position::new(0, 0), Position::new(2, 4))
        );
        assert_eq!(
            full_range("<a/>\n"),
            Range::new(Position::new(0, 0), Position::new(1, 0))
        );
        assert_eq!(
            full_range(""),
            Range::new(Position::new(0, 0), Position::new(0, 0))
        );
    }
}
