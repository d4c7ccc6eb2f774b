//! Source locations.
//!
//! Every token and AST node carries a [`Span`]. Spans hold both the byte range
//! (used when rewriting source text) and a human-facing 1-based line/column
//! (used when reporting).

use std::fmt;

use serde::Serialize;

/// A location in a source file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Byte offset of the first character.
    pub offset: usize,
    /// Length in bytes.
    pub length: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl Span {
    /// Byte offset one past the last character.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    /// Byte range covered by this span.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.end()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets to line/column pairs.
#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    source: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    /// Build a span for the byte range `start..end`.
    ///
    /// Out-of-range offsets are clamped to the end of the source.
    pub fn span(&self, start: usize, end: usize) -> Span {
        let start = start.min(self.source.len());
        let end = end.clamp(start, self.source.len());
        let line_idx = match self.line_starts.binary_search(&start) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0);
        let column = self
            .source
            .get(line_start..start)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(start - line_start)
            + 1;
        Span {
            offset: start,
            length: end - start,
            line: line_idx + 1,
            column,
        }
    }

    /// Span of zero length at the end of the source.
    pub fn eof(&self) -> Span {
        self.span(self.source.len(), self.source.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_columns() {
        let idx = LineIndex::new("actor Buyer");
        let span = idx.span(6, 11);
        assert_eq!(span.line, 1);
        assert_eq!(span.column, 7);
        assert_eq!(span.length, 5);
        assert_eq!(span.end(), 11);
    }

    #[test]
    fn later_lines() {
        let src = "a\nbb\nccc";
        let idx = LineIndex::new(src);
        let span = idx.span(5, 8);
        assert_eq!((span.line, span.column), (3, 1));
        let span = idx.span(3, 4);
        assert_eq!((span.line, span.column), (2, 2));
    }

    #[test]
    fn columns_count_characters() {
        let src = "# é\nx";
        let idx = LineIndex::new(src);
        // "é" is two bytes; the newline sits at byte 4.
        let span = idx.span(4, 4);
        assert_eq!((span.line, span.column), (1, 4));
        let span = idx.span(5, 6);
        assert_eq!((span.line, span.column), (2, 1));
    }

    #[test]
    fn eof_is_clamped() {
        let idx = LineIndex::new("ab");
        let span = idx.span(10, 20);
        assert_eq!(span.offset, 2);
        assert_eq!(span.length, 0);
        assert_eq!(idx.eof(), span);
    }
}
