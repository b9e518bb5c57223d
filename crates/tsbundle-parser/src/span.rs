//! Source location tracking.
//!
//! Every token and import record carries a position in the source code so
//! diagnostics can point at the offending line.

/// A span in the source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset of the start.
    pub start: u32,
    /// Byte offset of the end (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at a position.
    #[inline]
    pub const fn empty(pos: u32) -> Self {
        Self { start: pos, end: pos }
    }
}

/// A human-facing position: 1-based line, 0-based column (in bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc {
    pub line: u32,
    pub column: u32,
}

/// Convert byte offsets to line/column and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    /// Byte offsets of the start of each line.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build a line index from source code.
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// Convert a byte offset to line and column (both 0-indexed).
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = self
            .line_starts
            .binary_search(&offset)
            .unwrap_or_else(|i| i.saturating_sub(1));
        let col = offset - self.line_starts[line];
        (line as u32, col)
    }

    /// Position of a byte offset as a [`Loc`].
    pub fn loc(&self, offset: u32) -> Loc {
        let (line, column) = self.line_col(offset);
        Loc { line: line + 1, column }
    }

    /// The text of the line containing `offset`, without its terminator.
    pub fn line_text<'s>(&self, source: &'s str, offset: u32) -> &'s str {
        let (line, _) = self.line_col(offset);
        let start = self.line_starts[line as usize] as usize;
        let end = self
            .line_starts
            .get(line as usize + 1)
            .map_or(source.len(), |&next| next as usize - 1);
        source
            .get(start..end)
            .unwrap_or("")
            .trim_end_matches('\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index() {
        let source = "line1\nline2\nline3";
        let index = LineIndex::new(source);

        assert_eq!(index.line_col(0), (0, 0));
        assert_eq!(index.line_col(5), (0, 5));
        assert_eq!(index.line_col(6), (1, 0));
        assert_eq!(index.line_col(12), (2, 0));
        assert_eq!(index.line_text(source, 12), "line3");
    }

    #[test]
    fn test_loc_is_one_based_line() {
        let index = LineIndex::new("a\n  b");
        assert_eq!(index.loc(4), Loc { line: 2, column: 2 });
    }

    #[test]
    fn test_line_text() {
        let source = "first\r\nsecond\nthird";
        let index = LineIndex::new(source);
        assert_eq!(index.line_text(source, 2), "first");
        assert_eq!(index.line_text(source, 9), "second");
        assert_eq!(index.line_text(source, 16), "third");
    }
}
