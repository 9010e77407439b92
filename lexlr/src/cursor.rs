//! Source positions, spans, and the scan cursor used by the tokenizer.

use thiserror::Error;

/// A 0-based line/column position in source text.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// 0-based line number.
    pub line: usize,
    /// 0-based column number (character position in the line).
    pub column: usize,
}

impl Position {
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// A half-open source range: `[start, end)`.
///
/// `Span` marks the region of source text a token covers, or attaches a
/// precise location to a diagnostic.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Restart this span at its current `end` position (empty span at end).
    pub fn collapse(&mut self) {
        self.start = self.end;
    }

    /// Merge with another span by covering both.
    pub fn merge(&self, other: &Span) -> Span {
        let start = if self.start <= other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end >= other.end {
            self.end
        } else {
            other.end
        };
        Span { start, end }
    }

    /// Is this span empty (start == end)?
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the inclusive line range spanned by this `Span`.
    #[inline]
    pub fn line_range(&self) -> (usize, usize) {
        (self.start.line, self.end.line)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} to {}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cursor retreated past the last committed position")]
    UnexpectedRetreat,
}

/// Tracks the current lexical position while scanning.
///
/// `ScanCursor` advances over input characters, updating a [`Span`] and a
/// character offset. Retreating undoes an advance; the lengths of lines
/// crossed since the last [`commit`](Self::commit) are remembered so a
/// retreat over a newline can restore the previous column. The tokenizer
/// commits at each token boundary, which bounds the history to one token.
#[derive(Debug, Clone, Default)]
pub struct ScanCursor {
    /// Characters consumed since the start of the input.
    pub offset: usize,
    /// Span of the token currently being scanned.
    pub span: Span,
    line_history: Vec<usize>,
}

impl ScanCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by consuming `c`, updating span and line history.
    pub fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line_history.push(self.span.end.column);
            self.span.end.line += 1;
            self.span.end.column = 0;
        } else {
            self.span.end.column += 1;
        }
        self.offset += 1;
    }

    /// Retreat by undoing the consumption of `c`.
    pub fn retreat(&mut self, c: char) -> Result<(), CursorError> {
        if c == '\n' {
            if self.span.end.column != 0 || self.span.end.line == 0 {
                return Err(CursorError::UnexpectedRetreat);
            }
            self.span.end.line -= 1;
            self.span.end.column = self
                .line_history
                .pop()
                .ok_or(CursorError::UnexpectedRetreat)?;
        } else {
            if self.span.end.column == 0 {
                return Err(CursorError::UnexpectedRetreat);
            }
            self.span.end.column -= 1;
        }
        self.offset -= 1;
        if self.span.start > self.span.end {
            self.span.start = self.span.end;
        }
        Ok(())
    }

    /// Seal the current token: collapse the span onto its end and drop the
    /// line history, which no retreat may cross again.
    pub fn commit(&mut self) {
        self.span.collapse();
        self.line_history.clear();
    }

    /// The position scanning currently points at.
    pub fn position(&self) -> Position {
        self.span.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut cur = ScanCursor::new();
        for c in "ab\nc".chars() {
            cur.advance(c);
        }
        assert_eq!(cur.offset, 4);
        assert_eq!(cur.position(), Position::new(1, 1));
    }

    #[test]
    fn retreat_restores_column_across_newline() {
        let mut cur = ScanCursor::new();
        for c in "ab\nc".chars() {
            cur.advance(c);
        }
        cur.retreat('c').unwrap();
        cur.retreat('\n').unwrap();
        assert_eq!(cur.position(), Position::new(0, 2));
        assert_eq!(cur.offset, 2);
    }

    #[test]
    fn retreat_past_commit_fails() {
        let mut cur = ScanCursor::new();
        cur.advance('x');
        cur.commit();
        assert_eq!(cur.retreat('x'), Err(CursorError::UnexpectedRetreat));
    }

    #[test]
    fn span_merge_covers_both() {
        let a = Span::new(Position::new(0, 1), Position::new(0, 4));
        let b = Span::new(Position::new(0, 2), Position::new(1, 0));
        let m = a.merge(&b);
        assert_eq!(m.start, Position::new(0, 1));
        assert_eq!(m.end, Position::new(1, 0));
    }

    #[test]
    fn collapse_empties_the_span() {
        let mut s = Span::new(Position::new(2, 0), Position::new(2, 5));
        s.collapse();
        assert!(s.is_empty());
        assert_eq!(s.start, Position::new(2, 5));
    }
}
