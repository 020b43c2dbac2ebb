use std::{
    cmp,
    fmt,
    ops::{Add, AddAssign},
};

/// A single point in source text. Lines and columns are 1-based; columns
/// count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number, starting at 1.
    pub col:  usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// A source range `(start_line, start_col, end_line, end_col)`.
///
/// The end column is exclusive, so a one-character token on line 1, column 3
/// spans `1:3-1:4`. Spans compose with `+`, which keeps the earliest start and
/// the latest end.
///
/// # Example
/// ```
/// use ecru::util::span::Span;
///
/// let left = Span::new(1, 1, 1, 2);
/// let right = Span::new(1, 5, 2, 3);
///
/// assert_eq!(left + right, Span::new(1, 1, 2, 3));
/// assert_eq!((left + right).to_string(), "Span(1:1-2:3)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start_line: usize,
    pub start_col:  usize,
    pub end_line:   usize,
    pub end_col:    usize,
}

impl Default for Span {
    fn default() -> Self {
        Self::new(1, 1, 1, 1)
    }
}

impl Span {
    #[must_use]
    pub const fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self { start_line,
               start_col,
               end_line,
               end_col }
    }

    /// Builds a span from two positions.
    #[must_use]
    pub const fn between(start: Position, end: Position) -> Self {
        Self::new(start.line, start.col, end.line, end.col)
    }

    #[must_use]
    pub const fn start(&self) -> Position {
        Position::new(self.start_line, self.start_col)
    }

    #[must_use]
    pub const fn end(&self) -> Position {
        Position::new(self.end_line, self.end_col)
    }

    /// The smallest span covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::between(cmp::min(self.start(), other.start()),
                      cmp::max(self.end(), other.end()))
    }
}

impl AddAssign for Span {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl Add for Span {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f,
               "Span({}:{}-{}:{})",
               self.start_line, self.start_col, self.end_line, self.end_col)
    }
}

/// Maps byte offsets of one source text to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    source:      &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let line_starts = std::iter::once(0).chain(source.match_indices('\n')
                                                         .map(|(i, _)| i + 1))
                                            .collect();
        Self { source, line_starts }
    }

    /// Converts a byte offset into a [`Position`].
    ///
    /// Offsets past the end of the text clamp to the end.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let col = self.source
                      .get(line_start..offset)
                      .map_or(offset - line_start, |prefix| prefix.chars().count());
        Position::new(line + 1, col + 1)
    }

    /// Converts a byte range into a [`Span`].
    #[must_use]
    pub fn span(&self, range: std::ops::Range<usize>) -> Span {
        Span::between(self.position(range.start), self.position(range.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_is_min_start_max_end() {
        let a = Span::new(2, 4, 2, 9);
        let b = Span::new(1, 7, 2, 5);
        assert_eq!(a.union(b), Span::new(1, 7, 2, 9));
        assert_eq!(b.union(a), a.union(b));
    }

    #[test]
    fn positions_follow_lines_and_chars() {
        let index = LineIndex::new("ab\nλx\n");
        assert_eq!(index.position(0), Position::new(1, 1));
        assert_eq!(index.position(2), Position::new(1, 3));
        assert_eq!(index.position(3), Position::new(2, 1));
        // `λ` is two bytes but one column.
        assert_eq!(index.position(5), Position::new(2, 2));
        assert_eq!(index.span(3..6), Span::new(2, 1, 2, 3));
    }
}
