//! Source span representation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A span in source code, represented as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: u32,
    /// End byte offset (exclusive).
    pub end: u32,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Creates an empty span at a position.
    #[must_use]
    #[inline]
    pub const fn empty(pos: u32) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Returns the length of this span in bytes.
    #[must_use]
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Returns true if this span is empty.
    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns a span that covers both spans.
    #[must_use]
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns the source text covered by this span.
    ///
    /// Returns an empty string when the span does not fall on char boundaries.
    #[must_use]
    pub fn text(self, source: &str) -> &str {
        source
            .get(self.start as usize..self.end as usize)
            .unwrap_or_default()
    }
}

impl From<std::ops::Range<u32>> for Span {
    fn from(range: std::ops::Range<u32>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start as usize..span.end as usize
    }
}

/// A 1-based line/column position, as reported in GraphQL error `locations`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// Maps byte offsets of one source text to line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<u32>,
}

impl<'a> LineIndex<'a> {
    /// Indexes the line starts of `source`.
    ///
    /// `\n`, `\r\n` and a lone `\r` all terminate a line.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        let bytes = source.as_bytes();
        let mut line_starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => line_starts.push(offset_u32(i + 1)),
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => line_starts.push(offset_u32(i + 1)),
                _ => {}
            }
            i += 1;
        }
        Self {
            source,
            line_starts,
        }
    }

    /// Returns the number of lines in the source.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Resolves a byte offset. Columns count chars, not bytes.
    #[must_use]
    pub fn location(&self, offset: u32) -> Location {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start as usize..offset as usize)
            .map_or((offset - line_start) as usize, |prefix| prefix.chars().count());

        Location {
            line: offset_u32(line + 1),
            column: offset_u32(column + 1),
        }
    }

    /// Resolves the start of a span.
    #[must_use]
    pub fn span_start(&self, span: Span) -> Location {
        self.location(span.start)
    }
}

fn offset_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_new() {
        let span = Span::new(10, 20);
        assert_eq!(span.start, 10);
        assert_eq!(span.end, 20);
        assert_eq!(span.len(), 10);
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(10, 20);
        let b = Span::new(15, 30);
        let merged = a.merge(b);
        assert_eq!(merged.start, 10);
        assert_eq!(merged.end, 30);
    }

    #[test]
    fn test_span_text() {
        let source = "query { getDinosaur }";
        assert_eq!(Span::new(8, 19).text(source), "getDinosaur");
        assert_eq!(Span::new(8, 99).text(source), "");
    }

    #[test]
    fn test_line_index_first_line() {
        let index = LineIndex::new("{ getDinosaur }");
        assert_eq!(index.location(0), Location { line: 1, column: 1 });
        assert_eq!(index.location(2), Location { line: 1, column: 3 });
    }

    #[test]
    fn test_line_index_multiline() {
        let source = "query {\n  getDinosaur\r\n  x\r}";
        let index = LineIndex::new(source);
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.location(10), Location { line: 2, column: 3 });
        assert_eq!(index.location(25), Location { line: 3, column: 3 });
        assert_eq!(index.location(27), Location { line: 4, column: 1 });
    }

    #[test]
    fn test_line_index_counts_chars() {
        let source = "# dinosaurio ñandú\n{ x }";
        let index = LineIndex::new(source);
        let brace = u32::try_from(source.find('{').unwrap()).unwrap();
        assert_eq!(index.location(brace), Location { line: 2, column: 1 });

        let accent = u32::try_from(source.find('ñ').unwrap()).unwrap();
        assert_eq!(index.location(accent + 2), Location { line: 1, column: 15 });
    }
}
