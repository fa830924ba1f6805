//! Positions of Rain tokens and syntax nodes.
//!
//! The lexer stamps every token with a [`Span`]; the parser joins token
//! spans into node spans, and errors report the line and column of the
//! node that failed. Nodes built by macros or by the compiler itself carry
//! [`Span::synthetic`] and report no position.

/// Where a token or node sits in its source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// First byte.
    pub start: usize,
    /// One past the last byte.
    pub end: usize,
    /// Line of the first byte, counting from 1.
    pub line: u32,
    /// Column of the first byte, counting from 1.
    pub column: u32,
}

impl Span {
    /// Span of `start..end` whose first byte is at `line`:`column`.
    #[must_use]
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Empty span before the first character of a file.
    #[must_use]
    pub const fn file_start() -> Self {
        Self::new(0, 0, 1, 1)
    }

    /// Span for nodes that no source text produced.
    ///
    /// Line 0 never occurs in a real file.
    #[must_use]
    pub const fn synthetic() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// True for spans no source text produced.
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.line == 0
    }

    /// Span from the start of `self` through the end of `last`, keeping the
    /// position of `self`. A `last` that ends earlier never shrinks it.
    #[must_use]
    pub fn through(self, last: Self) -> Self {
        Self {
            end: last.end.max(self.end),
            ..self
        }
    }

    /// The whole source line holding the first byte, without its newline.
    /// Offsets past the end of `source` select the last line.
    #[must_use]
    pub fn line_of<'a>(&self, source: &'a str) -> &'a str {
        let start = self.start.min(source.len());
        let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[start..]
            .find('\n')
            .map_or(source.len(), |i| start + i);
        &source[line_start..line_end]
    }
}
