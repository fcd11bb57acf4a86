//! Source positions.
//!
//! Every token and AST node carries a byte offset into the source buffer
//! plus a 1-based line and column, so diagnostics and the editor-protocol
//! server can both report precise locations without re-scanning the file.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize, line: usize, column: usize) -> Self {
        Span {
            offset,
            len,
            line,
            column,
        }
    }

    /// A zero-width span at the start of the file, used for synthesized
    /// nodes (monomorphized declarations) that have no source location of
    /// their own.
    pub fn synthetic() -> Self {
        Span::new(0, 0, 1, 1)
    }

    /// Span covering from the start of `self` through the end of `other`.
    pub fn combine(&self, other: &Span) -> Span {
        Span::new(self.offset, (other.offset + other.len) - self.offset, self.line, self.column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
