pub mod definition;
pub mod diagnostics;
pub mod hover;

use lsp_types::{Position, Range};

/// A zero-width range at `position`: LSP requires a `Range`, so start and
/// end are the same point.
fn point_range(position: Position) -> Range {
    Range { start: position, end: position }
}
