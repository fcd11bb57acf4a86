//! `textDocument/definition`: jumps to the declaration of
//! the symbol under the cursor within the same document.
//!
//! Only intra-document definitions are supported — following an import
//! to another file is out of scope for the editor-protocol server.

use lsp_types::{GotoDefinitionResponse, Location, Position, Range, Uri};

use crate::analysis::{analyze_document, dotted_module_path};
use crate::document::Document;
use crate::providers::diagnostics::uri_to_path;
use crate::providers::hover::word_at_position;

pub fn provide(workspace_root: &std::path::Path, uri: &Uri, document: &Document, position: Position) -> Option<GotoDefinitionResponse> {
    let word = word_at_position(document, position)?;

    let dotted = dotted_module_path(workspace_root, &uri_to_path(uri)).unwrap_or_else(|| "main".to_string());
    let result = analyze_document(workspace_root, &dotted, &document.text);

    let symbol = result.symbols.into_iter().find(|s| s.name == word)?;
    let target = Position {
        line: symbol.span.line.saturating_sub(1) as u32,
        character: symbol.span.column.saturating_sub(1) as u32,
    };

    Some(GotoDefinitionResponse::Scalar(Location {
        uri: uri.clone(),
        range: Range { start: target, end: target },
    }))
}
