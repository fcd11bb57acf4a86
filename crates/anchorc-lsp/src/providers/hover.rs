//! `textDocument/hover`: the declared type of the symbol
//! under the cursor, looked up by re-analyzing the whole document.

use lsp_types::{Hover, HoverContents, MarkedString, Position, Uri};

use crate::analysis::{analyze_document, dotted_module_path};
use crate::document::Document;
use crate::providers::diagnostics::uri_to_path;
use crate::providers::point_range;

/// Scans outward from `position` to the enclosing run of identifier
/// characters, the same word-boundary walk a plain-text editor uses to
/// decide what "the word under the cursor" means.
pub(crate) fn word_at_position(document: &Document, position: Position) -> Option<String> {
    let lines: Vec<&str> = document.text.lines().collect();
    let line = *lines.get(position.line as usize)?;
    let chars: Vec<char> = line.chars().collect();
    let char_pos = position.character as usize;
    if char_pos >= chars.len() {
        return None;
    }
    if !chars[char_pos].is_alphanumeric() && chars[char_pos] != '_' {
        return None;
    }

    let mut start = char_pos;
    while start > 0 && (chars[start - 1].is_alphanumeric() || chars[start - 1] == '_') {
        start -= 1;
    }
    let mut end = char_pos;
    while end < chars.len() && (chars[end].is_alphanumeric() || chars[end] == '_') {
        end += 1;
    }
    Some(chars[start..end].iter().collect())
}

pub fn provide(workspace_root: &std::path::Path, uri: &Uri, document: &Document, position: Position) -> Option<Hover> {
    let word = word_at_position(document, position)?;

    let dotted = dotted_module_path(workspace_root, &uri_to_path(uri)).unwrap_or_else(|| "main".to_string());
    let result = analyze_document(workspace_root, &dotted, &document.text);

    let symbol = result.symbols.into_iter().find(|s| s.name == word)?;
    let signature = match symbol.resolved_type {
        Some(ty) => format!("{} {}: {}", symbol.kind, symbol.name, ty),
        None => format!("{} {}", symbol.kind, symbol.name),
    };

    Some(Hover {
        contents: HoverContents::Scalar(MarkedString::String(signature)),
        range: Some(point_range(position)),
    })
}
