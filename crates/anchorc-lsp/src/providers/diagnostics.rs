//! `textDocument/publishDiagnostics`.
//!
//! Anchor diagnostics carry a single 1-based line/column, not a span, so
//! every `Diagnostic` we emit is a point range — `start == end` — unlike
//! a typical LSP server that highlights a token's full extent.

use anchorc_core::errors::Severity;
use anchorc_core::span::Span;
use lsp_types::{Diagnostic, DiagnosticSeverity, Position, Uri};

use crate::analysis::{analyze_document, dotted_module_path};
use crate::document::Document;
use crate::providers::point_range;

fn span_to_position(span: &Span) -> Position {
    Position {
        line: span.line.saturating_sub(1) as u32,
        character: span.column.saturating_sub(1) as u32,
    }
}

fn severity_to_lsp(severity: Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Hint => DiagnosticSeverity::HINT,
    }
}

pub fn provide(workspace_root: &std::path::Path, uri: &Uri, document: &Document) -> Vec<Diagnostic> {
    let file_path = uri_to_path(uri);
    let dotted = dotted_module_path(workspace_root, &file_path).unwrap_or_else(|| "main".to_string());
    let result = analyze_document(workspace_root, &dotted, &document.text);

    result
        .diagnostics
        .into_iter()
        .map(|d| Diagnostic {
            range: point_range(span_to_position(&d.span)),
            severity: Some(severity_to_lsp(d.severity)),
            code: None,
            code_description: None,
            source: Some("ancc".to_string()),
            message: d.message,
            related_information: None,
            tags: None,
            data: None,
        })
        .collect()
}

/// `file:///path/to/file` -> `/path/to/file`.
pub(crate) fn uri_to_path(uri: &Uri) -> std::path::PathBuf {
    uri.as_str().strip_prefix("file://").map(std::path::PathBuf::from).unwrap_or_else(|| std::path::PathBuf::from(uri.as_str()))
}
