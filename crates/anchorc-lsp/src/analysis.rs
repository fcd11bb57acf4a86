//! One-shot lex → parse → four-pass analyze over a single open document
//!.
//!
//! The server never keeps an AST or a `ModuleGraph` around between
//! requests: every call here builds a fresh arena, drives the whole
//! pipeline, copies out everything a provider needs as owned data, and
//! drops the arena. This trades re-parsing on every keystroke for never
//! having to reason about partially-invalidated analyzer state.

use std::path::Path;

use anchorc_core::arena::Arena;
use anchorc_core::errors::{Errors, Severity};
use anchorc_core::module_graph::ModuleGraph;
use anchorc_core::sema::analyzer::Analyzer;
use anchorc_core::span::Span;

#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub span: Span,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: &'static str,
    pub is_export: bool,
    pub resolved_type: Option<String>,
    pub span: Span,
}

pub struct AnalysisResult {
    pub diagnostics: Vec<DiagnosticInfo>,
    pub symbols: Vec<SymbolInfo>,
}

/// Converts a document's absolute `file_path` under `workspace_root`
/// into the dotted module path `ModuleGraph::resolve_path` expects,
/// inverting the "dots become the platform path separator" rule used
/// for module lookup.
pub fn dotted_module_path(workspace_root: &Path, file_path: &Path) -> Option<String> {
    let rel = file_path.strip_prefix(workspace_root).ok()?;
    let without_ext = rel.with_extension("");
    let mut parts = Vec::new();
    for component in without_ext.components() {
        parts.push(component.as_os_str().to_str()?.to_string());
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}

fn symbol_kind_name(kind: anchorc_core::sema::symbol_table::SymbolKind) -> &'static str {
    use anchorc_core::sema::symbol_table::SymbolKind::*;
    match kind {
        Func => "func",
        Struct => "struct",
        Interface => "interface",
        Enum => "enum",
        Const => "const",
        Var => "var",
        Import => "import",
    }
}

pub fn analyze_document(workspace_root: &Path, dotted: &str, source: &str) -> AnalysisResult {
    let arena = Arena::new();
    let mut errors = Errors::new();
    let mut graph = ModuleGraph::new(&arena, workspace_root);
    let id = graph.load_inline(dotted, source, &mut errors);

    let mut analyzer = Analyzer::new(&arena, &graph, &mut errors);
    analyzer.run();

    let diagnostics = errors
        .iter()
        .map(|d| DiagnosticInfo { span: d.span, severity: d.severity, message: d.message.clone() })
        .collect();

    let module = graph.get(id);
    let symbols = module
        .symbols
        .borrow()
        .iter()
        .map(|sym| SymbolInfo {
            name: sym.name.to_string(),
            kind: symbol_kind_name(sym.kind),
            is_export: sym.is_export,
            resolved_type: sym.node.resolved_type.get().map(|t| t.to_string()),
            span: sym.node.span,
        })
        .collect();

    AnalysisResult { diagnostics, symbols }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_path_round_trips_through_separator() {
        let root = Path::new("/ws");
        let file = Path::new("/ws/util/strings.anc");
        assert_eq!(dotted_module_path(root, file).as_deref(), Some("util.strings"));
    }

    #[test]
    fn analysis_reports_a_type_error() {
        let result = analyze_document(Path::new("."), "main", "var x: int = null\n");
        assert!(result.diagnostics.iter().any(|d| d.severity == Severity::Error));
    }

    #[test]
    fn analysis_collects_top_level_symbols() {
        let result = analyze_document(Path::new("."), "main", "export func add(a: int, b: int): int return a + b end\n");
        let sym = result.symbols.iter().find(|s| s.name == "add").unwrap();
        assert_eq!(sym.kind, "func");
        assert!(sym.is_export);
        assert_eq!(sym.resolved_type.as_deref(), Some("(int, int) -> int"));
    }
}
