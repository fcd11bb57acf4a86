//! In-memory compilation for tests: no manifest, no disk I/O, no host C
//! compiler invocation — just lexer → parser → module graph → four-pass
//! analyzer → C backend, over a single inline source string.

use anchorc_core::arena::Arena;
use anchorc_core::codegen::Emitter;
use anchorc_core::errors::{Diagnostic, Errors};
use anchorc_core::module_graph::ModuleGraph;
use anchorc_core::sema::analyzer::Analyzer;
use anchorc_core::EmittedFile;

/// Compiles `source` as the package's sole module, named `main`.
/// Returns the emitted C files, or the accumulated diagnostics if any
/// pass recorded an error.
pub fn compile(source: &str) -> Result<Vec<EmittedFile>, Vec<Diagnostic>> {
    compile_module("main", source)
}

/// Same as [`compile`], but lets a test give the module a different
/// dotted path — useful when exercising name mangling against a
/// specific package/module combination.
pub fn compile_module(entry_module: &str, source: &str) -> Result<Vec<EmittedFile>, Vec<Diagnostic>> {
    let arena = Arena::new();
    let mut errors = Errors::new();
    let mut graph = ModuleGraph::new(&arena, std::path::Path::new("."));
    let entry_id = graph.load_inline(entry_module, source, &mut errors);

    let mut analyzer = Analyzer::new(&arena, &graph, &mut errors);
    analyzer.run();

    if errors.has_errors() {
        return Err(errors.into_vec());
    }

    let emitter = Emitter::new("test", &graph);
    Ok(emitter.emit_all(entry_id))
}

/// Runs only lexing, parsing, and semantic analysis; discards the
/// backend. Use when a test only cares whether a program type-checks.
pub fn type_check(source: &str) -> Result<(), Vec<Diagnostic>> {
    let arena = Arena::new();
    let mut errors = Errors::new();
    let mut graph = ModuleGraph::new(&arena, std::path::Path::new("."));
    graph.load_inline("main", source, &mut errors);

    let mut analyzer = Analyzer::new(&arena, &graph, &mut errors);
    analyzer.run();

    if errors.has_errors() {
        Err(errors.into_vec())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn compiles_a_trivial_function() {
        let files = compile(fixtures::simple_program()).unwrap();
        assert!(!files.is_empty());
    }

    #[test]
    fn compiles_a_generic_struct() {
        let files = compile(fixtures::generic_struct_program()).unwrap();
        assert!(!files.is_empty());
    }

    #[test]
    fn compiles_a_struct_satisfying_an_interface() {
        let files = compile(fixtures::struct_satisfying_interface_program()).unwrap();
        assert!(files.iter().any(|f| f.contents.contains("vtable")));
    }

    #[test]
    fn reports_a_type_mismatch() {
        let diagnostics = type_check(fixtures::type_error_program()).unwrap_err();
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn reports_a_syntax_error() {
        let diagnostics = type_check(fixtures::syntax_error_program()).unwrap_err();
        assert!(!diagnostics.is_empty());
    }
}
