//! `anchorc-core` — lexer, parser, semantic analyzer, and C backend for
//! the Anchor language.
//!
//! This crate is the compiler's front end and middle end. It has no
//! knowledge of argv, the host C compiler, or JSON-RPC transports — those
//! live in `anchorc-cli` and `anchorc-lsp`. Given a package directory and
//! an entry module path, `compile_package` drives the whole pipeline
//! (lex → parse → collect → resolve imports → resolve types → check
//! bodies, monomorphizing and recording implementation pairs along the
//! way → emit C) and returns either the emitted files or the accumulated
//! diagnostics.

pub mod arena;
pub mod ast;
pub mod codegen;
pub mod errors;
pub mod lexer;
pub mod manifest;
pub mod module_graph;
pub mod parser;
pub mod print;
pub mod sema;
pub mod span;

use std::path::Path;

use arena::Arena;
use errors::Errors;
use module_graph::ModuleGraph;
use sema::analyzer::Analyzer;

/// One generated C file (header or translation unit).
#[derive(Debug, Clone)]
pub struct EmittedFile {
    pub file_name: String,
    pub contents: String,
}

/// The result of compiling a package: either the emitted C files, or
/// nothing if errors were recorded — the backend is never entered when
/// earlier passes produced errors.
pub struct CompileOutcome {
    pub files: Vec<EmittedFile>,
    pub diagnostics: Vec<errors::Diagnostic>,
}

impl CompileOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == errors::Severity::Error)
    }
}

/// Drives the whole pipeline for one package: load the module graph
/// rooted at `entry_module`, run the four-pass analyzer, and (if no
/// errors accumulated) emit C for every module reached.
///
/// The arena is owned by the caller so CLI and LSP callers can choose
/// their own lifetime discipline (one-shot process vs. reset-per-edit).
pub fn compile_package<'a>(
    arena: &'a Arena,
    pkg_name: &str,
    source_dir: &Path,
    entry_module: &str,
) -> CompileOutcome {
    let mut errors = Errors::new();
    let mut graph = ModuleGraph::new(arena, source_dir);
    let entry_id = graph.load(entry_module, &mut errors);

    let mut analyzer = Analyzer::new(arena, &mut graph, &mut errors);
    analyzer.run();

    if errors.has_errors() {
        return CompileOutcome {
            files: Vec::new(),
            diagnostics: errors.into_vec(),
        };
    }

    let mut files = Vec::new();
    if let Some(entry_id) = entry_id {
        let emitter = codegen::Emitter::new(pkg_name, &graph);
        files = emitter.emit_all(entry_id);
    }

    CompileOutcome {
        files,
        diagnostics: errors.into_vec(),
    }
}
