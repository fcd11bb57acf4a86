//! Package-manifest reading, host C compiler invocation, and temp-dir
//! management — the "driver glue" the core explicitly
//! treats as an external collaborator.

use std::path::{Path, PathBuf};
use std::process::Command;

use anchorc_core::arena::Arena;
use anchorc_core::codegen::Emitter;
use anchorc_core::errors::{Errors, Severity};
use anchorc_core::manifest::Manifest;
use anchorc_core::module_graph::ModuleGraph;
use anchorc_core::sema::analyzer::Analyzer;
use anchorc_core::{print, EmittedFile};
use tracing::{debug, info};

use crate::errors::DriverError;

fn print_diagnostics(errors: &Errors, source_path: &Path) {
    for d in errors.iter() {
        let kind = match d.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Hint => "hint",
        };
        eprintln!("{}:{}: {}: {}", source_path.display(), d.span, kind, d.message);
    }
}

fn write_files(out_dir: &Path, files: &[EmittedFile]) -> Result<(), DriverError> {
    std::fs::create_dir_all(out_dir).map_err(|e| DriverError::CreateOutDir(out_dir.to_path_buf(), e))?;
    for file in files {
        let path = out_dir.join(&file.file_name);
        std::fs::write(&path, &file.contents).map_err(|e| DriverError::WriteFile(path.clone(), e))?;
    }
    Ok(())
}

/// `gcc -std=c99 -o <out_dir>/<name>[.exe] <each .c> 2>&1`, run synchronously with combined output captured.
fn invoke_host_compiler(out_dir: &Path, files: &[EmittedFile], binary_name: &str) -> Result<PathBuf, DriverError> {
    let binary_name = if cfg!(windows) { format!("{binary_name}.exe") } else { binary_name.to_string() };
    let binary_path = out_dir.join(&binary_name);

    let c_files: Vec<PathBuf> = files
        .iter()
        .filter(|f| f.file_name.ends_with(".c"))
        .map(|f| out_dir.join(&f.file_name))
        .collect();

    info!("invoking host C compiler on {} translation unit(s)", c_files.len());
    let output = Command::new("gcc")
        .arg("-std=c99")
        .arg("-o")
        .arg(&binary_path)
        .args(&c_files)
        .output()
        .map_err(|e| DriverError::SpawnHostCompiler("gcc".to_string(), e))?;

    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(DriverError::HostCompilerFailed(output.status, combined));
    }
    Ok(binary_path)
}

/// Shared lex → parse → analyze pipeline used by `build`, `run`, and
/// `compile`; returns the emitted files plus the module graph (so
/// `--dump-symbols` can walk it) and whether errors were recorded.
struct Pipeline<'a> {
    graph: ModuleGraph<'a>,
    entry: Option<anchorc_core::module_graph::ModuleId>,
    errors: Errors,
}

fn analyze<'a>(arena: &'a Arena, source_dir: &Path, entry_module: &str) -> Pipeline<'a> {
    let mut errors = Errors::new();
    let mut graph = ModuleGraph::new(arena, source_dir);
    let entry = graph.load(entry_module, &mut errors);

    debug!("loaded {} module(s)", graph.len());
    let mut analyzer = Analyzer::new(arena, &graph, &mut errors);
    analyzer.run();

    Pipeline { graph, entry, errors }
}

fn dump_symbols(pipeline: &Pipeline, pkg_name: &str) {
    println!("package: {pkg_name}");
    println!("modules: {}", pipeline.graph.len());
    for id in pipeline.graph.module_ids() {
        let module = pipeline.graph.get(id);
        println!("  module {}", module.dotted_path);
        for sym in module.symbols.borrow().iter() {
            let kind = format!("{:?}", sym.kind).to_lowercase();
            let export = if sym.is_export { "export" } else { "local" };
            let resolved = sym.node.resolved_type.get().map(|t| t.to_string()).unwrap_or_else(|| "<unresolved>".to_string());
            if sym.source == id {
                println!("    {kind:<10} {:<16} {export:<7} {resolved}", sym.name);
            } else {
                println!(
                    "    {kind:<10} {:<16} {export:<7} {resolved} (imported from {})",
                    sym.name,
                    pipeline.graph.get(sym.source).dotted_path
                );
            }
        }
    }
}

pub fn build(dir: &Path, dump_symbols_flag: bool) -> Result<(), DriverError> {
    let manifest = Manifest::load(&dir.join("anchor"))?;
    info!(package = %manifest.name, entry = %manifest.entry, "building package");

    let arena = Arena::new();
    let pipeline = analyze(&arena, dir, &manifest.entry);

    if dump_symbols_flag {
        dump_symbols(&pipeline, &manifest.name);
    }

    if pipeline.errors.has_errors() {
        print_diagnostics(&pipeline.errors, dir);
        return Err(DriverError::CompileErrors(pipeline.errors.count()));
    }

    let Some(entry_id) = pipeline.entry else {
        return Err(DriverError::CompileErrors(0));
    };

    let out_dir = dir.join("build");
    let emitter = Emitter::new(&manifest.name, &pipeline.graph);
    let files = emitter.emit_all(entry_id);
    write_files(&out_dir, &files)?;
    invoke_host_compiler(&out_dir, &files, &manifest.name)?;
    Ok(())
}

/// Shared by `run` and `compile` (SPEC_FULL.md supplemented feature 4):
/// both treat a bare file as a one-module package named after its stem,
/// resolving siblings relative to the file's own directory.
fn compile_single_file(file: &Path, out_dir: &Path) -> Result<(Vec<EmittedFile>, PathBuf), DriverError> {
    let source_dir = file.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let entry_module = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("main")
        .to_string();

    let arena = Arena::new();
    let pipeline = analyze(&arena, &source_dir, &entry_module);

    if pipeline.errors.has_errors() {
        print_diagnostics(&pipeline.errors, file);
        return Err(DriverError::CompileErrors(pipeline.errors.count()));
    }
    let Some(entry_id) = pipeline.entry else {
        return Err(DriverError::CompileErrors(0));
    };

    let emitter = Emitter::new(&entry_module, &pipeline.graph);
    let files = emitter.emit_all(entry_id);
    write_files(out_dir, &files)?;
    Ok((files, out_dir.to_path_buf()))
}

/// `ancc compile <file>` (SPEC_FULL.md supplemented feature 4): emit C
/// into `out_dir` and stop, no execution.
pub fn compile(file: &Path, out_dir: &Path) -> Result<(), DriverError> {
    compile_single_file(file, out_dir)?;
    Ok(())
}

/// `ancc run <file>`: compile into a temp directory, invoke the host
/// compiler, then execute the resulting binary.
pub fn run(file: &Path) -> Result<(), DriverError> {
    let temp_dir = tempfile::tempdir().map_err(|e| DriverError::CreateOutDir(PathBuf::from("<temp>"), e))?;
    let entry_module = file.file_stem().and_then(|s| s.to_str()).unwrap_or("main").to_string();
    let (files, out_dir) = compile_single_file(file, temp_dir.path())?;
    let binary_path = invoke_host_compiler(&out_dir, &files, &entry_module)?;

    let status = Command::new(&binary_path)
        .status()
        .map_err(|e| DriverError::RunBinary(binary_path.clone(), e))?;
    if !status.success() {
        std::process::exit(status.code().unwrap_or(1));
    }
    Ok(())
}

pub fn dump_lexer(file: &Path) -> Result<(), DriverError> {
    let src = std::fs::read_to_string(file).map_err(|e| DriverError::ReadSource(file.to_path_buf(), e))?;
    let mut errors = Errors::new();
    let tokens = anchorc_core::lexer::Lexer::tokenize(&src, &mut errors);
    print!("{}", print::print_tokens(&tokens));
    print_diagnostics(&errors, file);
    Ok(())
}

pub fn dump_ast(file: &Path) -> Result<(), DriverError> {
    let src = std::fs::read_to_string(file).map_err(|e| DriverError::ReadSource(file.to_path_buf(), e))?;
    let arena = Arena::new();
    let mut errors = Errors::new();
    let src_ref = arena.alloc_str(&src);
    let ast = anchorc_core::parser::Parser::parse(&arena, &mut errors, src_ref);
    print!("{}", print::print_ast(ast));
    print_diagnostics(&errors, file);
    Ok(())
}
