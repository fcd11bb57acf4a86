//! Module graph: resolves `from <dotted.path> import …` by filesystem
//! lookup, deduped by resolved file path.
//!
//! Loading a module inserts it into the graph *before* recursing into
//! its imports, so an import cycle terminates the second time the graph
//! sees the same resolved path rather than recursing forever. A missing
//! file records an error and returns `None`; the caller keeps going so
//! sibling modules still get diagnosed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::arena::Arena;
use crate::ast::{Node, NodeKind};
use crate::errors::Errors;
use crate::parser::Parser;
use crate::sema::symbol_table::SymbolTable;
use crate::sema::type_registry::{StructType, InterfaceType, Type};
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub usize);

/// A `(struct, interface)` pair discovered during body-checking wherever
/// a `&Struct` satisfied an `&Interface` requirement — drives vtable
/// emission in the backend.
#[derive(Debug, Clone, Copy)]
pub struct ImplPair<'a> {
    pub struct_ty: &'a StructType<'a>,
    pub interface_ty: &'a InterfaceType<'a>,
}

/// What kind of template this instantiation came from — the backend
/// needs this to decide whether to emit a struct typedef or a function
/// body, and methods additionally need their owning struct for mangling.
#[derive(Debug, Clone, Copy)]
pub enum InstantiationKind<'a> {
    Struct,
    Function,
    Method { struct_ty: &'a StructType<'a> },
}

/// One generic instantiation recorded against the module that contains
/// the callsite that demanded it (not the module containing the
/// template).
#[derive(Debug, Clone)]
pub struct Instantiation<'a> {
    pub mangled_name: String,
    pub decl: &'a Node<'a>,
    pub resolved_type: &'a Type<'a>,
    pub kind: InstantiationKind<'a>,
}

pub struct Module<'a> {
    pub id: ModuleId,
    /// Dotted module path, e.g. `util.strings`.
    pub dotted_path: &'a str,
    pub file_path: PathBuf,
    pub ast: &'a Node<'a>,
    pub symbols: RefCell<SymbolTable<'a>>,
    pub impl_pairs: RefCell<Vec<ImplPair<'a>>>,
    pub instantiations: RefCell<Vec<Instantiation<'a>>>,
}

impl<'a> Module<'a> {
    pub fn declarations(&self) -> &[&'a Node<'a>] {
        match &self.ast.kind {
            NodeKind::Program(p) => &p.declarations,
            _ => &[],
        }
    }

    /// Registers `(struct, interface)` if not already present — the
    /// backend's vtable-discovery walk assumes no duplicates.
    pub fn record_impl_pair(&self, struct_ty: &'a StructType<'a>, interface_ty: &'a InterfaceType<'a>) {
        let mut pairs = self.impl_pairs.borrow_mut();
        let already = pairs
            .iter()
            .any(|p| std::ptr::eq(p.struct_ty, struct_ty) && std::ptr::eq(p.interface_ty, interface_ty));
        if !already {
            pairs.push(ImplPair { struct_ty, interface_ty });
        }
    }
}

pub struct ModuleGraph<'a> {
    arena: &'a Arena,
    source_dir: PathBuf,
    modules: Vec<Module<'a>>,
    by_file: HashMap<PathBuf, ModuleId>,
    by_dotted: HashMap<String, ModuleId>,
}

impl<'a> ModuleGraph<'a> {
    pub fn new(arena: &'a Arena, source_dir: &Path) -> Self {
        ModuleGraph {
            arena,
            source_dir: source_dir.to_path_buf(),
            modules: Vec::new(),
            by_file: HashMap::new(),
            by_dotted: HashMap::new(),
        }
    }

    /// Dots become path separators; the module lives at `<dir>/<path
    /// with dots replaced>.anc`.
    pub fn resolve_path(&self, dotted: &str) -> PathBuf {
        let rel = dotted.replace('.', std::path::MAIN_SEPARATOR_STR);
        self.source_dir.join(format!("{rel}.anc"))
    }

    pub fn load(&mut self, dotted: &str, errors: &mut Errors) -> Option<ModuleId> {
        let file_path = self.resolve_path(dotted);
        if let Some(&id) = self.by_file.get(&file_path) {
            return Some(id);
        }

        let src = match std::fs::read_to_string(&file_path) {
            Ok(s) => s,
            Err(_) => {
                errors.error(Span::synthetic(), format!("module '{dotted}' not found"));
                return None;
            }
        };
        self.insert_parsed(dotted, file_path, &src, errors)
    }

    /// Inserts `source` as `dotted`'s module body without touching disk —
    /// used by the editor-protocol server, where the authoritative text is
    /// whatever the client last sent in `didChange`, not what's saved on
    /// disk. Its own imports are still resolved through `load` against the
    /// workspace root, so an open document can reference sibling modules
    /// normally.
    pub fn load_inline(&mut self, dotted: &str, source: &str, errors: &mut Errors) -> ModuleId {
        let file_path = self.resolve_path(dotted);
        if let Some(&id) = self.by_file.get(&file_path) {
            return id;
        }
        self.insert_parsed(dotted, file_path, source, errors)
            .expect("inline insertion always succeeds, there is no file read to fail")
    }

    fn insert_parsed(
        &mut self,
        dotted: &str,
        file_path: PathBuf,
        src: &str,
        errors: &mut Errors,
    ) -> Option<ModuleId> {
        let src_ref: &'a str = self.arena.alloc_str(src);
        let ast = Parser::parse(self.arena, errors, src_ref);

        let id = ModuleId(self.modules.len());
        self.by_file.insert(file_path.clone(), id);
        self.by_dotted.insert(dotted.to_string(), id);
        self.modules.push(Module {
            id,
            dotted_path: self.arena.alloc_str(dotted),
            file_path,
            ast,
            symbols: RefCell::new(SymbolTable::new()),
            impl_pairs: RefCell::new(Vec::new()),
            instantiations: RefCell::new(Vec::new()),
        });

        let import_paths: Vec<&'a str> = match &ast.kind {
            NodeKind::Program(p) => p
                .declarations
                .iter()
                .filter_map(|d| match &d.kind {
                    NodeKind::ImportDecl(imp) => Some(imp.module_path),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        for path in import_paths {
            self.load(path, errors);
        }

        Some(id)
    }

    pub fn get(&self, id: ModuleId) -> &Module<'a> {
        &self.modules[id.0]
    }

    pub fn get_by_dotted(&self, dotted: &str) -> Option<&Module<'a>> {
        self.by_dotted.get(dotted).map(|&id| self.get(id))
    }

    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        (0..self.modules.len()).map(ModuleId)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_module(dir: &Path, dotted: &str, contents: &str) {
        let path = dir.join(format!("{}.anc", dotted.replace('.', std::path::MAIN_SEPARATOR_STR)));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn missing_module_records_error_and_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let arena = Arena::new();
        let mut graph = ModuleGraph::new(&arena, dir.path());
        let mut errors = Errors::new();
        let id = graph.load("nope", &mut errors);
        assert!(id.is_none());
        assert!(errors.has_errors());
    }

    #[test]
    fn transitive_import_is_deduped_to_one_module() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "main", "from util import helper\nfrom other import thing\n");
        write_module(dir.path(), "util", "export func helper(): int return 1 end\n");
        write_module(dir.path(), "other", "from util import helper\nexport func thing(): int return 2 end\n");

        let arena = Arena::new();
        let mut graph = ModuleGraph::new(&arena, dir.path());
        let mut errors = Errors::new();
        graph.load("main", &mut errors);
        assert!(!errors.has_errors());
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn import_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "a", "from b import x\n");
        write_module(dir.path(), "b", "from a import y\n");

        let arena = Arena::new();
        let mut graph = ModuleGraph::new(&arena, dir.path());
        let mut errors = Errors::new();
        let id = graph.load("a", &mut errors);
        assert!(id.is_some());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn load_inline_uses_given_source_not_disk() {
        let dir = tempfile::tempdir().unwrap();
        write_module(dir.path(), "main", "export func stale(): int return 1 end\n");

        let arena = Arena::new();
        let mut graph = ModuleGraph::new(&arena, dir.path());
        let mut errors = Errors::new();
        let id = graph.load_inline("main", "export func fresh(): int return 2 end\n", &mut errors);
        assert!(!errors.has_errors());
        assert_eq!(graph.get(id).symbols.borrow().len(), 0); // not yet collected, just parsed
        assert!(graph.get(id).declarations().iter().any(|d| matches!(
            &d.kind,
            NodeKind::FuncDecl(f) if f.name == "fresh"
        )));
    }
}
