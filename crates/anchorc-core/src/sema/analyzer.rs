//! The four-pass semantic analyzer.
//!
//! Passes run to completion across *every* module before the next pass
//! starts, so forward references — a function mentioning a struct
//! declared later in the same module, or in a module that imports it
//! back — resolve uniformly regardless of declaration order. Each pass
//! logs and continues on error; a missing import or an unresolved type
//! does not stop the analyzer from running later passes over other
//! symbols.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::arena::Arena;
use crate::ast::*;
use crate::errors::Errors;
use crate::module_graph::ModuleGraph;
pub use crate::module_graph::ModuleId;
use crate::sema::symbol_table::{Symbol, SymbolKind};
use crate::sema::type_registry::*;
use crate::span::Span;

pub(crate) type MonoKey = (usize, Vec<String>);

#[derive(Clone, Copy)]
pub(crate) enum MonoCacheEntry<'a> {
    Struct(&'a Type<'a>),
    Func {
        mangled: &'a str,
        func_type: &'a FuncType<'a>,
        decl: &'a Node<'a>,
    },
}

/// Owns everything the four passes share: the type registry (so
/// primitives stay singletons across every module), the diagnostic sink,
/// and the monomorphization cache (so two callsites requesting the same
/// `G[A]` produce exactly one instantiation).
pub struct Analyzer<'a, 'e> {
    pub(crate) arena: &'a Arena,
    pub(crate) graph: &'a ModuleGraph<'a>,
    pub(crate) errors: RefCell<&'e mut Errors>,
    pub(crate) types: TypeRegistry<'a>,
    pub(crate) mono_cache: RefCell<HashMap<MonoKey, MonoCacheEntry<'a>>>,
}

impl<'a, 'e> Analyzer<'a, 'e> {
    pub fn new(arena: &'a Arena, graph: &'a ModuleGraph<'a>, errors: &'e mut Errors) -> Self {
        let types = TypeRegistry::new(arena);
        Analyzer {
            arena,
            graph,
            errors: RefCell::new(errors),
            types,
            mono_cache: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn error(&self, span: Span, message: impl Into<String>) {
        self.errors.borrow_mut().error(span, message);
    }

    pub fn run(&mut self) {
        for id in self.graph.module_ids() {
            self.pass1_collect(id);
        }
        for id in self.graph.module_ids() {
            self.pass2_resolve_imports(id);
        }
        for id in self.graph.module_ids() {
            self.pass3a_resolve_named_types(id);
        }
        for id in self.graph.module_ids() {
            self.pass3b_resolve_function_types(id);
        }
        for id in self.graph.module_ids() {
            self.pass4_check_bodies(id);
        }
    }

    // -- pass 1: collect ---------------------------------------------------

    fn pass1_collect(&self, id: ModuleId) {
        let module = self.graph.get(id);
        for decl in module.declarations() {
            let (kind, name, is_export) = match &decl.kind {
                NodeKind::FuncDecl(f) => (SymbolKind::Func, f.name, f.is_export),
                NodeKind::StructDecl(s) => (SymbolKind::Struct, s.name, s.is_export),
                NodeKind::InterfaceDecl(i) => (SymbolKind::Interface, i.name, false),
                NodeKind::EnumDecl(e) => (SymbolKind::Enum, e.name, e.is_export),
                NodeKind::ConstDecl(c) => (SymbolKind::Const, c.name, c.is_export),
                NodeKind::VarDecl(v) => (SymbolKind::Var, v.name, v.is_export),
                NodeKind::ImportDecl(_) => continue,
                _ => continue,
            };
            let sym = Symbol { kind, name, is_export, node: decl, source: id };
            let inserted = module.symbols.borrow_mut().insert(sym);
            if !inserted {
                self.error(decl.span, format!("duplicate top-level declaration '{name}'"));
            }
        }
    }

    // -- pass 2: import resolution ------------------------------------------

    fn pass2_resolve_imports(&self, id: ModuleId) {
        let module = self.graph.get(id);
        for decl in module.declarations() {
            let NodeKind::ImportDecl(imp) = &decl.kind else { continue };

            let Some(source_module) = self.graph.get_by_dotted(imp.module_path) else {
                self.error(decl.span, format!("module '{}' not found", imp.module_path));
                continue;
            };

            for name in &imp.names {
                let found = source_module
                    .symbols
                    .borrow()
                    .get(name.name)
                    .map(|s| (s.kind, s.is_export, s.node));

                let Some((kind, is_export, node)) = found else {
                    self.error(
                        name.span,
                        format!("module '{}' has no symbol '{}'", imp.module_path, name.name),
                    );
                    continue;
                };
                if !is_export {
                    self.error(
                        name.span,
                        format!("'{}' is not exported from '{}'", name.name, imp.module_path),
                    );
                    continue;
                }
                let shadows_local = module.symbols.borrow().contains(name.name);
                if shadows_local {
                    self.error(name.span, format!("import '{}' shadows a local declaration", name.name));
                    continue;
                }
                let sym = Symbol {
                    kind,
                    name: name.name,
                    is_export: imp.is_export,
                    node,
                    source: source_module.id,
                };
                module.symbols.borrow_mut().insert(sym);
            }
        }
    }

    // -- pass 3a: struct/interface/enum types -------------------------------

    fn pass3a_resolve_named_types(&self, id: ModuleId) {
        let module = self.graph.get(id);
        for decl in module.declarations() {
            match &decl.kind {
                NodeKind::StructDecl(s) if s.type_params.is_empty() => {
                    let st = self.arena.alloc(StructType {
                        name: s.name,
                        module_name: module.dotted_path,
                        decl,
                    });
                    decl.resolved_type.set(Some(self.arena.alloc(Type::Struct(st))));
                    for f in &s.fields {
                        self.resolve_type_expr(id, f.type_node);
                    }
                }
                NodeKind::InterfaceDecl(i) => {
                    let it = self.arena.alloc(InterfaceType {
                        name: i.name,
                        module_name: module.dotted_path,
                        decl,
                    });
                    decl.resolved_type.set(Some(self.arena.alloc(Type::Interface(it))));
                    for sig in &i.method_sigs {
                        let fd = as_func_decl(sig);
                        let params: Vec<&Type> = fd
                            .params
                            .iter()
                            .filter_map(|p| self.resolve_type_expr(id, p.type_node))
                            .collect();
                        let return_type = match fd.return_type {
                            Some(rt) => self.resolve_type_expr(id, rt).unwrap_or(self.types.void),
                            None => self.types.void,
                        };
                        let ft = self.arena.alloc(FuncType { params, return_type });
                        sig.resolved_type.set(Some(self.arena.alloc(Type::Func(ft))));
                    }
                }
                NodeKind::EnumDecl(e) => {
                    let et = self.arena.alloc(EnumType {
                        name: e.name,
                        module_name: module.dotted_path,
                        decl,
                    });
                    decl.resolved_type.set(Some(self.arena.alloc(Type::Enum(et))));
                }
                _ => {}
            }
        }
    }

    // -- pass 3b: non-generic function types --------------------------------

    fn pass3b_resolve_function_types(&self, id: ModuleId) {
        let module = self.graph.get(id);
        for decl in module.declarations() {
            let NodeKind::FuncDecl(f) = &decl.kind else { continue };
            if f.is_generic() {
                continue;
            }
            let params: Vec<&Type> = f
                .params
                .iter()
                .filter_map(|p| self.resolve_type_expr(id, p.type_node))
                .collect();
            let return_type = match f.return_type {
                Some(rt) => self.resolve_type_expr(id, rt).unwrap_or(self.types.void),
                None => self.types.void,
            };
            let ft = self.arena.alloc(FuncType { params, return_type });
            decl.resolved_type.set(Some(self.arena.alloc(Type::Func(ft))));
        }
    }

    // -- pass 4: body checking ----------------------------------------------

    fn pass4_check_bodies(&self, id: ModuleId) {
        let module = self.graph.get(id);
        for decl in module.declarations() {
            match &decl.kind {
                NodeKind::FuncDecl(f) if !f.is_generic() && !f.is_extern => {
                    let Some(Type::Func(ft)) = decl.resolved_type.get() else { continue };
                    self.check_function_body(id, ft, f, None);
                }
                NodeKind::StructDecl(s) if s.type_params.is_empty() => {
                    for method_node in &s.methods {
                        let mf = as_func_decl(method_node);
                        if mf.is_generic() {
                            continue;
                        }
                        if method_node.resolved_type.get().is_none() {
                            let params: Vec<&Type> = mf
                                .params
                                .iter()
                                .filter_map(|p| self.resolve_type_expr(id, p.type_node))
                                .collect();
                            let return_type = match mf.return_type {
                                Some(rt) => self.resolve_type_expr(id, rt).unwrap_or(self.types.void),
                                None => self.types.void,
                            };
                            let ft = self.arena.alloc(FuncType { params, return_type });
                            method_node.resolved_type.set(Some(self.arena.alloc(Type::Func(ft))));
                        }
                        let Some(Type::Func(ft)) = method_node.resolved_type.get() else { continue };
                        let Some(struct_ty) = decl.resolved_type.get() else { continue };
                        let self_type = self.arena.alloc(Type::Ref(struct_ty));
                        self.check_function_body(id, ft, mf, Some(self_type));
                    }
                }
                NodeKind::ConstDecl(c) => {
                    let value_ty = self.check_expr_toplevel(id, c.value);
                    if decl.resolved_type.get().is_none() {
                        if let Some(tn) = c.type_node {
                            self.resolve_type_expr(id, tn);
                        } else if let Some(vt) = value_ty {
                            decl.resolved_type.set(Some(vt));
                        }
                    }
                }
                NodeKind::VarDecl(v) => {
                    let value_ty = v.value.and_then(|val| self.check_expr_toplevel(id, val));
                    if decl.resolved_type.get().is_none() {
                        if let Some(tn) = v.type_node {
                            self.resolve_type_expr(id, tn);
                        } else if let Some(vt) = value_ty {
                            decl.resolved_type.set(Some(vt));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    /// Top-level const/var initializers have no enclosing function, so
    /// they get a throwaway check context with no return type and no
    /// loops.
    fn check_expr_toplevel(&self, module: ModuleId, node: &'a Node<'a>) -> Option<&'a Type<'a>> {
        let mut ctx = super::check::CheckCtx::new(self.types.void, None);
        Some(self.check_expr(module, &mut ctx, node))
    }

    pub(crate) fn check_function_body(
        &self,
        module: ModuleId,
        func_type: &'a FuncType<'a>,
        fd: &'a FuncDecl<'a>,
        self_type: Option<&'a Type<'a>>,
    ) {
        let mut ctx = super::check::CheckCtx::new(func_type.return_type, self_type);
        ctx.push_scope();
        if self_type.is_some() {
            ctx.define("self", self_type.unwrap());
        }
        for (param, ty) in fd.params.iter().zip(func_type.params.iter()) {
            ctx.define(param.name, ty);
        }
        self.check_block(module, &mut ctx, &fd.body);
        ctx.pop_scope();
    }

    // -- type-expression resolution ------------------------------------------

    pub(crate) fn resolve_type_expr(&self, module: ModuleId, node: &'a Node<'a>) -> Option<&'a Type<'a>> {
        if let Some(t) = node.resolved_type.get() {
            return Some(t);
        }
        let NodeKind::TypeExpr(te) = &node.kind else { return None };
        let resolved: Option<&'a Type<'a>> = match te {
            TypeExpr::Simple { name, type_args } => self.resolve_simple_type(module, node.span, name, type_args),
            TypeExpr::Reference { inner } => self
                .resolve_type_expr(module, inner)
                .map(|t| &*self.arena.alloc(Type::Ref(t))),
            TypeExpr::Pointer { inner } => self
                .resolve_type_expr(module, inner)
                .map(|t| &*self.arena.alloc(Type::Ptr(t))),
            TypeExpr::Array { inner, size_expr } => {
                let elem = self.resolve_type_expr(module, inner)?;
                let size = self.eval_const_array_size(size_expr);
                Some(&*self.arena.alloc(Type::Array(elem, size)))
            }
            TypeExpr::Slice { inner } => self
                .resolve_type_expr(module, inner)
                .map(|t| &*self.arena.alloc(Type::Slice(t))),
        };
        if let Some(t) = resolved {
            node.resolved_type.set(Some(t));
        }
        resolved
    }

    fn eval_const_array_size(&self, size_expr: &'a Node<'a>) -> u64 {
        match &size_expr.kind {
            NodeKind::Expr(Expr::IntegerLiteral { text }) => text.parse().unwrap_or(0),
            _ => {
                self.error(size_expr.span, "array size must be an integer literal");
                0
            }
        }
    }

    pub(crate) fn resolve_simple_type(
        &self,
        module: ModuleId,
        span: Span,
        name: &str,
        type_args: &[&'a Node<'a>],
    ) -> Option<&'a Type<'a>> {
        if type_args.is_empty() {
            if let Some(p) = self.types.primitive_by_name(name) {
                return Some(p);
            }
        }

        let found = self
            .graph
            .get(module)
            .symbols
            .borrow()
            .get(name)
            .map(|s| (s.kind, s.node, s.source));

        let Some((kind, decl_node, owner_module)) = found else {
            self.error(span, format!("unknown type '{name}'"));
            return None;
        };

        match kind {
            SymbolKind::Struct => {
                let struct_decl = struct_decl_of(decl_node);
                if struct_decl.type_params.is_empty() {
                    if !type_args.is_empty() {
                        self.error(span, format!("'{name}' is not generic"));
                    }
                    decl_node.resolved_type.get()
                } else {
                    if type_args.len() != struct_decl.type_params.len() {
                        self.error(
                            span,
                            format!(
                                "'{name}' expects {} type argument(s), found {}",
                                struct_decl.type_params.len(),
                                type_args.len()
                            ),
                        );
                        return None;
                    }
                    let args: Option<Vec<&Type>> = type_args
                        .iter()
                        .map(|ta| self.resolve_type_expr(owner_module, ta))
                        .collect();
                    let args = args?;
                    Some(self.monomorphize_struct(owner_module, decl_node, &args, module))
                }
            }
            SymbolKind::Interface => {
                if !type_args.is_empty() {
                    self.error(span, format!("'{name}' is not generic"));
                }
                decl_node.resolved_type.get()
            }
            SymbolKind::Enum => {
                if !type_args.is_empty() {
                    self.error(span, format!("'{name}' is not generic"));
                }
                decl_node.resolved_type.get()
            }
            _ => {
                self.error(span, format!("'{name}' is not a type"));
                None
            }
        }
    }

    /// Resolves a dotted module path back to its `ModuleId`, falling back
    /// to module 0 only for types synthesized before any module finished
    /// loading (should not happen in practice, but keeps this infallible
    /// for callers that already hold a `StructType`/`InterfaceType`).
    pub(crate) fn module_of_dotted(&self, dotted: &str) -> ModuleId {
        self.graph
            .get_by_dotted(dotted)
            .map(|m| m.id)
            .unwrap_or(ModuleId(0))
    }

    /// Records `(struct, interface)` on the module that declares the
    /// interface — that's where the backend looks when emitting vtables
    /// for that interface.
    pub(crate) fn record_impl_pair(&self, struct_ty: &'a StructType<'a>, interface_ty: &'a InterfaceType<'a>) {
        let owner = self.module_of_dotted(interface_ty.module_name);
        self.graph.get(owner).record_impl_pair(struct_ty, interface_ty);
    }
}
