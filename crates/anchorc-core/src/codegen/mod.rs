//! C backend: per-module header + translation-unit
//! emission, name mangling, interface vtables, and the entry wrapper.
//!
//! [`Emitter`] drives the whole pass: it walks every module reachable
//! from the package entry point (the module graph is already fully
//! resolved by the analyzer before this runs — the backend is never
//! entered if any errors accumulated during earlier passes) and, per
//! module, produces one header and one translation unit. [`Cg`] is the
//! per-module lowering context the `expr`/`stmt` submodules extend with
//! `impl` blocks: a `builder.rs`-equivalent owning the state, with
//! expression and statement lowering as sibling `impl` blocks over it.

pub mod expr;
pub mod header;
pub mod mangle;
pub mod stmt;
pub mod types;
pub mod vtables;
pub mod writer;

use std::cell::RefCell;
use std::collections::HashSet;

use crate::ast::{ElseIfBranch, Expr, FuncDecl, MatchCase, Node, NodeKind, Stmt, TypeExpr};
use crate::module_graph::{InstantiationKind, Module, ModuleGraph, ModuleId};
use crate::sema::type_registry::{as_func_decl, Type};

use types::TypeLowerer;
use writer::Writer;

/// Registers every slice/array element type reachable from `node` (and
/// its children) with `types`, without emitting anything. Mirrors
/// `print::write_node`'s traversal shape but collects instead of
/// printing — used to pre-scan a whole declaration (signature *and*
/// body) for `{ptr, len}` typedefs before any C text referencing them is
/// written, so a private function returning a slice type never gets its
/// body emitted ahead of that slice's typedef.
fn collect_slices_in_node<'a>(types: &TypeLowerer, node: &'a Node<'a>) {
    if let Some(ty) = node.resolved_type.get() {
        types.collect_slices(ty);
    }
    match &node.kind {
        NodeKind::Program(p) => {
            for d in &p.declarations {
                collect_slices_in_node(types, d);
            }
        }
        NodeKind::ImportDecl(_) => {}
        NodeKind::ConstDecl(c) => {
            if let Some(t) = c.type_node {
                collect_slices_in_node(types, t);
            }
            collect_slices_in_node(types, c.value);
        }
        NodeKind::VarDecl(v) => {
            if let Some(t) = v.type_node {
                collect_slices_in_node(types, t);
            }
            if let Some(value) = v.value {
                collect_slices_in_node(types, value);
            }
        }
        NodeKind::FuncDecl(f) => {
            for p in &f.params {
                collect_slices_in_node(types, p.type_node);
            }
            if let Some(rt) = f.return_type {
                collect_slices_in_node(types, rt);
            }
            for s in &f.body {
                collect_slices_in_node(types, s);
            }
        }
        NodeKind::StructDecl(s) => {
            for field in &s.fields {
                collect_slices_in_node(types, field.type_node);
            }
            for m in &s.methods {
                collect_slices_in_node(types, m);
            }
        }
        NodeKind::InterfaceDecl(i) => {
            for sig in &i.method_sigs {
                collect_slices_in_node(types, sig);
            }
        }
        NodeKind::EnumDecl(_) => {}
        NodeKind::Stmt(s) => collect_slices_in_stmt(types, s),
        NodeKind::Expr(e) => collect_slices_in_expr(types, e),
        NodeKind::TypeExpr(te) => collect_slices_in_type_expr(types, te),
    }
}

fn collect_slices_in_stmt<'a>(types: &TypeLowerer, stmt: &'a Stmt<'a>) {
    match stmt {
        Stmt::Return { value } => {
            if let Some(v) = value {
                collect_slices_in_node(types, v);
            }
        }
        Stmt::If { condition, then_body, elseifs, else_body } => {
            collect_slices_in_node(types, condition);
            for s in then_body {
                collect_slices_in_node(types, s);
            }
            for ElseIfBranch { condition, body } in elseifs {
                collect_slices_in_node(types, condition);
                for s in body {
                    collect_slices_in_node(types, s);
                }
            }
            for s in else_body {
                collect_slices_in_node(types, s);
            }
        }
        Stmt::For { start, end, step, body, .. } => {
            collect_slices_in_node(types, start);
            collect_slices_in_node(types, end);
            if let Some(step) = step {
                collect_slices_in_node(types, step);
            }
            for s in body {
                collect_slices_in_node(types, s);
            }
        }
        Stmt::While { condition, body } => {
            collect_slices_in_node(types, condition);
            for s in body {
                collect_slices_in_node(types, s);
            }
        }
        Stmt::Break | Stmt::Continue => {}
        Stmt::Match { subject, cases, else_body } => {
            collect_slices_in_node(types, subject);
            for MatchCase { values, body } in cases {
                for v in values {
                    collect_slices_in_node(types, v);
                }
                for s in body {
                    collect_slices_in_node(types, s);
                }
            }
            for s in else_body {
                collect_slices_in_node(types, s);
            }
        }
        Stmt::Assign { target, value } | Stmt::CompoundAssign { target, value, .. } => {
            collect_slices_in_node(types, target);
            collect_slices_in_node(types, value);
        }
        Stmt::ExprStmt { expr } => collect_slices_in_node(types, expr),
    }
}

fn collect_slices_in_expr<'a>(types: &TypeLowerer, expr: &'a Expr<'a>) {
    match expr {
        Expr::IntegerLiteral { .. }
        | Expr::FloatLiteral { .. }
        | Expr::StringLiteral { .. }
        | Expr::BoolLiteral { .. }
        | Expr::NullLiteral
        | Expr::Identifier { .. }
        | Expr::SelfExpr => {}
        Expr::Binary { left, right, .. } => {
            collect_slices_in_node(types, left);
            collect_slices_in_node(types, right);
        }
        Expr::Unary { operand, .. } => collect_slices_in_node(types, operand),
        Expr::Paren { inner } => collect_slices_in_node(types, inner),
        Expr::Call { callee, type_args, args } => {
            collect_slices_in_node(types, callee);
            for t in type_args {
                collect_slices_in_node(types, t);
            }
            for a in args {
                collect_slices_in_node(types, a);
            }
        }
        Expr::FieldAccess { object, .. } => collect_slices_in_node(types, object),
        Expr::MethodCall { object, args, .. } => {
            collect_slices_in_node(types, object);
            for a in args {
                collect_slices_in_node(types, a);
            }
        }
        Expr::StructLiteral { type_args, fields, .. } => {
            for t in type_args {
                collect_slices_in_node(types, t);
            }
            for f in fields {
                collect_slices_in_node(types, f.value);
            }
        }
        Expr::Cast { expr, target_type } => {
            collect_slices_in_node(types, expr);
            collect_slices_in_node(types, target_type);
        }
        Expr::Sizeof { type_node } => collect_slices_in_node(types, type_node),
        Expr::ArrayLiteral { elements } => {
            for e in elements {
                collect_slices_in_node(types, e);
            }
        }
        Expr::Index { object, index } => {
            collect_slices_in_node(types, object);
            collect_slices_in_node(types, index);
        }
    }
}

fn collect_slices_in_type_expr<'a>(types: &TypeLowerer, te: &'a TypeExpr<'a>) {
    match te {
        TypeExpr::Simple { type_args, .. } => {
            for t in type_args {
                collect_slices_in_node(types, t);
            }
        }
        TypeExpr::Reference { inner } | TypeExpr::Pointer { inner } | TypeExpr::Slice { inner } => {
            collect_slices_in_node(types, inner);
        }
        TypeExpr::Array { inner, size_expr } => {
            collect_slices_in_node(types, inner);
            collect_slices_in_node(types, size_expr);
        }
    }
}

/// Per-module lowering state shared by `expr.rs`/`stmt.rs`'s `impl Cg`
/// blocks: the package name (mangling prefix), the module being
/// emitted, the whole resolved graph (so cross-module references can be
/// mangled under the *defining* module's prefix), the type lowerer (it
/// accumulates the slice typedefs this module's bodies need), a local
/// scope stack (so identifier lowering can tell a local from a
/// module-level name without re-running the analyzer's scope tracking),
/// and a counter for synthesized temporaries (`match`'s subject copy).
pub(crate) struct Cg<'e, 'a> {
    pkg: &'e str,
    module: ModuleId,
    graph: &'e ModuleGraph<'a>,
    types: &'e TypeLowerer<'e>,
    locals: RefCell<Vec<HashSet<&'a str>>>,
    temp_counter: RefCell<u32>,
}

impl<'e, 'a> Cg<'e, 'a> {
    fn new(pkg: &'e str, module: ModuleId, graph: &'e ModuleGraph<'a>, types: &'e TypeLowerer<'e>) -> Self {
        Cg {
            pkg,
            module,
            graph,
            types,
            locals: RefCell::new(Vec::new()),
            temp_counter: RefCell::new(0),
        }
    }

    pub(crate) fn push_scope(&self) {
        self.locals.borrow_mut().push(HashSet::new());
    }

    pub(crate) fn pop_scope(&self) {
        self.locals.borrow_mut().pop();
    }

    pub(crate) fn declare_local(&self, name: &'a str) {
        if let Some(scope) = self.locals.borrow_mut().last_mut() {
            scope.insert(name);
        }
    }

    pub(crate) fn is_local(&self, name: &str) -> bool {
        self.locals.borrow().iter().rev().any(|scope| scope.contains(name))
    }

    pub(crate) fn next_temp(&self, prefix: &str) -> String {
        let mut n = self.temp_counter.borrow_mut();
        let id = *n;
        *n += 1;
        format!("{prefix}_{id}")
    }

    /// Resolves a monomorphization's raw `base__arg1__arg2…` name (left
    /// on `Node::mangled` by the checker during generic instantiation)
    /// into the full mangled C symbol. The instantiation is emitted once per
    /// calling module, so it is always mangled
    /// under *this* module's prefix and defined `static` in this
    /// module's translation unit — two modules calling the same
    /// `G[int]` each get their own private specialization rather than
    /// fighting over one external symbol.
    pub(crate) fn resolve_instantiation_symbol(&self, raw: &str) -> String {
        let module_dotted = self.graph.get(self.module).dotted_path;
        mangle::mangle_symbol(self.pkg, module_dotted, raw)
    }
}

/// One generated file pair's worth of C source (matches `EmittedFile` in
/// `lib.rs`; kept separate here so the backend doesn't depend on the
/// crate root).
pub struct EmittedUnit {
    pub header_name: String,
    pub header: String,
    pub unit_name: String,
    pub unit: String,
}

pub struct Emitter<'e, 'a> {
    pkg: &'e str,
    graph: &'e ModuleGraph<'a>,
}

impl<'e, 'a> Emitter<'e, 'a> {
    pub fn new(pkg: &'e str, graph: &'e ModuleGraph<'a>) -> Self {
        Emitter { pkg, graph }
    }

    /// Emits every module reachable from `entry`, plus the `main`
    /// wrapper in the entry module. The
    /// module graph was already loaded transitively by
    /// `ModuleGraph::load`, so "every module in the graph" and "every
    /// module reachable from `entry`" coincide; we still emit in graph
    /// order (declaration order of discovery) for deterministic output.
    pub fn emit_all(&self, entry: ModuleId) -> Vec<crate::EmittedFile> {
        let mut files = Vec::new();
        for id in self.graph.module_ids() {
            let unit = self.emit_module(id, id == entry);
            files.push(crate::EmittedFile { file_name: unit.header_name, contents: unit.header });
            files.push(crate::EmittedFile { file_name: unit.unit_name, contents: unit.unit });
        }
        files
    }

    fn emit_module(&self, id: ModuleId, is_entry: bool) -> EmittedUnit {
        let module = self.graph.get(id);
        let types = TypeLowerer::new(self.pkg);

        let header = header::emit_header(self.pkg, module, &types);
        let unit = self.emit_translation_unit(id, module, &types, is_entry);

        EmittedUnit {
            header_name: mangle::header_file_name(self.pkg, module.dotted_path),
            header,
            unit_name: mangle::unit_file_name(self.pkg, module.dotted_path),
            unit,
        }
    }

    fn emit_translation_unit(&self, id: ModuleId, module: &Module<'a>, types: &TypeLowerer, is_entry: bool) -> String {
        let mut w = Writer::new();
        w.writeln(&format!("#include \"{}\"", mangle::header_file_name(self.pkg, module.dotted_path)));
        for imported in self.imported_modules(module) {
            w.writeln(&format!("#include \"{}\"", mangle::header_file_name(self.pkg, imported)));
        }
        w.blank();

        // Non-exported struct/enum typedefs: exported ones are already
        // in the header, so only emit what it omitted.
        for decl in module.declarations() {
            match &decl.kind {
                NodeKind::StructDecl(s) if !s.is_export && !s.is_generic() => {
                    header::emit_private_struct_typedef(module.dotted_path, types, &mut w, s);
                }
                NodeKind::EnumDecl(e) if !e.is_export => {
                    header::emit_private_enum_typedef(module, types, &mut w, e);
                }
                _ => {}
            }
        }

        // Interface vtable/ref typedefs, one per interface with at least
        // one implementation pair recorded against this module, plus the
        // wrapper functions and static vtable instances themselves.
        let interfaces = vtables::owning_interfaces(module);
        for iface in &interfaces {
            vtables::write_interface_typedefs(self.pkg, types, &mut w, iface);
        }
        for pair in module.impl_pairs.borrow().iter() {
            vtables::write_impl_pair(self.pkg, types, &mut w, pair);
        }
        if !interfaces.is_empty() {
            w.blank();
        }

        // Pre-scan every declaration's signature *and* body, plus every
        // generic instantiation demanded by this module's callsites, for
        // slice/array element types before any body is emitted: a
        // private function whose return type or a local variable is
        // slice-typed otherwise has its body text (and the `{ptr, len}`
        // typedef it names) emitted in the wrong order.
        for decl in module.declarations() {
            collect_slices_in_node(types, decl);
        }
        for inst in module.instantiations.borrow().iter() {
            collect_slices_in_node(types, inst.decl);
        }
        types.write_needed_slice_typedefs(&mut w);

        // Static forward declarations for every module-private function,
        // method, and generic instantiation, ahead of any body: a
        // private function called before its lexical definition, or two
        // mutually-recursive private functions, would otherwise trip a
        // C99 implicit-declaration error.
        self.emit_forward_declarations(module, types, &mut w);

        for decl in module.declarations() {
            match &decl.kind {
                NodeKind::ConstDecl(c) if !c.is_export => self.emit_const(id, types, &mut w, decl, c.name, c.value, false),
                NodeKind::ConstDecl(c) => self.emit_const(id, types, &mut w, decl, c.name, c.value, true),
                NodeKind::VarDecl(v) => self.emit_var(id, types, &mut w, decl, v, v.is_export),
                NodeKind::FuncDecl(f) if !f.is_generic() && !f.is_extern => {
                    self.emit_func(id, types, &mut w, module, f, f.is_export)
                }
                NodeKind::StructDecl(s) if s.type_params.is_empty() => {
                    for method in &s.methods {
                        let mf = as_func_decl(method);
                        if mf.is_generic() {
                            continue;
                        }
                        self.emit_method(id, types, &mut w, module, s.name, mf);
                    }
                }
                _ => {}
            }
        }

        self.emit_instantiations(id, module, types, &mut w);

        if is_entry {
            self.emit_main_wrapper(module, &mut w);
        }

        w.into_string()
    }

    /// Writes a `static` prototype for every non-exported, non-generic,
    /// non-extern function and method, plus every generic function/method
    /// instantiation this module's callsites demanded, in the same order
    /// their bodies are emitted later — so the prototypes precede every
    /// body that might call back into an as-yet-undefined sibling.
    fn emit_forward_declarations(&self, module: &Module<'a>, types: &TypeLowerer, w: &mut Writer) {
        for decl in module.declarations() {
            match &decl.kind {
                NodeKind::FuncDecl(f) if !f.is_generic() && !f.is_extern && !f.is_export => {
                    let mangled = mangle::mangle_symbol(self.pkg, module.dotted_path, f.name);
                    let return_ty = f
                        .return_type
                        .map(|r| r.resolved_type.get().expect("return type resolved by the analyzer"))
                        .unwrap_or(&types::VOID);
                    header::emit_static_prototype(types, w, None, &mangled, f, return_ty);
                }
                NodeKind::StructDecl(s) if s.type_params.is_empty() => {
                    for method in &s.methods {
                        let mf = as_func_decl(method);
                        if mf.is_generic() {
                            continue;
                        }
                        let mangled = types.mangle_method_name(module.dotted_path, s.name, mf.name);
                        let struct_c = types.struct_type_name(module.dotted_path, s.name);
                        let return_ty = mf
                            .return_type
                            .map(|r| r.resolved_type.get().expect("return type resolved by the analyzer"))
                            .unwrap_or(&types::VOID);
                        header::emit_static_prototype(types, w, Some(&struct_c), &mangled, mf, return_ty);
                    }
                }
                _ => {}
            }
        }
        for inst in module.instantiations.borrow().iter() {
            match inst.kind {
                InstantiationKind::Struct => {}
                InstantiationKind::Function => {
                    let fd = as_func_decl(inst.decl);
                    let mangled = mangle::mangle_symbol(self.pkg, module.dotted_path, &inst.mangled_name);
                    let return_ty = fd
                        .return_type
                        .map(|r| r.resolved_type.get().expect("return type resolved by the analyzer"))
                        .unwrap_or(&types::VOID);
                    header::emit_static_prototype(types, w, None, &mangled, fd, return_ty);
                }
                InstantiationKind::Method { struct_ty } => {
                    let fd = as_func_decl(inst.decl);
                    let mangled = mangle::mangle_symbol(self.pkg, module.dotted_path, &inst.mangled_name);
                    let struct_c = types.c_type(&Type::Struct(struct_ty));
                    let return_ty = fd
                        .return_type
                        .map(|r| r.resolved_type.get().expect("return type resolved by the analyzer"))
                        .unwrap_or(&types::VOID);
                    header::emit_static_prototype(types, w, Some(&struct_c), &mangled, fd, return_ty);
                }
            }
        }
        w.blank();
    }

    fn imported_modules(&self, module: &Module<'a>) -> Vec<&'a str> {
        let mut seen = Vec::new();
        for decl in module.declarations() {
            if let NodeKind::ImportDecl(imp) = &decl.kind {
                if !seen.contains(&imp.module_path) {
                    seen.push(imp.module_path);
                }
            }
        }
        seen
    }

    fn emit_const(
        &self,
        id: ModuleId,
        types: &TypeLowerer,
        w: &mut Writer,
        decl: &crate::ast::Node<'a>,
        name: &'a str,
        value: &'a crate::ast::Node<'a>,
        exported: bool,
    ) {
        let ty = decl.resolved_type.get().expect("const decl resolved by the analyzer");
        let cg = Cg::new(self.pkg, id, self.graph, types);
        let text = cg.lower_expr(value);
        let coerced = cg.coerce(ty, value.resolved_type.get().unwrap(), &text);
        let mangled = mangle::mangle_symbol(self.pkg, self.graph.get(id).dotted_path, name);
        let qualifier = if exported { "" } else { "static " };
        w.writeln(&format!("{qualifier}const {} {mangled} = {coerced};", types.c_type(ty)));
    }

    fn emit_var(&self, id: ModuleId, types: &TypeLowerer, w: &mut Writer, decl: &crate::ast::Node<'a>, v: &crate::ast::VarDecl<'a>, exported: bool) {
        let ty = decl.resolved_type.get().expect("var decl resolved by the analyzer");
        let mangled = mangle::mangle_symbol(self.pkg, self.graph.get(id).dotted_path, v.name);
        let qualifier = if exported { "" } else { "static " };
        match v.value {
            Some(value) => {
                let cg = Cg::new(self.pkg, id, self.graph, types);
                let text = cg.lower_expr(value);
                let coerced = cg.coerce(ty, value.resolved_type.get().unwrap(), &text);
                w.writeln(&format!("{qualifier}{} {mangled} = {coerced};", types.c_type(ty)));
            }
            None => w.writeln(&format!("{qualifier}{} {mangled} = {{0}};", types.c_type(ty))),
        }
    }

    fn emit_func(&self, id: ModuleId, types: &TypeLowerer, w: &mut Writer, module: &Module<'a>, f: &'a FuncDecl<'a>, exported: bool) {
        let mangled = mangle::mangle_symbol(self.pkg, module.dotted_path, f.name);
        self.emit_func_body(id, types, w, None, &mangled, f, exported);
    }

    fn emit_method(&self, id: ModuleId, types: &TypeLowerer, w: &mut Writer, module: &Module<'a>, struct_name: &str, mf: &'a FuncDecl<'a>) {
        let mangled = types.mangle_method_name(module.dotted_path, struct_name, mf.name);
        let struct_c = types.struct_type_name(module.dotted_path, struct_name);
        self.emit_func_body(id, types, w, Some(struct_c), &mangled, mf, false);
    }

    fn emit_func_body(
        &self,
        id: ModuleId,
        types: &TypeLowerer,
        w: &mut Writer,
        self_struct_c: Option<String>,
        mangled: &str,
        f: &'a FuncDecl<'a>,
        exported: bool,
    ) {
        let return_ty = f
            .return_type
            .map(|r| r.resolved_type.get().expect("return type resolved by the analyzer"))
            .unwrap_or(&types::VOID);

        let mut params: Vec<String> = Vec::new();
        if let Some(struct_c) = &self_struct_c {
            params.push(format!("{struct_c}* self"));
        }
        for p in &f.params {
            let ty = p.type_node.resolved_type.get().expect("param type resolved by the analyzer");
            params.push(format!("{} {}", types.c_type(ty), p.name));
        }
        let params_text = if params.is_empty() { "void".to_string() } else { params.join(", ") };
        let qualifier = if exported { "" } else { "static " };
        w.writeln(&format!("{qualifier}{} {mangled}({params_text}) {{", types.c_type(return_ty)));
        w.indent();

        let cg = Cg::new(self.pkg, id, self.graph, types);
        cg.push_scope();
        if self_struct_c.is_some() {
            cg.declare_local("self");
        }
        for p in &f.params {
            cg.declare_local(p.name);
        }
        cg.lower_block(w, &f.body);
        cg.pop_scope();

        w.dedent();
        w.writeln("}");
        w.blank();
    }

    /// Emits every generic instantiation this module's callsites
    /// demanded: struct instantiations need nothing
    /// beyond their typedef (already covered by `header`/`c_type`
    /// producing it on demand via the resolved `Type::Struct`), function
    /// and method instantiations need their specialized body emitted
    /// exactly once, `static` to this translation unit.
    fn emit_instantiations(&self, id: ModuleId, module: &Module<'a>, types: &TypeLowerer, w: &mut Writer) {
        for inst in module.instantiations.borrow().iter() {
            match inst.kind {
                InstantiationKind::Struct => {
                    if let Type::Struct(struct_ty) = *inst.resolved_type {
                        header::emit_private_struct_typedef_from_decl(types, w, struct_ty);
                    }
                }
                InstantiationKind::Function => {
                    let fd = as_func_decl(inst.decl);
                    let mangled = mangle::mangle_symbol(self.pkg, module.dotted_path, &inst.mangled_name);
                    self.emit_func_body(id, types, w, None, &mangled, fd, false);
                }
                InstantiationKind::Method { struct_ty } => {
                    let fd = as_func_decl(inst.decl);
                    let mangled = mangle::mangle_symbol(self.pkg, module.dotted_path, &inst.mangled_name);
                    let struct_c = types.c_type(&Type::Struct(struct_ty));
                    self.emit_func_body(id, types, w, Some(struct_c), &mangled, fd, false);
                }
            }
        }
    }

    /// `int main(void)` that calls the user's mangled `main`. If user `main` returns an integer type the
    /// wrapper forwards its value; otherwise it calls it for effect and
    /// returns 0.
    fn emit_main_wrapper(&self, module: &Module<'a>, w: &mut Writer) {
        let Some(sym) = module.symbols.borrow().get("main").map(|s| (s.node, s.kind)) else {
            return;
        };
        let (decl_node, kind) = sym;
        if !matches!(kind, crate::sema::symbol_table::SymbolKind::Func) {
            return;
        }
        let mangled = mangle::mangle_symbol(self.pkg, module.dotted_path, "main");
        let returns_int = matches!(decl_node.resolved_type.get(), Some(Type::Func(ft)) if ft.return_type.is_integer());
        w.writeln("int main(void) {");
        w.indent();
        if returns_int {
            w.writeln(&format!("return (int){mangled}();"));
        } else {
            w.writeln(&format!("{mangled}();"));
            w.writeln("return 0;");
        }
        w.dedent();
        w.writeln("}");
    }
}
