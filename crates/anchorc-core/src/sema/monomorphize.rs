//! Generic monomorphization.
//!
//! An instantiation is keyed by `(template declaration pointer, concrete
//! type arguments)`. On a cache miss we deep-copy the template AST under
//! a name -> `Type` substitution, insert the instantiation into both the
//! cache and the owning module's declaration *before* resolving field or
//! parameter types, and only then resolve them — so a self-referential
//! generic (`struct Node[T] { next: *Node[T] }`) terminates: the second
//! time resolution asks for `Node[int]` it gets the cache entry, not a
//! fresh walk.

use std::collections::HashMap;

use crate::ast::*;
use crate::module_graph::{Instantiation, InstantiationKind, ModuleId};

use super::analyzer::{Analyzer, MonoCacheEntry, MonoKey};
use super::type_registry::*;

type Subst<'a> = HashMap<&'a str, &'a Type<'a>>;

impl<'a, 'e> Analyzer<'a, 'e> {
    fn mono_key(&self, decl: &'a Node<'a>, args: &[&'a Type<'a>]) -> MonoKey {
        (
            decl as *const Node<'a> as usize,
            args.iter().map(|t| mangle_fragment(t)).collect(),
        )
    }

    fn mangle_generic_name(&self, base: &str, args: &[&'a Type<'a>]) -> String {
        let mut s = base.to_string();
        for a in args {
            s.push_str("__");
            s.push_str(&mangle_fragment(a));
        }
        s
    }

    // -- deep copy under substitution ---------------------------------------

    fn clone_type_node(&self, node: &'a Node<'a>, subst: &Subst<'a>) -> &'a Node<'a> {
        let NodeKind::TypeExpr(te) = &node.kind else {
            unreachable!("clone_type_node called on a non-type node")
        };
        match te {
            TypeExpr::Simple { name, type_args } => {
                if type_args.is_empty() {
                    if let Some(ty) = subst.get(name) {
                        let new_name = self.arena.alloc_str(&mangle_fragment(ty));
                        let new_node = self.arena.alloc(Node::new(
                            node.span,
                            NodeKind::TypeExpr(TypeExpr::Simple { name: new_name, type_args: Vec::new() }),
                        ));
                        new_node.resolved_type.set(Some(*ty));
                        return new_node;
                    }
                }
                let new_args: Vec<&Node> = type_args.iter().map(|a| self.clone_type_node(a, subst)).collect();
                self.arena.alloc(Node::new(
                    node.span,
                    NodeKind::TypeExpr(TypeExpr::Simple { name: *name, type_args: new_args }),
                ))
            }
            TypeExpr::Reference { inner } => {
                let inner = self.clone_type_node(inner, subst);
                self.arena.alloc(Node::new(node.span, NodeKind::TypeExpr(TypeExpr::Reference { inner })))
            }
            TypeExpr::Pointer { inner } => {
                let inner = self.clone_type_node(inner, subst);
                self.arena.alloc(Node::new(node.span, NodeKind::TypeExpr(TypeExpr::Pointer { inner })))
            }
            TypeExpr::Array { inner, size_expr } => {
                let inner = self.clone_type_node(inner, subst);
                let size_expr = self.clone_expr_node(size_expr, subst);
                self.arena.alloc(Node::new(
                    node.span,
                    NodeKind::TypeExpr(TypeExpr::Array { inner, size_expr }),
                ))
            }
            TypeExpr::Slice { inner } => {
                let inner = self.clone_type_node(inner, subst);
                self.arena.alloc(Node::new(node.span, NodeKind::TypeExpr(TypeExpr::Slice { inner })))
            }
        }
    }

    fn clone_expr_node(&self, node: &'a Node<'a>, subst: &Subst<'a>) -> &'a Node<'a> {
        match &node.kind {
            NodeKind::TypeExpr(_) => self.clone_type_node(node, subst),
            NodeKind::Expr(e) => {
                let new_expr = match e {
                    Expr::IntegerLiteral { text } => Expr::IntegerLiteral { text: *text },
                    Expr::FloatLiteral { text } => Expr::FloatLiteral { text: *text },
                    Expr::StringLiteral { text } => Expr::StringLiteral { text: *text },
                    Expr::BoolLiteral { value } => Expr::BoolLiteral { value: *value },
                    Expr::NullLiteral => Expr::NullLiteral,
                    Expr::Identifier { name } => Expr::Identifier { name: *name },
                    Expr::SelfExpr => Expr::SelfExpr,
                    Expr::Binary { op, left, right } => Expr::Binary {
                        op: *op,
                        left: self.clone_expr_node(left, subst),
                        right: self.clone_expr_node(right, subst),
                    },
                    Expr::Unary { op, operand } => {
                        Expr::Unary { op: *op, operand: self.clone_expr_node(operand, subst) }
                    }
                    Expr::Paren { inner } => Expr::Paren { inner: self.clone_expr_node(inner, subst) },
                    Expr::Call { callee, type_args, args } => Expr::Call {
                        callee: self.clone_expr_node(callee, subst),
                        type_args: type_args.iter().map(|t| self.clone_type_node(t, subst)).collect(),
                        args: args.iter().map(|a| self.clone_expr_node(a, subst)).collect(),
                    },
                    Expr::FieldAccess { object, field_name } => {
                        Expr::FieldAccess { object: self.clone_expr_node(object, subst), field_name: *field_name }
                    }
                    Expr::MethodCall { object, method_name, args } => Expr::MethodCall {
                        object: self.clone_expr_node(object, subst),
                        method_name: *method_name,
                        args: args.iter().map(|a| self.clone_expr_node(a, subst)).collect(),
                    },
                    Expr::StructLiteral { struct_name, type_args, fields } => Expr::StructLiteral {
                        struct_name: *struct_name,
                        type_args: type_args.iter().map(|t| self.clone_type_node(t, subst)).collect(),
                        fields: fields
                            .iter()
                            .map(|f| FieldInit { name: f.name, value: self.clone_expr_node(f.value, subst) })
                            .collect(),
                    },
                    Expr::Cast { expr, target_type } => Expr::Cast {
                        expr: self.clone_expr_node(expr, subst),
                        target_type: self.clone_type_node(target_type, subst),
                    },
                    Expr::Sizeof { type_node } => Expr::Sizeof { type_node: self.clone_type_node(type_node, subst) },
                    Expr::ArrayLiteral { elements } => {
                        Expr::ArrayLiteral { elements: elements.iter().map(|e| self.clone_expr_node(e, subst)).collect() }
                    }
                    Expr::Index { object, index } => Expr::Index {
                        object: self.clone_expr_node(object, subst),
                        index: self.clone_expr_node(index, subst),
                    },
                };
                self.arena.alloc(Node::new(node.span, NodeKind::Expr(new_expr)))
            }
            _ => unreachable!("clone_expr_node called on a non-expression node"),
        }
    }

    fn clone_stmt_node(&self, node: &'a Node<'a>, subst: &Subst<'a>) -> &'a Node<'a> {
        match &node.kind {
            NodeKind::Stmt(s) => {
                let new_s = match s {
                    Stmt::Return { value } => Stmt::Return { value: value.map(|v| self.clone_expr_node(v, subst)) },
                    Stmt::If { condition, then_body, elseifs, else_body } => Stmt::If {
                        condition: self.clone_expr_node(condition, subst),
                        then_body: then_body.iter().map(|s| self.clone_stmt_node(s, subst)).collect(),
                        elseifs: elseifs
                            .iter()
                            .map(|e| ElseIfBranch {
                                condition: self.clone_expr_node(e.condition, subst),
                                body: e.body.iter().map(|s| self.clone_stmt_node(s, subst)).collect(),
                            })
                            .collect(),
                        else_body: else_body.iter().map(|s| self.clone_stmt_node(s, subst)).collect(),
                    },
                    Stmt::For { var_name, start, end, step, body } => Stmt::For {
                        var_name: *var_name,
                        start: self.clone_expr_node(start, subst),
                        end: self.clone_expr_node(end, subst),
                        step: step.map(|s| self.clone_expr_node(s, subst)),
                        body: body.iter().map(|s| self.clone_stmt_node(s, subst)).collect(),
                    },
                    Stmt::While { condition, body } => Stmt::While {
                        condition: self.clone_expr_node(condition, subst),
                        body: body.iter().map(|s| self.clone_stmt_node(s, subst)).collect(),
                    },
                    Stmt::Break => Stmt::Break,
                    Stmt::Continue => Stmt::Continue,
                    Stmt::Match { subject, cases, else_body } => Stmt::Match {
                        subject: self.clone_expr_node(subject, subst),
                        cases: cases
                            .iter()
                            .map(|c| MatchCase {
                                values: c.values.iter().map(|v| self.clone_expr_node(v, subst)).collect(),
                                body: c.body.iter().map(|s| self.clone_stmt_node(s, subst)).collect(),
                            })
                            .collect(),
                        else_body: else_body.iter().map(|s| self.clone_stmt_node(s, subst)).collect(),
                    },
                    Stmt::Assign { target, value } => Stmt::Assign {
                        target: self.clone_expr_node(target, subst),
                        value: self.clone_expr_node(value, subst),
                    },
                    Stmt::CompoundAssign { op, target, value } => Stmt::CompoundAssign {
                        op: *op,
                        target: self.clone_expr_node(target, subst),
                        value: self.clone_expr_node(value, subst),
                    },
                    Stmt::ExprStmt { expr } => Stmt::ExprStmt { expr: self.clone_expr_node(expr, subst) },
                };
                self.arena.alloc(Node::new(node.span, NodeKind::Stmt(new_s)))
            }
            // Local `const`/`var` declarations parse directly as statement
            // nodes (see parser::statement::parse_statement), not wrapped
            // in `Stmt`, so they need their own clone arm here too.
            NodeKind::ConstDecl(c) => {
                let new_c = ConstDecl {
                    is_export: c.is_export,
                    name: c.name,
                    type_node: c.type_node.map(|t| self.clone_type_node(t, subst)),
                    value: self.clone_expr_node(c.value, subst),
                };
                self.arena.alloc(Node::new(node.span, NodeKind::ConstDecl(new_c)))
            }
            NodeKind::VarDecl(v) => {
                let new_v = VarDecl {
                    is_export: v.is_export,
                    name: v.name,
                    type_node: v.type_node.map(|t| self.clone_type_node(t, subst)),
                    value: v.value.map(|val| self.clone_expr_node(val, subst)),
                };
                self.arena.alloc(Node::new(node.span, NodeKind::VarDecl(new_v)))
            }
            _ => unreachable!("clone_stmt_node called on an unexpected node kind"),
        }
    }

    /// Clones a function/method declaration. `clear_type_params` is true
    /// only for the template being instantiated directly — a generic
    /// *method* copied as part of cloning its enclosing generic struct
    /// keeps its own (separate) type parameters, since it's monomorphized
    /// again, independently, the first time someone calls it.
    fn clone_func_decl(&self, node: &'a Node<'a>, subst: &Subst<'a>, clear_type_params: bool) -> &'a Node<'a> {
        let f = as_func_decl(node);
        let new_params: Vec<Param> = f
            .params
            .iter()
            .map(|p| Param { name: p.name, type_node: self.clone_type_node(p.type_node, subst), span: p.span })
            .collect();
        let new_return = f.return_type.map(|rt| self.clone_type_node(rt, subst));
        let new_body: Vec<&Node> = f.body.iter().map(|s| self.clone_stmt_node(s, subst)).collect();
        let new_type_params = if clear_type_params { Vec::new() } else { f.type_params.clone() };
        self.arena.alloc(Node::new(
            node.span,
            NodeKind::FuncDecl(FuncDecl {
                is_export: f.is_export,
                is_extern: f.is_extern,
                name: f.name,
                type_params: new_type_params,
                params: new_params,
                return_type: new_return,
                body: new_body,
            }),
        ))
    }

    fn clone_struct_decl(&self, node: &'a Node<'a>, subst: &Subst<'a>) -> &'a Node<'a> {
        let s = struct_decl_of(node);
        let new_fields: Vec<Field> = s
            .fields
            .iter()
            .map(|f| Field { name: f.name, type_node: self.clone_type_node(f.type_node, subst), span: f.span })
            .collect();
        let new_methods: Vec<&Node> = s.methods.iter().map(|m| self.clone_func_decl(m, subst, false)).collect();
        self.arena.alloc(Node::new(
            node.span,
            NodeKind::StructDecl(StructDecl {
                is_export: s.is_export,
                name: s.name,
                type_params: Vec::new(),
                fields: new_fields,
                methods: new_methods,
            }),
        ))
    }

    // -- instantiation --------------------------------------------------------

    /// Monomorphizes a generic struct template. `owner_module` is the
    /// module the template is declared in (fields resolve against its
    /// symbol table); `callsite_module` is the module that demanded this
    /// instantiation and therefore owns the `Instantiation` record.
    pub(crate) fn monomorphize_struct(
        &self,
        owner_module: ModuleId,
        template_decl: &'a Node<'a>,
        args: &[&'a Type<'a>],
        callsite_module: ModuleId,
    ) -> &'a Type<'a> {
        let key = self.mono_key(template_decl, args);
        if let Some(MonoCacheEntry::Struct(t)) = self.mono_cache.borrow().get(&key).copied() {
            return t;
        }

        let struct_decl = struct_decl_of(template_decl);
        let mut subst = Subst::new();
        for (tp, arg) in struct_decl.type_params.iter().zip(args.iter()) {
            subst.insert(tp.name, *arg);
        }

        let mangled = self.mangle_generic_name(struct_decl.name, args);
        let mangled_static: &'a str = self.arena.alloc_str(&mangled);
        let cloned_decl = self.clone_struct_decl(template_decl, &subst);

        let module_name = self.graph.get(owner_module).dotted_path;
        let struct_ty = self.arena.alloc(StructType { name: mangled_static, module_name, decl: cloned_decl });
        let ty: &'a Type<'a> = self.arena.alloc(Type::Struct(struct_ty));
        cloned_decl.resolved_type.set(Some(ty));

        // Inserted before fields resolve: a self-referential field type
        // (`next: *Node[T]`) re-enters this function and hits this entry
        // instead of recursing forever.
        self.mono_cache.borrow_mut().insert(key, MonoCacheEntry::Struct(ty));

        self.graph.get(callsite_module).instantiations.borrow_mut().push(Instantiation {
            mangled_name: mangled,
            decl: cloned_decl,
            resolved_type: ty,
            kind: InstantiationKind::Struct,
        });

        if let NodeKind::StructDecl(cs) = &cloned_decl.kind {
            for f in &cs.fields {
                self.resolve_type_expr(owner_module, f.type_node);
            }
            for m in &cs.methods {
                let mf = as_func_decl(m);
                if mf.is_generic() {
                    continue; // monomorphized lazily the first time it's called
                }
                let params: Vec<&Type> =
                    mf.params.iter().filter_map(|p| self.resolve_type_expr(owner_module, p.type_node)).collect();
                let return_type = match mf.return_type {
                    Some(rt) => self.resolve_type_expr(owner_module, rt).unwrap_or(self.types.void),
                    None => self.types.void,
                };
                let ft = self.arena.alloc(FuncType { params, return_type });
                m.resolved_type.set(Some(self.arena.alloc(Type::Func(ft))));
                let self_ty = self.arena.alloc(Type::Ref(ty));
                self.check_function_body(owner_module, ft, mf, Some(self_ty));
            }
        }

        ty
    }

    /// Monomorphizes a generic top-level function.
    pub(crate) fn monomorphize_function(
        &self,
        owner_module: ModuleId,
        template_decl: &'a Node<'a>,
        args: &[&'a Type<'a>],
        callsite_module: ModuleId,
    ) -> (&'a str, &'a FuncType<'a>, &'a Node<'a>) {
        let key = self.mono_key(template_decl, args);
        if let Some(MonoCacheEntry::Func { mangled, func_type, decl }) = self.mono_cache.borrow().get(&key).copied() {
            return (mangled, func_type, decl);
        }

        let f = as_func_decl(template_decl);
        let mut subst = Subst::new();
        for (tp, arg) in f.type_params.iter().zip(args.iter()) {
            subst.insert(tp.name, *arg);
        }

        let mangled = self.mangle_generic_name(f.name, args);
        let mangled_static: &'a str = self.arena.alloc_str(&mangled);
        let cloned = self.clone_func_decl(template_decl, &subst, true);
        let cf = as_func_decl(cloned);

        let params: Vec<&Type> =
            cf.params.iter().filter_map(|p| self.resolve_type_expr(owner_module, p.type_node)).collect();
        let return_type = match cf.return_type {
            Some(rt) => self.resolve_type_expr(owner_module, rt).unwrap_or(self.types.void),
            None => self.types.void,
        };
        let ft = self.arena.alloc(FuncType { params, return_type });
        cloned.resolved_type.set(Some(self.arena.alloc(Type::Func(ft))));

        self.mono_cache
            .borrow_mut()
            .insert(key, MonoCacheEntry::Func { mangled: mangled_static, func_type: ft, decl: cloned });
        self.graph.get(callsite_module).instantiations.borrow_mut().push(Instantiation {
            mangled_name: mangled,
            decl: cloned,
            resolved_type: cloned.resolved_type.get().unwrap(),
            kind: InstantiationKind::Function,
        });

        self.check_function_body(owner_module, ft, cf, None);
        (mangled_static, ft, cloned)
    }

    /// Monomorphizes a generic method of an already-resolved (possibly
    /// itself monomorphized) struct.
    pub(crate) fn monomorphize_method(
        &self,
        struct_ty: &'a StructType<'a>,
        method_template: &'a Node<'a>,
        args: &[&'a Type<'a>],
        callsite_module: ModuleId,
    ) -> (&'a str, &'a FuncType<'a>, &'a Node<'a>) {
        let key = self.mono_key(method_template, args);
        if let Some(MonoCacheEntry::Func { mangled, func_type, decl }) = self.mono_cache.borrow().get(&key).copied() {
            return (mangled, func_type, decl);
        }

        let owner_module = self.module_of_dotted(struct_ty.module_name);
        let mf = as_func_decl(method_template);
        let mut subst = Subst::new();
        for (tp, arg) in mf.type_params.iter().zip(args.iter()) {
            subst.insert(tp.name, *arg);
        }

        let mangled = format!("{}__{}", struct_ty.name, self.mangle_generic_name(mf.name, args));
        let mangled_static: &'a str = self.arena.alloc_str(&mangled);
        let cloned = self.clone_func_decl(method_template, &subst, true);
        let cf = as_func_decl(cloned);

        let params: Vec<&Type> =
            cf.params.iter().filter_map(|p| self.resolve_type_expr(owner_module, p.type_node)).collect();
        let return_type = match cf.return_type {
            Some(rt) => self.resolve_type_expr(owner_module, rt).unwrap_or(self.types.void),
            None => self.types.void,
        };
        let ft = self.arena.alloc(FuncType { params, return_type });
        cloned.resolved_type.set(Some(self.arena.alloc(Type::Func(ft))));

        self.mono_cache
            .borrow_mut()
            .insert(key, MonoCacheEntry::Func { mangled: mangled_static, func_type: ft, decl: cloned });
        self.graph.get(callsite_module).instantiations.borrow_mut().push(Instantiation {
            mangled_name: mangled,
            decl: cloned,
            resolved_type: cloned.resolved_type.get().unwrap(),
            kind: InstantiationKind::Method { struct_ty },
        });

        let self_ty = self.arena.alloc(Type::Ref(self.arena.alloc(Type::Struct(struct_ty))));
        self.check_function_body(owner_module, ft, cf, Some(self_ty));
        (mangled_static, ft, cloned)
    }
}
