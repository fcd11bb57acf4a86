//! Body checking: the guts of pass 4.
//!
//! `CheckCtx` is a throwaway scope stack built fresh for each function
//! (or top-level initializer) being checked; nothing about it survives
//! past one call to `check_function_body`. Implicit conversions, lvalue
//! rules, generic call dispatch, and interface-satisfaction discovery all
//! live here rather than in `analyzer.rs` so that file stays about
//! collection/resolution order, not expression semantics.

use std::collections::HashMap;

use crate::ast::*;
use crate::module_graph::ModuleId;
use crate::span::Span;

use super::analyzer::Analyzer;
use super::type_registry::*;

struct Binding<'a> {
    ty: &'a Type<'a>,
    is_const: bool,
}

/// One function body's worth of scope tracking. Two separate counters
/// gate `break` and `continue`: `break_depth`
/// advances for `for`/`while` *and* `match`, since `break` may target
/// either; `loop_depth` advances only for `for`/`while`, since `continue`
/// written directly inside a `match` arm with no enclosing real loop is
/// rejected exactly like at top level.
pub(crate) struct CheckCtx<'a> {
    return_type: &'a Type<'a>,
    self_type: Option<&'a Type<'a>>,
    scopes: Vec<HashMap<&'a str, Binding<'a>>>,
    loop_depth: u32,
    break_depth: u32,
}

impl<'a> CheckCtx<'a> {
    pub(crate) fn new(return_type: &'a Type<'a>, self_type: Option<&'a Type<'a>>) -> Self {
        CheckCtx {
            return_type,
            self_type,
            scopes: Vec::new(),
            loop_depth: 0,
            break_depth: 0,
        }
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub(crate) fn define(&mut self, name: &'a str, ty: &'a Type<'a>) {
        self.define_with_const(name, ty, false);
    }

    fn define_with_const(&mut self, name: &'a str, ty: &'a Type<'a>, is_const: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, Binding { ty, is_const });
        }
    }

    fn lookup(&self, name: &str) -> Option<(&'a Type<'a>, bool)> {
        for scope in self.scopes.iter().rev() {
            if let Some(b) = scope.get(name) {
                return Some((b.ty, b.is_const));
            }
        }
        None
    }
}

impl<'a, 'e> Analyzer<'a, 'e> {
    // -- statements -----------------------------------------------------------

    pub(crate) fn check_block(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, body: &[&'a Node<'a>]) {
        ctx.push_scope();
        for stmt in body {
            self.check_stmt(module, ctx, stmt);
        }
        ctx.pop_scope();
    }

    fn check_stmt(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, node: &'a Node<'a>) {
        match &node.kind {
            NodeKind::ConstDecl(c) => {
                let value_ty = self.check_expr(module, ctx, c.value);
                let ty = match c.type_node {
                    Some(tn) => self.resolve_type_expr(module, tn).unwrap_or(value_ty),
                    None => value_ty,
                };
                if c.type_node.is_some() && !self.is_assignable_expr(ty, c.value, value_ty) {
                    self.error(
                        node.span,
                        format!("cannot initialize '{}' of type '{ty}' with value of type '{value_ty}'", c.name),
                    );
                }
                node.resolved_type.set(Some(ty));
                ctx.define_with_const(c.name, ty, true);
            }
            NodeKind::VarDecl(v) => {
                let value_ty = v.value.map(|val| self.check_expr(module, ctx, val));
                let ty = match (v.type_node, value_ty) {
                    (Some(tn), _) => self.resolve_type_expr(module, tn).unwrap_or(self.types.void),
                    (None, Some(vt)) => vt,
                    (None, None) => self.types.void,
                };
                if let (Some(_), Some(val), Some(vt)) = (v.type_node, v.value, value_ty) {
                    if !self.is_assignable_expr(ty, val, vt) {
                        self.error(
                            node.span,
                            format!("cannot initialize '{}' of type '{ty}' with value of type '{vt}'", v.name),
                        );
                    }
                }
                node.resolved_type.set(Some(ty));
                ctx.define_with_const(v.name, ty, false);
            }
            NodeKind::Stmt(s) => self.check_stmt_kind(module, ctx, node.span, s),
            _ => unreachable!("check_stmt called on a non-statement node"),
        }
    }

    fn check_stmt_kind(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, span: Span, s: &'a Stmt<'a>) {
        match s {
            Stmt::Return { value } => {
                let ret = ctx.return_type;
                match value {
                    Some(v) => {
                        let vt = self.check_expr(module, ctx, v);
                        if !self.is_assignable_expr(ret, v, vt) {
                            self.error(span, format!("return type mismatch: expected '{ret}', found '{vt}'"));
                        }
                    }
                    None => {
                        if !matches!(ret, Type::Void) {
                            self.error(span, format!("missing return value of type '{ret}'"));
                        }
                    }
                }
            }
            Stmt::If { condition, then_body, elseifs, else_body } => {
                let ct = self.check_expr(module, ctx, condition);
                if !self.is_condition_type(ct) {
                    self.error(condition.span, format!("'if' condition must be bool or a pointer, found '{ct}'"));
                }
                self.check_block(module, ctx, then_body);
                for e in elseifs {
                    let ct = self.check_expr(module, ctx, e.condition);
                    if !self.is_condition_type(ct) {
                        self.error(e.condition.span, format!("'elseif' condition must be bool or a pointer, found '{ct}'"));
                    }
                    self.check_block(module, ctx, &e.body);
                }
                self.check_block(module, ctx, else_body);
            }
            Stmt::For { var_name, start, end, step, body } => {
                let st = self.check_expr(module, ctx, start);
                let et = self.check_expr(module, ctx, end);
                if !st.is_integer() {
                    self.error(start.span, format!("for-range start must be an integer, found '{st}'"));
                }
                if !et.is_integer() {
                    self.error(end.span, format!("for-range end must be an integer, found '{et}'"));
                }
                if let Some(step) = step {
                    let stept = self.check_expr(module, ctx, step);
                    if !stept.is_integer() {
                        self.error(step.span, format!("for-range step must be an integer, found '{stept}'"));
                    }
                }
                ctx.push_scope();
                ctx.define_with_const(var_name, st, false);
                ctx.loop_depth += 1;
                ctx.break_depth += 1;
                for stmt in body {
                    self.check_stmt(module, ctx, stmt);
                }
                ctx.break_depth -= 1;
                ctx.loop_depth -= 1;
                ctx.pop_scope();
            }
            Stmt::While { condition, body } => {
                let ct = self.check_expr(module, ctx, condition);
                if !self.is_condition_type(ct) {
                    self.error(condition.span, format!("'while' condition must be bool or a pointer, found '{ct}'"));
                }
                ctx.loop_depth += 1;
                ctx.break_depth += 1;
                self.check_block(module, ctx, body);
                ctx.break_depth -= 1;
                ctx.loop_depth -= 1;
            }
            Stmt::Break => {
                if ctx.break_depth == 0 {
                    self.error(span, "'break' outside of a loop or match");
                }
            }
            Stmt::Continue => {
                if ctx.loop_depth == 0 {
                    self.error(span, "'continue' outside of a loop");
                }
            }
            Stmt::Match { subject, cases, else_body } => {
                let subj_ty = self.check_expr(module, ctx, subject);
                let mut seen_values: Vec<&str> = Vec::new();
                ctx.break_depth += 1;
                for case in cases {
                    for v in &case.values {
                        let vt = self.check_expr(module, ctx, v);
                        if !self.types_match_for_case(subj_ty, vt) {
                            self.error(v.span, format!("case value of type '{vt}' cannot match subject of type '{subj_ty}'"));
                        }
                        if let NodeKind::Expr(Expr::IntegerLiteral { text } | Expr::StringLiteral { text }) = &v.kind {
                            if seen_values.contains(text) {
                                self.error(v.span, format!("duplicate case value '{text}'"));
                            } else {
                                seen_values.push(text);
                            }
                        }
                    }
                    self.check_block(module, ctx, &case.body);
                }
                self.check_block(module, ctx, else_body);
                ctx.break_depth -= 1;
            }
            Stmt::Assign { target, value } => {
                let tt = self.check_lvalue(module, ctx, target);
                let vt = self.check_expr(module, ctx, value);
                if let Some(tt) = tt {
                    if !self.is_assignable_expr(tt, value, vt) {
                        self.error(span, format!("cannot assign value of type '{vt}' to target of type '{tt}'"));
                    }
                }
            }
            Stmt::CompoundAssign { target, value, .. } => {
                let tt = self.check_lvalue(module, ctx, target);
                let vt = self.check_expr(module, ctx, value);
                if let Some(tt) = tt {
                    if !tt.is_numeric() || !vt.is_numeric() {
                        self.error(span, format!("compound assignment requires numeric operands, found '{tt}' and '{vt}'"));
                    }
                }
            }
            Stmt::ExprStmt { expr } => {
                self.check_expr(module, ctx, expr);
            }
        }
    }

    fn types_match_for_case(&self, subject: &'a Type<'a>, value: &'a Type<'a>) -> bool {
        subject == value || (subject.is_integer() && value.is_integer()) || matches!((subject, value), (Type::Enum(_), Type::Enum(_)))
    }

    /// Checks that `target` denotes something assignable (an identifier
    /// bound to a mutable local, a field access, a dereference, or an
    /// index expression), rejecting assignment to a `const` binding.
    /// Returns the target's type so the caller can check the value
    /// against it; `None` if the target itself didn't type-check as an
    /// lvalue (already reported).
    fn check_lvalue(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, node: &'a Node<'a>) -> Option<&'a Type<'a>> {
        let NodeKind::Expr(e) = &node.kind else { return None };
        match e {
            Expr::Identifier { name } => match ctx.lookup(name) {
                Some((ty, is_const)) => {
                    if is_const {
                        self.error(node.span, format!("cannot assign to const '{name}'"));
                    }
                    node.resolved_type.set(Some(ty));
                    Some(ty)
                }
                None => {
                    self.error(node.span, format!("undefined variable '{name}'"));
                    None
                }
            },
            Expr::FieldAccess { .. } | Expr::Index { .. } => Some(self.check_expr(module, ctx, node)),
            Expr::Unary { op: UnaryOp::Deref, .. } => Some(self.check_expr(module, ctx, node)),
            _ => {
                self.error(node.span, "invalid assignment target");
                None
            }
        }
    }

    // -- expressions ----------------------------------------------------------

    pub(crate) fn check_expr(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, node: &'a Node<'a>) -> &'a Type<'a> {
        if let Some(t) = node.resolved_type.get() {
            return t;
        }
        let NodeKind::Expr(e) = &node.kind else {
            unreachable!("check_expr called on a non-expression node")
        };
        let ty = self.check_expr_kind(module, ctx, node.span, e, node);
        node.resolved_type.set(Some(ty));
        ty
    }

    fn check_expr_kind(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, span: Span, e: &'a Expr<'a>, node: &'a Node<'a>) -> &'a Type<'a> {
        match e {
            Expr::IntegerLiteral { .. } => self.types.int,
            Expr::FloatLiteral { .. } => self.types.double,
            Expr::StringLiteral { .. } => self.types.string,
            Expr::BoolLiteral { .. } => self.types.bool_,
            Expr::NullLiteral => self.arena.alloc(Type::Ptr(self.types.void)),
            Expr::SelfExpr => match ctx.self_type {
                Some(t) => t,
                None => {
                    self.error(span, "'self' used outside of a method");
                    self.types.void
                }
            },
            Expr::Identifier { name } => self.check_identifier(module, ctx, span, name),
            Expr::Binary { op, left, right } => self.check_binary(module, ctx, span, *op, left, right),
            Expr::Unary { op, operand } => self.check_unary(module, ctx, span, *op, operand),
            Expr::Paren { inner } => self.check_expr(module, ctx, inner),
            Expr::Call { callee, type_args, args } => self.check_call(module, ctx, span, node, callee, type_args, args),
            Expr::FieldAccess { object, field_name } => self.check_field_access(module, ctx, span, object, field_name),
            Expr::MethodCall { object, method_name, args } => {
                self.check_method_call(module, ctx, span, node, object, method_name, args)
            }
            Expr::StructLiteral { struct_name, type_args, fields } => {
                self.check_struct_literal(module, ctx, span, struct_name, type_args, fields)
            }
            Expr::Cast { expr, target_type } => self.check_cast(module, ctx, span, expr, target_type),
            Expr::Sizeof { type_node } => {
                self.resolve_type_expr(module, type_node);
                self.types.usize_
            }
            Expr::ArrayLiteral { elements } => self.check_array_literal(module, ctx, span, elements),
            Expr::Index { object, index } => self.check_index(module, ctx, span, object, index),
        }
    }

    fn check_identifier(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, span: Span, name: &str) -> &'a Type<'a> {
        if let Some((ty, _)) = ctx.lookup(name) {
            return ty;
        }
        let found = self.graph.get(module).symbols.borrow().get(name).map(|s| s.node);
        if let Some(decl_node) = found {
            if let Some(ty) = decl_node.resolved_type.get() {
                return ty;
            }
        }
        self.error(span, format!("undefined name '{name}'"));
        self.types.void
    }

    fn check_binary(
        &self,
        module: ModuleId,
        ctx: &mut CheckCtx<'a>,
        span: Span,
        op: BinaryOp,
        left: &'a Node<'a>,
        right: &'a Node<'a>,
    ) -> &'a Type<'a> {
        let lt = self.check_expr(module, ctx, left);
        let rt = self.check_expr(module, ctx, right);
        match op {
            BinaryOp::And | BinaryOp::Or => {
                if !matches!(lt, Type::Bool) || !matches!(rt, Type::Bool) {
                    self.error(span, format!("'{op:?}' requires bool operands, found '{lt}' and '{rt}'"));
                }
                self.types.bool_
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                if !self.comparable(lt, rt) {
                    self.error(span, format!("cannot compare '{lt}' and '{rt}'"));
                }
                self.types.bool_
            }
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
                if !(lt.is_numeric() && rt.is_numeric()) {
                    self.error(span, format!("'{op:?}' requires numeric operands, found '{lt}' and '{rt}'"));
                }
                self.types.bool_
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::BitXor => {
                if !(lt.is_numeric() && rt.is_numeric()) {
                    self.error(span, format!("'{op:?}' requires numeric operands, found '{lt}' and '{rt}'"));
                    return lt;
                }
                self.wider_numeric(lt, rt)
            }
        }
    }

    fn comparable(&self, a: &'a Type<'a>, b: &'a Type<'a>) -> bool {
        a == b
            || (a.is_numeric() && b.is_numeric())
            || (a.is_pointer_like() && b.is_pointer_like())
            || matches!(a, Type::Ptr(inner) if matches!(inner, Type::Void))
            || matches!(b, Type::Ptr(inner) if matches!(inner, Type::Void))
    }

    fn wider_numeric(&self, a: &'a Type<'a>, b: &'a Type<'a>) -> &'a Type<'a> {
        match (a.integer_rank(), b.integer_rank()) {
            (Some(ra), Some(rb)) => if ra >= rb { a } else { b },
            _ => {
                if matches!(a, Type::Double) || matches!(b, Type::Double) {
                    self.types.double
                } else if matches!(a, Type::Float) || matches!(b, Type::Float) {
                    self.types.float
                } else {
                    a
                }
            }
        }
    }

    fn check_unary(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, span: Span, op: UnaryOp, operand: &'a Node<'a>) -> &'a Type<'a> {
        match op {
            UnaryOp::Neg => {
                let t = self.check_expr(module, ctx, operand);
                if !t.is_numeric() {
                    self.error(span, format!("unary '-' requires a numeric operand, found '{t}'"));
                }
                t
            }
            UnaryOp::Not => {
                let t = self.check_expr(module, ctx, operand);
                if !matches!(t, Type::Bool) {
                    self.error(span, format!("'not' requires a bool operand, found '{t}'"));
                }
                self.types.bool_
            }
            UnaryOp::Ref => {
                let t = self.check_expr(module, ctx, operand);
                self.arena.alloc(Type::Ref(t))
            }
            UnaryOp::Deref => {
                let t = self.check_expr(module, ctx, operand);
                match t {
                    Type::Ref(inner) | Type::Ptr(inner) => inner,
                    _ => {
                        self.error(span, format!("cannot dereference non-pointer type '{t}'"));
                        self.types.void
                    }
                }
            }
        }
    }

    fn check_cast(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, span: Span, expr: &'a Node<'a>, target_type: &'a Node<'a>) -> &'a Type<'a> {
        let from = self.check_expr(module, ctx, expr);
        let to = self.resolve_type_expr(module, target_type).unwrap_or(self.types.void);
        let ok = (from.is_numeric() && to.is_numeric())
            || (from.is_pointer_like() && to.is_pointer_like())
            || (from.is_integer() && to.is_pointer_like())
            || (from.is_pointer_like() && to.is_integer());
        if !ok {
            self.error(span, format!("cannot cast '{from}' to '{to}'"));
        }
        to
    }

    fn check_array_literal(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, span: Span, elements: &'a [&'a Node<'a>]) -> &'a Type<'a> {
        if elements.is_empty() {
            self.error(span, "empty array literal has no element type; annotate the declaration");
            return self.arena.alloc(Type::Array(self.types.void, 0));
        }
        let first = self.check_expr(module, ctx, elements[0]);
        for el in &elements[1..] {
            let t = self.check_expr(module, ctx, el);
            if !self.is_assignable(first, t) {
                self.error(el.span, format!("array element type mismatch: expected '{first}', found '{t}'"));
            }
        }
        self.arena.alloc(Type::Array(first, elements.len() as u64))
    }

    fn check_index(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, span: Span, object: &'a Node<'a>, index: &'a Node<'a>) -> &'a Type<'a> {
        let ot = self.check_expr(module, ctx, object);
        let it = self.check_expr(module, ctx, index);
        if !it.is_integer() {
            self.error(index.span, format!("index must be an integer, found '{it}'"));
        }
        match ot {
            Type::Array(inner, _) | Type::Slice(inner) => inner,
            _ => {
                self.error(span, format!("cannot index into '{ot}'"));
                self.types.void
            }
        }
    }

    fn check_field_access(&self, module: ModuleId, ctx: &mut CheckCtx<'a>, span: Span, object: &'a Node<'a>, field_name: &str) -> &'a Type<'a> {
        let ot = self.check_expr(module, ctx, object);
        let struct_ty = match self.deref_to_struct(ot) {
            Some(s) => s,
            None => {
                self.error(span, format!("'{ot}' has no field '{field_name}'"));
                return self.types.void;
            }
        };
        match struct_ty.find_field(field_name) {
            Some(f) => self.resolve_type_expr(module, f.type_node).unwrap_or(self.types.void),
            None => {
                self.error(span, format!("'{}' has no field '{field_name}'", struct_ty.name));
                self.types.void
            }
        }
    }

    fn deref_to_struct(&self, ty: &'a Type<'a>) -> Option<&'a StructType<'a>> {
        match *ty {
            Type::Struct(s) => Some(s),
            Type::Ref(inner) | Type::Ptr(inner) => self.deref_to_struct(inner),
            _ => None,
        }
    }

    fn check_struct_literal(
        &self,
        module: ModuleId,
        ctx: &mut CheckCtx<'a>,
        span: Span,
        struct_name: &str,
        type_args: &'a [&'a Node<'a>],
        fields: &'a [FieldInit<'a>],
    ) -> &'a Type<'a> {
        let resolved = self.resolve_simple_type(module, span, struct_name, type_args);
        let Some(ty) = resolved else { return self.types.void };
        let Type::Struct(struct_ty) = ty else {
            self.error(span, format!("'{struct_name}' is not a struct"));
            return self.types.void;
        };
        for f in fields {
            let value_ty = self.check_expr(module, ctx, f.value);
            match struct_ty.find_field(f.name) {
                Some(field) => {
                    let field_ty = self.resolve_type_expr(module, field.type_node).unwrap_or(self.types.void);
                    if !self.is_assignable_expr(field_ty, f.value, value_ty) {
                        self.error(
                            f.value.span,
                            format!("field '{}' expects '{field_ty}', found '{value_ty}'", f.name),
                        );
                    }
                }
                None => self.error(span, format!("'{}' has no field '{}'", struct_ty.name, f.name)),
            }
        }
        ty
    }

    fn check_call(
        &self,
        module: ModuleId,
        ctx: &mut CheckCtx<'a>,
        span: Span,
        call_node: &'a Node<'a>,
        callee: &'a Node<'a>,
        type_args: &'a [&'a Node<'a>],
        args: &'a [&'a Node<'a>],
    ) -> &'a Type<'a> {
        let NodeKind::Expr(Expr::Identifier { name }) = &callee.kind else {
            self.error(span, "call target must be a function name");
            return self.types.void;
        };

        let found = self.graph.get(module).symbols.borrow().get(name).map(|s| (s.kind, s.node, s.source));
        let Some((kind, decl_node, owner_module)) = found else {
            self.error(span, format!("undefined function '{name}'"));
            return self.types.void;
        };
        if !matches!(kind, crate::sema::symbol_table::SymbolKind::Func) {
            self.error(span, format!("'{name}' is not callable"));
            return self.types.void;
        }
        let fd = as_func_decl(decl_node);

        let arg_types: Vec<&Type> = args.iter().map(|a| self.check_expr(module, ctx, a)).collect();

        if fd.is_generic() {
            let concrete: Option<Vec<&Type>> = if !type_args.is_empty() {
                type_args.iter().map(|t| self.resolve_type_expr(module, t)).collect()
            } else {
                self.infer_type_args(fd, &arg_types)
            };
            let Some(concrete) = concrete else {
                self.error(span, format!("cannot infer type arguments for '{name}'"));
                return self.types.void;
            };
            let (mangled, ft, _decl) = self.monomorphize_function(owner_module, decl_node, &concrete, module);
            self.check_args(span, &ft.params, args, &arg_types, fd.is_extern);
            call_node.mangled.set(Some(mangled));
            return ft.return_type;
        }

        let Some(Type::Func(ft)) = decl_node.resolved_type.get() else {
            self.error(span, format!("'{name}' has no resolved signature"));
            return self.types.void;
        };
        self.check_args(span, &ft.params, args, &arg_types, fd.is_extern);
        ft.return_type
    }

    /// C-style varargs aren't modeled; an `extern` function is allowed
    /// more arguments than parameters so printf-shaped externs type-check,
    /// matching ones still get arity- and type-checked normally.
    fn check_args(&self, span: Span, params: &[&'a Type<'a>], arg_exprs: &[&'a Node<'a>], args: &[&'a Type<'a>], is_extern: bool) {
        if args.len() < params.len() || (!is_extern && args.len() != params.len()) {
            self.error(span, format!("expected {} argument(s), found {}", params.len(), args.len()));
            return;
        }
        for (i, ((p, expr), a)) in params.iter().zip(arg_exprs.iter()).zip(args.iter()).enumerate() {
            if !self.is_assignable_expr(p, expr, a) {
                self.error(span, format!("argument {} expects '{p}', found '{a}'", i + 1));
            }
        }
    }

    /// Infers generic type arguments from argument types by structurally
    /// matching each parameter's declared type expression against the
    /// type the corresponding argument actually has, the first time a
    /// type parameter's name is seen in that walk.
    fn infer_type_args(&self, fd: &'a FuncDecl<'a>, arg_types: &[&'a Type<'a>]) -> Option<Vec<&'a Type<'a>>> {
        let mut bound: HashMap<&'a str, &'a Type<'a>> = HashMap::new();
        for (param, arg_ty) in fd.params.iter().zip(arg_types.iter()) {
            self.unify_type_expr(param.type_node, arg_ty, &mut bound);
        }
        fd.type_params.iter().map(|tp| bound.get(tp.name).copied()).collect()
    }

    fn unify_type_expr(&self, type_node: &'a Node<'a>, concrete: &'a Type<'a>, bound: &mut HashMap<&'a str, &'a Type<'a>>) {
        let NodeKind::TypeExpr(te) = &type_node.kind else { return };
        match (te, concrete) {
            (TypeExpr::Simple { name, type_args }, _) if type_args.is_empty() => {
                bound.entry(name).or_insert(concrete);
            }
            (TypeExpr::Reference { inner }, Type::Ref(c)) => self.unify_type_expr(inner, c, bound),
            (TypeExpr::Pointer { inner }, Type::Ptr(c)) => self.unify_type_expr(inner, c, bound),
            (TypeExpr::Array { inner, .. }, Type::Array(c, _)) => self.unify_type_expr(inner, c, bound),
            (TypeExpr::Slice { inner }, Type::Slice(c)) => self.unify_type_expr(inner, c, bound),
            _ => {}
        }
    }

    fn check_method_call(
        &self,
        module: ModuleId,
        ctx: &mut CheckCtx<'a>,
        span: Span,
        call_node: &'a Node<'a>,
        object: &'a Node<'a>,
        method_name: &str,
        args: &'a [&'a Node<'a>],
    ) -> &'a Type<'a> {
        let ot = self.check_expr(module, ctx, object);
        let arg_types: Vec<&Type> = args.iter().map(|a| self.check_expr(module, ctx, a)).collect();

        let Some(struct_ty) = self.deref_to_struct(ot) else {
            if let Some(iface) = self.deref_to_interface(ot) {
                return self.check_interface_method_call(span, iface, method_name, args, &arg_types);
            }
            self.error(span, format!("'{ot}' has no method '{method_name}'"));
            return self.types.void;
        };
        let Some(method_node) = struct_ty.find_method(method_name) else {
            self.error(span, format!("'{}' has no method '{method_name}'", struct_ty.name));
            return self.types.void;
        };
        let mf = as_func_decl(method_node);

        if mf.is_generic() {
            let Some(concrete) = self.infer_type_args(mf, &arg_types) else {
                self.error(span, format!("cannot infer type arguments for '{method_name}'"));
                return self.types.void;
            };
            let (mangled, ft, _decl) = self.monomorphize_method(struct_ty, method_node, &concrete, module);
            self.check_args(span, &ft.params, args, &arg_types, false);
            call_node.mangled.set(Some(mangled));
            return ft.return_type;
        }

        let Some(Type::Func(ft)) = method_node.resolved_type.get() else {
            self.error(span, format!("method '{method_name}' has no resolved signature"));
            return self.types.void;
        };
        self.check_args(span, &ft.params, args, &arg_types, false);
        ft.return_type
    }

    fn deref_to_interface(&self, ty: &'a Type<'a>) -> Option<&'a InterfaceType<'a>> {
        match ty {
            Type::Interface(iface) => Some(iface),
            Type::Ref(inner) | Type::Ptr(inner) => self.deref_to_interface(inner),
            _ => None,
        }
    }

    fn check_interface_method_call(
        &self,
        span: Span,
        iface: &'a InterfaceType<'a>,
        method_name: &str,
        args: &'a [&'a Node<'a>],
        arg_types: &[&'a Type<'a>],
    ) -> &'a Type<'a> {
        let sig = iface.method_sigs().iter().find(|s| matches!(&(***s).kind, NodeKind::FuncDecl(f) if f.name == method_name));
        let Some(sig) = sig else {
            self.error(span, format!("interface '{}' has no method '{method_name}'", iface.name));
            return self.types.void;
        };
        let Some(Type::Func(ft)) = sig.resolved_type.get() else {
            return self.types.void;
        };
        self.check_args(span, &ft.params, args, arg_types, false);
        ft.return_type
    }

    /// Implicit conversions: integer widening by rank, any
    /// integer literal's type to any integer type, `&T` to `*T`, any
    /// pointer to `*void`, `*void` to any `*U`, array to slice, and
    /// `&Struct` to `&Interface` when the struct satisfies the interface
    /// (recorded as a discovered impl pair as a side effect here, since
    /// this is the one place both types are in hand together).
    pub(crate) fn is_assignable(&self, target: &'a Type<'a>, value: &'a Type<'a>) -> bool {
        if target == value {
            return true;
        }
        match (target, value) {
            (t, v) if t.is_integer() && v.is_integer() => Type::integer_convertible(v, t),
            (Type::Float, Type::Int) | (Type::Double, Type::Int) | (Type::Double, Type::Float) => true,
            (Type::Ptr(t_inner), Type::Ref(v_inner)) => t_inner == v_inner || matches!(t_inner, Type::Void),
            (Type::Ptr(t_inner), Type::Ptr(_)) if matches!(t_inner, Type::Void) => true,
            (Type::Ptr(_), Type::Ptr(v_inner)) if matches!(v_inner, Type::Void) => true,
            (Type::Slice(t_inner), Type::Array(v_inner, _)) => t_inner == v_inner,
            (Type::Ref(Type::Interface(iface)), Type::Ref(Type::Struct(s))) => self.struct_satisfies_interface(s, iface),
            (Type::Interface(iface), Type::Struct(s)) => self.struct_satisfies_interface(s, iface),
            _ => false,
        }
    }

    /// Same as [`is_assignable`], plus the "any integer
    /// literal to any integer type" rule — a bare literal's default
    /// `int`/`double` typing shouldn't force a narrowing error at sites
    /// where the literal obviously fits (`var b: byte = 200`). Only a
    /// literal expression gets this leniency; a variable or expression
    /// of type `int` must still widen normally.
    pub(crate) fn is_assignable_expr(&self, target: &'a Type<'a>, value_expr: &'a Node<'a>, value: &'a Type<'a>) -> bool {
        self.is_assignable(target, value)
            || (target.is_integer() && value.is_integer() && matches!(&value_expr.kind, NodeKind::Expr(Expr::IntegerLiteral { .. })))
    }

    /// `if`/`while`/`elseif` conditions accept `bool` or any pointer
    /// (a null check reads as a condition directly, no `!= null` needed).
    fn is_condition_type(&self, ty: &'a Type<'a>) -> bool {
        matches!(ty, Type::Bool) || ty.is_pointer_like()
    }

    /// Name, parameter count, and generic-parameter count must match for
    /// every interface method; parameter/return *types* are not compared
    /// here because ad-hoc satisfaction happens well before a struct's
    /// methods necessarily have fully resolved signatures in every pass
    /// ordering; exact signature agreement is deferred to the point each
    /// method is actually called through the interface.
    fn struct_satisfies_interface(&self, struct_ty: &'a StructType<'a>, iface: &'a InterfaceType<'a>) -> bool {
        let satisfies = iface.method_sigs().iter().all(|sig| {
            let want = as_func_decl(sig);
            match struct_ty.find_method(want.name) {
                Some(m) => {
                    let have = as_func_decl(m);
                    have.params.len() == want.params.len() && have.type_params.len() == want.type_params.len()
                }
                None => false,
            }
        });
        if satisfies {
            self.record_impl_pair(struct_ty, iface);
        }
        satisfies
    }
}
