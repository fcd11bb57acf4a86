//! Statement lowering.

use crate::ast::{Node, NodeKind, Stmt};
use crate::sema::type_registry::Type;

use super::writer::Writer;
use super::Cg;

impl<'e, 'a> Cg<'e, 'a> {
    pub(crate) fn lower_block(&self, w: &mut Writer, stmts: &[&'a Node<'a>]) {
        self.push_scope();
        for stmt in stmts {
            self.lower_top_level_stmt(w, stmt);
        }
        self.pop_scope();
    }

    fn lower_top_level_stmt(&self, w: &mut Writer, node: &'a Node<'a>) {
        match &node.kind {
            NodeKind::ConstDecl(c) => {
                let ty = node.resolved_type.get().expect("const decl resolved by the analyzer");
                let value = self.lower_expr(c.value);
                w.writeln(&format!("const {} {} = {value};", self.types.c_type(ty), c.name));
                self.declare_local(c.name);
            }
            NodeKind::VarDecl(v) => {
                let ty = node.resolved_type.get().expect("var decl resolved by the analyzer");
                let c_ty = self.types.c_type(ty);
                match v.value {
                    Some(value) => {
                        let text = self.lower_expr(value);
                        let coerced = self.coerce(ty, Self::resolved_of(value), &text);
                        w.writeln(&format!("{c_ty} {} = {coerced};", v.name));
                    }
                    None => w.writeln(&format!("{c_ty} {} = {{0}};", v.name)),
                }
                self.declare_local(v.name);
            }
            NodeKind::Stmt(s) => self.lower_stmt(w, s),
            _ => {}
        }
    }

    fn resolved_of(node: &'a Node<'a>) -> &'a Type<'a> {
        node.resolved_type.get().expect("expression resolved by the analyzer")
    }

    fn lower_stmt(&self, w: &mut Writer, s: &'a Stmt<'a>) {
        match s {
            Stmt::Return { value } => match value {
                Some(v) => w.writeln(&format!("return {};", self.lower_expr(v))),
                None => w.writeln("return;"),
            },
            Stmt::ExprStmt { expr } => w.writeln(&format!("{};", self.lower_expr(expr))),
            Stmt::Assign { target, value } => {
                let text = self.lower_expr(value);
                let coerced = self.coerce(Self::resolved_of(target), Self::resolved_of(value), &text);
                w.writeln(&format!("{} = {coerced};", self.lower_expr(target)));
            }
            Stmt::CompoundAssign { op, target, value } => {
                use crate::ast::CompoundAssignOp::*;
                let op_text = match op {
                    AddAssign => "+=",
                    SubAssign => "-=",
                    MulAssign => "*=",
                    DivAssign => "/=",
                };
                w.writeln(&format!(
                    "{} {op_text} {};",
                    self.lower_expr(target),
                    self.lower_expr(value)
                ));
            }
            Stmt::Break => w.writeln("break;"),
            Stmt::Continue => w.writeln("continue;"),
            Stmt::If { condition, then_body, elseifs, else_body } => {
                w.writeln(&format!("if ({}) {{", self.lower_expr(condition)));
                w.indent();
                self.lower_block(w, then_body);
                w.dedent();
                for branch in elseifs {
                    w.writeln(&format!("}} else if ({}) {{", self.lower_expr(branch.condition)));
                    w.indent();
                    self.lower_block(w, &branch.body);
                    w.dedent();
                }
                if !else_body.is_empty() {
                    w.writeln("} else {");
                    w.indent();
                    self.lower_block(w, else_body);
                    w.dedent();
                }
                w.writeln("}");
            }
            Stmt::While { condition, body } => {
                w.writeln(&format!("while ({}) {{", self.lower_expr(condition)));
                w.indent();
                self.lower_block(w, body);
                w.dedent();
                w.writeln("}");
            }
            Stmt::For { var_name, start, end, step, body } => {
                let c_ty = self.types.c_type(Self::resolved_of(start));
                let start_text = self.lower_expr(start);
                let end_text = self.lower_expr(end);
                let step_text = step.map(|s| self.lower_expr(s)).unwrap_or_else(|| "1".to_string());
                w.writeln(&format!(
                    "for ({c_ty} {var_name} = {start_text}; {var_name} < {end_text}; {var_name} += {step_text}) {{"
                ));
                w.indent();
                self.push_scope();
                self.declare_local(var_name);
                for stmt in body {
                    self.lower_top_level_stmt(w, stmt);
                }
                self.pop_scope();
                w.dedent();
                w.writeln("}");
            }
            Stmt::Match { subject, cases, else_body } => self.lower_match(w, subject, cases, else_body),
        }
    }

    fn lower_match(
        &self,
        w: &mut Writer,
        subject: &'a Node<'a>,
        cases: &'a [crate::ast::MatchCase<'a>],
        else_body: &[&'a Node<'a>],
    ) {
        let tmp = self.next_temp("anc_match");
        let c_ty = self.types.c_type(Self::resolved_of(subject));
        w.writeln("{");
        w.indent();
        w.writeln(&format!("{c_ty} {tmp} = {};", self.lower_expr(subject)));
        let mut first = true;
        for case in cases {
            let cond = case
                .values
                .iter()
                .map(|v| format!("{tmp} == {}", self.lower_expr(v)))
                .collect::<Vec<_>>()
                .join(" || ");
            let keyword = if first { "if" } else { "} else if" };
            w.writeln(&format!("{keyword} ({cond}) {{"));
            w.indent();
            self.lower_block(w, &case.body);
            w.dedent();
            first = false;
        }
        if !else_body.is_empty() {
            w.writeln("} else {");
            w.indent();
            self.lower_block(w, else_body);
            w.dedent();
        }
        w.writeln("}");
        w.dedent();
        w.writeln("}");
    }
}
