//! `ancc ast`/`ancc lexer` pretty-printers (SPEC_FULL.md "Supplemented
//! features" 1-2, grounded on the original `main.c`'s `ast_print` and
//! `lexer_print`). Neither is on the hot compile path — both exist so a
//! source file's tokens or tree can be inspected standalone and so
//! golden-file tests have something stable to snapshot.

use std::fmt::Write;

use crate::ast::*;
use crate::lexer::Token;

/// One line per token: kind, source slice, and position.
pub fn print_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        let text = if tok.kind == crate::lexer::TokenKind::Newline {
            "\\n"
        } else {
            tok.text
        };
        let _ = writeln!(out, "{:>4}:{:<3} {:?} {:?}", tok.span.line, tok.span.column, tok.kind, text);
    }
    out
}

/// Recursive indented dump of a parsed tree, rooted at a `Program` node.
pub fn print_ast(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    indent(out, depth);
    match &node.kind {
        NodeKind::Program(p) => {
            let _ = writeln!(out, "Program");
            for decl in &p.declarations {
                write_node(out, decl, depth + 1);
            }
        }
        NodeKind::ImportDecl(i) => {
            let _ = writeln!(
                out,
                "Import {} ({}) [{}]",
                i.module_path,
                if i.is_export { "export" } else { "import" },
                i.names.iter().map(|n| n.name).collect::<Vec<_>>().join(", ")
            );
        }
        NodeKind::ConstDecl(c) => {
            let _ = writeln!(out, "Const {}", c.name);
            write_node(out, c.value, depth + 1);
        }
        NodeKind::VarDecl(v) => {
            let _ = writeln!(out, "Var {}", v.name);
            if let Some(value) = v.value {
                write_node(out, value, depth + 1);
            }
        }
        NodeKind::FuncDecl(f) => {
            let _ = writeln!(
                out,
                "Func {}{}({})",
                f.name,
                if f.type_params.is_empty() {
                    String::new()
                } else {
                    format!("[{}]", f.type_params.iter().map(|t| t.name).collect::<Vec<_>>().join(", "))
                },
                f.params.iter().map(|p| p.name).collect::<Vec<_>>().join(", ")
            );
            for stmt in &f.body {
                write_node(out, stmt, depth + 1);
            }
        }
        NodeKind::StructDecl(s) => {
            let _ = writeln!(out, "Struct {}", s.name);
            for field in &s.fields {
                indent(out, depth + 1);
                let _ = writeln!(out, "field {}", field.name);
            }
            for method in &s.methods {
                write_node(out, method, depth + 1);
            }
        }
        NodeKind::InterfaceDecl(i) => {
            let _ = writeln!(out, "Interface {}", i.name);
            for sig in &i.method_sigs {
                write_node(out, sig, depth + 1);
            }
        }
        NodeKind::EnumDecl(e) => {
            let _ = writeln!(
                out,
                "Enum {} [{}]",
                e.name,
                e.variants.iter().map(|v| v.name).collect::<Vec<_>>().join(", ")
            );
        }
        NodeKind::Stmt(stmt) => write_stmt(out, stmt, depth),
        NodeKind::Expr(expr) => write_expr(out, expr, depth),
        NodeKind::TypeExpr(ty) => write_type_expr(out, ty, depth),
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    match stmt {
        Stmt::Return { value } => {
            let _ = writeln!(out, "Return");
            if let Some(value) = value {
                write_node(out, value, depth + 1);
            }
        }
        Stmt::If { condition, then_body, elseifs, else_body } => {
            let _ = writeln!(out, "If");
            write_node(out, condition, depth + 1);
            for s in then_body {
                write_node(out, s, depth + 1);
            }
            for branch in elseifs {
                indent(out, depth);
                let _ = writeln!(out, "Elseif");
                write_node(out, branch.condition, depth + 1);
                for s in &branch.body {
                    write_node(out, s, depth + 1);
                }
            }
            if !else_body.is_empty() {
                indent(out, depth);
                let _ = writeln!(out, "Else");
                for s in else_body {
                    write_node(out, s, depth + 1);
                }
            }
        }
        Stmt::For { var_name, start, end, step, body } => {
            let _ = writeln!(out, "For {var_name}");
            write_node(out, start, depth + 1);
            write_node(out, end, depth + 1);
            if let Some(step) = step {
                write_node(out, step, depth + 1);
            }
            for s in body {
                write_node(out, s, depth + 1);
            }
        }
        Stmt::While { condition, body } => {
            let _ = writeln!(out, "While");
            write_node(out, condition, depth + 1);
            for s in body {
                write_node(out, s, depth + 1);
            }
        }
        Stmt::Break => {
            let _ = writeln!(out, "Break");
        }
        Stmt::Continue => {
            let _ = writeln!(out, "Continue");
        }
        Stmt::Match { subject, cases, else_body } => {
            let _ = writeln!(out, "Match");
            write_node(out, subject, depth + 1);
            for case in cases {
                indent(out, depth + 1);
                let _ = writeln!(out, "Case");
                for v in &case.values {
                    write_node(out, v, depth + 2);
                }
                for s in &case.body {
                    write_node(out, s, depth + 2);
                }
            }
            if !else_body.is_empty() {
                indent(out, depth + 1);
                let _ = writeln!(out, "Else");
                for s in else_body {
                    write_node(out, s, depth + 2);
                }
            }
        }
        Stmt::Assign { target, value } => {
            let _ = writeln!(out, "Assign");
            write_node(out, target, depth + 1);
            write_node(out, value, depth + 1);
        }
        Stmt::CompoundAssign { op, target, value } => {
            let _ = writeln!(out, "CompoundAssign {op:?}");
            write_node(out, target, depth + 1);
            write_node(out, value, depth + 1);
        }
        Stmt::ExprStmt { expr } => write_node(out, expr, depth),
    }
}

fn write_expr(out: &mut String, expr: &Expr, depth: usize) {
    match expr {
        Expr::IntegerLiteral { text } => {
            let _ = writeln!(out, "Int {text}");
        }
        Expr::FloatLiteral { text } => {
            let _ = writeln!(out, "Float {text}");
        }
        Expr::StringLiteral { text } => {
            let _ = writeln!(out, "Str {text:?}");
        }
        Expr::BoolLiteral { value } => {
            let _ = writeln!(out, "Bool {value}");
        }
        Expr::NullLiteral => {
            let _ = writeln!(out, "Null");
        }
        Expr::Identifier { name } => {
            let _ = writeln!(out, "Ident {name}");
        }
        Expr::SelfExpr => {
            let _ = writeln!(out, "Self");
        }
        Expr::Binary { op, left, right } => {
            let _ = writeln!(out, "Binary {op:?}");
            write_node(out, left, depth + 1);
            write_node(out, right, depth + 1);
        }
        Expr::Unary { op, operand } => {
            let _ = writeln!(out, "Unary {op:?}");
            write_node(out, operand, depth + 1);
        }
        Expr::Paren { inner } => write_node(out, inner, depth),
        Expr::Call { callee, type_args, args } => {
            let _ = writeln!(out, "Call [{} type args]", type_args.len());
            write_node(out, callee, depth + 1);
            for a in args {
                write_node(out, a, depth + 1);
            }
        }
        Expr::FieldAccess { object, field_name } => {
            let _ = writeln!(out, "FieldAccess .{field_name}");
            write_node(out, object, depth + 1);
        }
        Expr::MethodCall { object, method_name, args } => {
            let _ = writeln!(out, "MethodCall .{method_name}");
            write_node(out, object, depth + 1);
            for a in args {
                write_node(out, a, depth + 1);
            }
        }
        Expr::StructLiteral { struct_name, type_args, fields } => {
            let _ = writeln!(out, "StructLiteral {struct_name} [{} type args]", type_args.len());
            for f in fields {
                indent(out, depth + 1);
                let _ = writeln!(out, "{} =", f.name);
                write_node(out, f.value, depth + 2);
            }
        }
        Expr::Cast { expr, target_type } => {
            let _ = writeln!(out, "Cast");
            write_node(out, expr, depth + 1);
            write_node(out, target_type, depth + 1);
        }
        Expr::Sizeof { type_node } => {
            let _ = writeln!(out, "Sizeof");
            write_node(out, type_node, depth + 1);
        }
        Expr::ArrayLiteral { elements } => {
            let _ = writeln!(out, "ArrayLiteral [{}]", elements.len());
            for e in elements {
                write_node(out, e, depth + 1);
            }
        }
        Expr::Index { object, index } => {
            let _ = writeln!(out, "Index");
            write_node(out, object, depth + 1);
            write_node(out, index, depth + 1);
        }
    }
}

fn write_type_expr(out: &mut String, ty: &TypeExpr, depth: usize) {
    match ty {
        TypeExpr::Simple { name, type_args } => {
            let _ = writeln!(out, "Type {name} [{} args]", type_args.len());
            for a in type_args {
                write_node(out, a, depth + 1);
            }
        }
        TypeExpr::Reference { inner } => {
            let _ = writeln!(out, "&");
            write_node(out, inner, depth + 1);
        }
        TypeExpr::Pointer { inner } => {
            let _ = writeln!(out, "*");
            write_node(out, inner, depth + 1);
        }
        TypeExpr::Array { inner, size_expr } => {
            let _ = writeln!(out, "Array");
            write_node(out, inner, depth + 1);
            write_node(out, size_expr, depth + 1);
        }
        TypeExpr::Slice { inner } => {
            let _ = writeln!(out, "Slice");
            write_node(out, inner, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::errors::Errors;
    use crate::parser::Parser;

    #[test]
    fn prints_a_function_declaration() {
        let arena = Arena::new();
        let mut errors = Errors::new();
        let src = "func add(a: int, b: int): int return a + b end\n";
        let ast = Parser::parse(&arena, &mut errors, src);
        let dump = print_ast(ast);
        assert!(dump.starts_with("Program\n"));
        assert!(dump.contains("Func add(a, b)"));
        assert!(dump.contains("Binary Add"));
    }

    #[test]
    fn prints_tokens_with_position() {
        use crate::lexer::Lexer;
        let mut errors = Errors::new();
        let tokens = Lexer::tokenize("const x = 1\n", &mut errors);
        let dump = print_tokens(&tokens);
        assert!(dump.contains("Const"));
        assert!(dump.contains("IntegerLiteral"));
    }
}
