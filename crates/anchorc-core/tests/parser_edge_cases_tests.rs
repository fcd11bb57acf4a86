//! Parser-level tests: expression precedence, struct-literal/call/
//! generic-type-argument disambiguation, and panic-mode recovery.

use anchorc_core::arena::Arena;
use anchorc_core::ast::{BinaryOp, Expr, NodeKind, Stmt};
use anchorc_core::errors::Errors;
use anchorc_core::parser::Parser;

fn parse(src: &str) -> (anchorc_core::errors::Errors, Vec<&'static str>) {
    // Leak the arena for the duration of the test process; tests are
    // short-lived and this keeps the helper signature simple.
    let arena: &'static Arena = Box::leak(Box::new(Arena::new()));
    let src: &'static str = Box::leak(src.to_string().into_boxed_str());
    let mut errors = Errors::new();
    let ast = Parser::parse(arena, &mut errors, src);
    let names = match &ast.kind {
        NodeKind::Program(p) => p
            .declarations
            .iter()
            .map(|d| match &d.kind {
                NodeKind::FuncDecl(f) => f.name,
                NodeKind::StructDecl(s) => s.name,
                NodeKind::InterfaceDecl(i) => i.name,
                NodeKind::EnumDecl(e) => e.name,
                NodeKind::ConstDecl(c) => c.name,
                NodeKind::VarDecl(v) => v.name,
                NodeKind::ImportDecl(_) => "import",
                _ => "?",
            })
            .collect(),
        _ => Vec::new(),
    };
    (errors, names)
}

fn first_func_body(src: &str) -> &'static anchorc_core::ast::Node<'static> {
    let arena: &'static Arena = Box::leak(Box::new(Arena::new()));
    let src: &'static str = Box::leak(src.to_string().into_boxed_str());
    let mut errors = Errors::new();
    let ast = Parser::parse(arena, &mut errors, src);
    match &ast.kind {
        NodeKind::Program(p) => match &p.declarations[0].kind {
            NodeKind::FuncDecl(f) => f.body[0],
            _ => panic!("expected a function decl"),
        },
        _ => panic!("expected a program"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let body = first_func_body("func f(): int\n    return 1 + 2 * 3\nend\n");
    match &body.kind {
        NodeKind::Stmt(Stmt::Return { value: Some(expr) }) => match &expr.kind {
            NodeKind::Expr(Expr::Binary { op: BinaryOp::Add, left, right }) => {
                assert!(matches!(&left.kind, NodeKind::Expr(Expr::IntegerLiteral { .. })));
                assert!(matches!(&right.kind, NodeKind::Expr(Expr::Binary { op: BinaryOp::Mul, .. })));
            }
            other => panic!("expected top-level add, found {other:?}"),
        },
        other => panic!("expected return statement, found {other:?}"),
    }
}

#[test]
fn as_cast_binds_tighter_than_bitxor_but_looser_than_unary() {
    let body = first_func_body("func f(): int\n    return -x as int ^ y\nend\n");
    match &body.kind {
        NodeKind::Stmt(Stmt::Return { value: Some(expr) }) => {
            assert!(matches!(&expr.kind, NodeKind::Expr(Expr::Binary { op: BinaryOp::BitXor, .. })));
        }
        other => panic!("expected return statement, found {other:?}"),
    }
}

#[test]
fn identifier_followed_by_paren_with_named_fields_is_a_struct_literal() {
    let body = first_func_body("func f(): int\n    return Point(x = 1, y = 2).x\nend\n");
    match &body.kind {
        NodeKind::Stmt(Stmt::Return { value: Some(expr) }) => match &expr.kind {
            NodeKind::Expr(Expr::FieldAccess { object, field_name }) => {
                assert_eq!(*field_name, "x");
                assert!(matches!(&object.kind, NodeKind::Expr(Expr::StructLiteral { struct_name: "Point", .. })));
            }
            other => panic!("expected field access, found {other:?}"),
        },
        other => panic!("expected return statement, found {other:?}"),
    }
}

#[test]
fn identifier_followed_by_paren_with_bare_args_is_a_call() {
    let body = first_func_body("func f(): int\n    return add(1, 2)\nend\n");
    match &body.kind {
        NodeKind::Stmt(Stmt::Return { value: Some(expr) }) => {
            assert!(matches!(&expr.kind, NodeKind::Expr(Expr::Call { .. })));
        }
        other => panic!("expected return statement, found {other:?}"),
    }
}

#[test]
fn bracket_followed_by_paren_is_a_generic_type_argument_list() {
    let body = first_func_body("func f(): int\n    return max[int](1, 2)\nend\n");
    match &body.kind {
        NodeKind::Stmt(Stmt::Return { value: Some(expr) }) => match &expr.kind {
            NodeKind::Expr(Expr::Call { type_args, .. }) => assert_eq!(type_args.len(), 1),
            other => panic!("expected call, found {other:?}"),
        },
        other => panic!("expected return statement, found {other:?}"),
    }
}

#[test]
fn index_expression_is_not_mistaken_for_type_arguments() {
    let body = first_func_body("func f(): int\n    return xs[0]\nend\n");
    match &body.kind {
        NodeKind::Stmt(Stmt::Return { value: Some(expr) }) => {
            assert!(matches!(&expr.kind, NodeKind::Expr(Expr::Index { .. })));
        }
        other => panic!("expected return statement, found {other:?}"),
    }
}

#[test]
fn missing_end_sets_an_error_but_top_level_declarations_still_parse() {
    // Missing `end` on the first function; the parser should
    // resynchronize at the next `func` keyword rather than losing the
    // second declaration entirely.
    let (errors, names) = parse("func broken(): int\n    return 1\n\nfunc ok(): int\n    return 2\nend\n");
    assert!(errors.has_errors());
    assert!(names.contains(&"ok"));
}

#[test]
fn struct_with_fields_and_inline_method_parses() {
    let (errors, names) = parse(
        "struct Point\n    x: int\n    y: int\n\n    func sum(): int\n        return self.x + self.y\n    end\nend\n",
    );
    assert!(!errors.has_errors());
    assert_eq!(names, vec!["Point"]);
}

#[test]
fn interface_with_bodiless_signatures_parses() {
    let (errors, names) = parse("interface Shape\n    func area(): int\n    func perimeter(): int\nend\n");
    assert!(!errors.has_errors());
    assert_eq!(names, vec!["Shape"]);
}

#[test]
fn enum_with_bare_variants_parses() {
    let (errors, names) = parse("enum Color\n    Red\n    Green\n    Blue\nend\n");
    assert!(!errors.has_errors());
    assert_eq!(names, vec!["Color"]);
}

#[test]
fn export_prefix_is_accepted_on_any_declaration_kind() {
    let (errors, names) = parse(
        "export func f(): int return 0 end\nexport struct S x: int end\nexport const C: int = 1\n",
    );
    assert!(!errors.has_errors());
    assert_eq!(names, vec!["f", "S", "C"]);
}

#[test]
fn for_range_with_step_parses() {
    let body = first_func_body("func f(): int\n    for i in 0 until 10 step 2\n        continue\n    end\n    return 0\nend\n");
    assert!(matches!(&body.kind, NodeKind::Stmt(Stmt::For { .. })));
}

#[test]
fn match_with_cases_and_else_parses() {
    let body = first_func_body(
        "func f(x: int): int\n    match x\n    case 1\n        return 1\n    case 2\n        return 2\n    else\n        return 0\n    end\nend\n",
    );
    match &body.kind {
        NodeKind::Stmt(Stmt::Match { cases, else_body, .. }) => {
            assert_eq!(cases.len(), 2);
            assert!(!else_body.is_empty());
        }
        other => panic!("expected match statement, found {other:?}"),
    }
}
