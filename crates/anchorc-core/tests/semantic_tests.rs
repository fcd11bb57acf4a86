//! Semantic-analyzer integration tests: implicit conversions, lvalue
//! rules, loop/match `break`/`continue` gating, and duplicate-case
//! detection. Drives the whole lex→parse→analyze pipeline over an
//! inline module, the same shape `anchorc-test-helpers::compile::type_check`
//! uses (this crate can't depend on that one back — it depends on us).

use anchorc_core::arena::Arena;
use anchorc_core::errors::Errors;
use anchorc_core::module_graph::ModuleGraph;
use anchorc_core::sema::analyzer::Analyzer;

fn type_check(source: &str) -> Result<(), Vec<String>> {
    let arena = Arena::new();
    let mut errors = Errors::new();
    let mut graph = ModuleGraph::new(&arena, std::path::Path::new("."));
    graph.load_inline("main", source, &mut errors);

    let mut analyzer = Analyzer::new(&arena, &graph, &mut errors);
    analyzer.run();

    if errors.has_errors() {
        Err(errors.into_vec().into_iter().map(|d| d.message).collect())
    } else {
        Ok(())
    }
}

#[test]
fn integer_widening_is_allowed() {
    let src = "func f(): int\n    var b: byte = 1\n    var i: int = b\n    return i\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn integer_narrowing_is_rejected_for_typed_values() {
    let src = "func f(): int\n    var l: long = 1\n    var b: byte = l\n    return 0\nend\n";
    assert!(type_check(src).is_err());
}

#[test]
fn integer_literal_narrows_implicitly_to_any_integer_type() {
    let src = "func f(): int\n    var b: byte = 200\n    return b\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn null_is_not_assignable_to_an_integer() {
    let src = "func main(): int\n    var x: int = null\n    return x\nend\n";
    let errors = type_check(src).unwrap_err();
    assert!(!errors.is_empty());
}

#[test]
fn null_is_assignable_to_any_pointer() {
    let src = "func f(): *int\n    var p: *int = null\n    return p\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn ref_widens_to_pointer_of_same_inner_type() {
    let src = "func f(): int\n    var x: int = 1\n    var r: &int = &x\n    var p: *int = r\n    return *p\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn array_is_assignable_to_matching_slice() {
    let src = "func f(): int\n    var a: int[3] = [1, 2, 3]\n    var s: int[] = a\n    return 0\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn assigning_to_a_const_is_rejected() {
    let src = "func f(): int\n    const c: int = 1\n    c = 2\n    return c\nend\n";
    assert!(type_check(src).is_err());
}

#[test]
fn arithmetic_between_mismatched_non_numeric_types_is_rejected() {
    let src = "struct S\n    x: int\nend\n\nfunc f(): int\n    var s: S = S(x = 1)\n    return s + 1\nend\n";
    assert!(type_check(src).is_err());
}

#[test]
fn comparison_requires_matching_or_numeric_operand_types() {
    let src = "func f(): bool\n    return 1 == 2\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn logical_and_requires_bool_operands() {
    let src = "func f(): bool\n    return 1 and 2\nend\n";
    assert!(type_check(src).is_err());
}

#[test]
fn while_condition_accepts_a_pointer() {
    let src = "func f(p: *int): int\n    while p\n        break\n    end\n    return 0\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn continue_inside_a_bare_match_is_rejected() {
    let src = "func f(x: int): int\n    match x\n    case 1\n        continue\n    end\n    return 0\nend\n";
    assert!(type_check(src).is_err());
}

#[test]
fn continue_inside_a_match_inside_a_loop_targets_the_loop() {
    let src = "func f(x: int): int\n    while true\n        match x\n        case 1\n            continue\n        end\n    end\n    return 0\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn break_inside_a_bare_match_is_allowed() {
    let src = "func f(x: int): int\n    match x\n    case 1\n        break\n    end\n    return 0\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn duplicate_match_case_values_are_rejected() {
    let src = "func f(x: int): int\n    match x\n    case 1\n        return 1\n    case 1\n        return 2\n    end\n    return 0\nend\n";
    assert!(type_check(src).is_err());
}

#[test]
fn for_range_bounds_must_be_integers() {
    let src = "func f(): int\n    for i in true until 10\n        continue\n    end\n    return 0\nend\n";
    assert!(type_check(src).is_err());
}

#[test]
fn struct_method_call_through_self_type_checks() {
    let src = "struct Point\n    x: int\n    y: int\n\n    func sum(): int\n        return self.x + self.y\n    end\nend\n\nfunc f(): int\n    var p: Point = Point(x = 1, y = 2)\n    return p.sum()\nend\n";
    assert!(type_check(src).is_ok());
}

#[test]
fn duplicate_top_level_name_in_one_module_is_rejected() {
    let src = "func f(): int return 1 end\nfunc f(): int return 2 end\n";
    assert!(type_check(src).is_err());
}

#[test]
fn interface_satisfaction_requires_matching_method_arity() {
    let src = r#"interface Shape
    func area(a: int): int
end

struct Square
    side: int

    func area(): int
        return self.side * self.side
    end
end

func describe(s: &Shape): int
    return 0
end

func main(): int
    var sq: Square = Square(side = 2)
    return describe(&sq)
end
"#;
    assert!(type_check(src).is_err());
}
