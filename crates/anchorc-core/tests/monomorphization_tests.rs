//! Generic monomorphization: instantiation dedup, self-referential
//! generic termination, and mangled-name shape. Drives the same
//! lex→parse→analyze pipeline as `semantic_tests.rs` and inspects the
//! `Instantiation`s recorded on the callsite module afterward.

use anchorc_core::arena::Arena;
use anchorc_core::errors::Errors;
use anchorc_core::module_graph::{InstantiationKind, ModuleGraph};
use anchorc_core::sema::analyzer::Analyzer;

fn analyze(source: &str) -> (Errors, Vec<String>) {
    let arena = Arena::new();
    let mut errors = Errors::new();
    let mut graph = ModuleGraph::new(&arena, std::path::Path::new("."));
    let id = graph.load_inline("main", source, &mut errors);

    let mut analyzer = Analyzer::new(&arena, &graph, &mut errors);
    analyzer.run();

    let names = graph.get(id).instantiations.borrow().iter().map(|i| i.mangled_name.clone()).collect();
    (errors, names)
}

#[test]
fn two_callsites_requesting_the_same_generic_struct_produce_one_instantiation() {
    let src = "struct Box[T]\n    value: T\nend\n\n\
               func f(): int\n    var a: Box[int] = Box[int](value = 1)\n    var b: Box[int] = Box[int](value = 2)\n    return a.value + b.value\nend\n";
    let (errors, instantiations) = analyze(src);
    assert!(!errors.has_errors(), "unexpected errors: {:?}", errors.into_vec());
    let box_int_count = instantiations.iter().filter(|n| n.starts_with("Box__")).count();
    assert_eq!(box_int_count, 1, "expected exactly one Box[int] instantiation, found {instantiations:?}");
}

#[test]
fn distinct_type_arguments_produce_distinct_instantiations() {
    let src = "struct Box[T]\n    value: T\nend\n\n\
               func f(): int\n    var a: Box[int] = Box[int](value = 1)\n    var b: Box[byte] = Box[byte](value = 2)\n    return a.value\nend\n";
    let (errors, instantiations) = analyze(src);
    assert!(!errors.has_errors(), "unexpected errors: {:?}", errors.into_vec());
    assert_eq!(instantiations.len(), 2);
    assert_ne!(instantiations[0], instantiations[1]);
}

#[test]
fn self_referential_generic_struct_terminates() {
    // `Node[T]` holds a pointer back to itself; instantiating `Node[int]`
    // must not recurse forever resolving its own `next` field.
    let src = "struct Node[T]\n    value: T\n    next: *Node[T]\nend\n\n\
               func f(): int\n    var n: Node[int] = Node[int](value = 1, next = null)\n    return n.value\nend\n";
    let (errors, instantiations) = analyze(src);
    assert!(!errors.has_errors(), "unexpected errors: {:?}", errors.into_vec());
    assert_eq!(instantiations.iter().filter(|n| n.starts_with("Node__")).count(), 1);
}

#[test]
fn generic_function_instantiation_is_cached_across_callsites() {
    let src = "func identity[T](x: T): T\n    return x\nend\n\n\
               func f(): int\n    var a: int = identity[int](1)\n    var b: int = identity[int](2)\n    return a + b\nend\n";
    let (errors, instantiations) = analyze(src);
    assert!(!errors.has_errors(), "unexpected errors: {:?}", errors.into_vec());
    let identity_count = instantiations.iter().filter(|n| n.starts_with("identity__")).count();
    assert_eq!(identity_count, 1);
}

#[test]
fn generic_method_on_a_monomorphized_struct_is_recorded_as_a_method_instantiation() {
    // Generic methods have no explicit type-argument call syntax; `U` is
    // inferred from `extra`'s argument type, same as a generic function.
    let src = "struct Wrapper[T]\n    value: T\n\n    func get[U](extra: U): T\n        return self.value\n    end\nend\n\n\
               func f(): int\n    var w: Wrapper[int] = Wrapper[int](value = 1)\n    return w.get(2)\nend\n";
    let arena = Arena::new();
    let mut errors = Errors::new();
    let mut graph = ModuleGraph::new(&arena, std::path::Path::new("."));
    let id = graph.load_inline("main", src, &mut errors);
    let mut analyzer = Analyzer::new(&arena, &graph, &mut errors);
    analyzer.run();
    assert!(!errors.has_errors(), "unexpected errors: {:?}", errors.into_vec());

    let insts = graph.get(id).instantiations.borrow();
    assert!(insts.iter().any(|i| matches!(i.kind, InstantiationKind::Method { .. })));
}

#[test]
fn generic_struct_with_mismatched_type_argument_count_is_rejected() {
    let src = "struct Pair[A, B]\n    first: A\n    second: B\nend\n\n\
               func f(): int\n    var p: Pair[int] = Pair[int](first = 1)\n    return 0\nend\n";
    let (errors, _) = analyze(src);
    assert!(errors.has_errors());
}
