use anchorc_core::arena::Arena;
use anchorc_core::errors::Errors;
use anchorc_core::module_graph::ModuleGraph;
use anchorc_core::sema::analyzer::Analyzer;
use criterion::{criterion_group, criterion_main, Criterion};

const GENERIC_FUNC_SOURCE: &str = r#"
    func max[T](a: T, b: T): T
        if a > b
            return a
        else
            return b
        end
    end

    func user(): int
        var a: int = max(1, 2)
        var b: float = max(1.0, 2.0)
        return a
    end
"#;

const GENERIC_STRUCT_SOURCE: &str = r#"
    struct Node[T]
        value: T
        next: *Node[T]
    end

    func use_node(): int
        var n: Node[int] = Node(value = 1, next = null)
        return n.value
    end
"#;

fn bench_monomorphize_generic_func(c: &mut Criterion) {
    c.bench_function("monomorphize_generic_func", |b| {
        b.iter(|| {
            let arena = Arena::new();
            let mut errors = Errors::new();
            let mut graph = ModuleGraph::new(&arena, std::path::Path::new("."));
            graph.load_inline("main", GENERIC_FUNC_SOURCE, &mut errors);
            let mut analyzer = Analyzer::new(&arena, &graph, &mut errors);
            analyzer.run();
        })
    });
}

fn bench_monomorphize_self_referential_generic(c: &mut Criterion) {
    c.bench_function("monomorphize_self_referential_generic", |b| {
        b.iter(|| {
            let arena = Arena::new();
            let mut errors = Errors::new();
            let mut graph = ModuleGraph::new(&arena, std::path::Path::new("."));
            graph.load_inline("main", GENERIC_STRUCT_SOURCE, &mut errors);
            let mut analyzer = Analyzer::new(&arena, &graph, &mut errors);
            analyzer.run();
        })
    });
}

criterion_group!(
    benches,
    bench_monomorphize_generic_func,
    bench_monomorphize_self_referential_generic
);
criterion_main!(benches);
