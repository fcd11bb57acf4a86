use anchorc_core::arena::Arena;
use anchorc_core::errors::Errors;
use anchorc_core::parser::Parser;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_parser_function(c: &mut Criterion) {
    let source = r#"
        func add(a: int, b: int): int
            return a + b
        end
    "#;

    c.bench_function("parser_function", |b| {
        b.iter(|| {
            let arena = Arena::new();
            let mut errors = Errors::new();
            Parser::parse(&arena, &mut errors, black_box(source))
        })
    });
}

fn bench_parser_struct_and_interface(c: &mut Criterion) {
    let source = r#"
        interface Printable
            func print()
        end

        struct Doc
            title: string
            func print()
                return
            end
        end

        func run(x: &Printable)
            x.print()
        end
    "#;

    c.bench_function("parser_struct_and_interface", |b| {
        b.iter(|| {
            let arena = Arena::new();
            let mut errors = Errors::new();
            Parser::parse(&arena, &mut errors, black_box(source))
        })
    });
}

fn bench_parser_size_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_scaling");
    for size in [10, 50, 100].iter() {
        let source: String = (0..*size)
            .map(|i| format!("func f{i}(a: int): int return a end\n"))
            .collect();
        group.bench_with_input(
            criterion::BenchmarkId::from_parameter(size),
            &source,
            |b, source| {
                b.iter(|| {
                    let arena = Arena::new();
                    let mut errors = Errors::new();
                    Parser::parse(&arena, &mut errors, black_box(source))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parser_function,
    bench_parser_struct_and_interface,
    bench_parser_size_scaling
);
criterion_main!(benches);
