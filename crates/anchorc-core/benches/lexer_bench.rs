use anchorc_core::errors::Errors;
use anchorc_core::lexer::Lexer;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_lexer_simple(c: &mut Criterion) {
    let source = r#"
        const x: int = 42
        const y: string = "hello"
        func add(a: int, b: int): int
            return a + b
        end
    "#;

    c.bench_function("lexer_simple", |b| {
        b.iter(|| {
            let mut errors = Errors::new();
            Lexer::tokenize(black_box(source), &mut errors)
        })
    });
}

fn bench_lexer_struct(c: &mut Criterion) {
    let source = r#"
        struct Point
            x: int
            y: int
            func sum(): int
                return self.x + self.y
            end
        end
    "#;

    c.bench_function("lexer_struct", |b| {
        b.iter(|| {
            let mut errors = Errors::new();
            Lexer::tokenize(black_box(source), &mut errors)
        })
    });
}

fn bench_lexer_size_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_scaling");
    for size in [10, 50, 100, 500].iter() {
        let source: String = (0..*size)
            .map(|i| format!("const var{i}: int = {i}\n"))
            .collect();
        group.bench_with_input(
            criterion::BenchmarkId::from_parameter(size),
            &source,
            |b, source| {
                b.iter(|| {
                    let mut errors = Errors::new();
                    Lexer::tokenize(black_box(source), &mut errors)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_lexer_simple, bench_lexer_struct, bench_lexer_size_scaling);
criterion_main!(benches);
