//! Heap allocation profiler using `dhat`.
//!
//! The arena itself never frees until reset/drop, so the interesting
//! allocations to watch are the ones that *don't* go through it: the
//! `String`s the C backend builds line by line, and the `HashMap`s the
//! monomorphization cache and check-context scope stack allocate per
//! function body.
//!
//! ```bash
//! cargo run --release --example profile_allocations -p anchorc-core
//! ```
//! Output: `dhat-heap.json` (open with
//! <https://nnethercote.github.io/dh_view/dh_view.html>).

use anchorc_core::arena::Arena;
use anchorc_core::codegen::Emitter;
use anchorc_core::errors::Errors;
use anchorc_core::module_graph::ModuleGraph;
use anchorc_core::sema::analyzer::Analyzer;

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

const SOURCE: &str = r#"
    struct Point
        x: int
        y: int
        func sum(): int
            return self.x + self.y
        end
    end

    func max[T](a: T, b: T): T
        if a > b
            return a
        else
            return b
        end
    end

    func main(): int
        var p: Point = Point(x = 1, y = 2)
        var s: int = p.sum()
        var biggest: int = max(s, 10)
        return biggest
    end
"#;

fn main() {
    let _profiler = dhat::Profiler::new_heap();

    let arena = Arena::new();
    let mut errors = Errors::new();
    let mut graph = ModuleGraph::new(&arena, std::path::Path::new("."));
    let entry = graph.load_inline("main", SOURCE, &mut errors);

    let mut analyzer = Analyzer::new(&arena, &graph, &mut errors);
    analyzer.run();

    if errors.has_errors() {
        for d in errors.iter() {
            eprintln!("{}: {}", d.span, d.message);
        }
        std::process::exit(1);
    }

    let emitter = Emitter::new("demo", &graph);
    let files = emitter.emit_all(entry);
    println!("emitted {} file(s), {} bytes in the arena", files.len(), arena.allocated_bytes());
}
