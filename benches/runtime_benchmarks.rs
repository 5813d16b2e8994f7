//! Performance benchmarks for compiling and interpreting Zinc programs.
//!
//! Interpretation benchmarks compile once and re-run the same chunk, which
//! resets the virtual machine each time.
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to collect per-phase timings:
//!
//! ```bash
//! cargo bench --bench runtime_benchmarks --features profile-with-puffin -- --profile-time 5
//! ```

use bumpalo::Bump;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::io;
use zinc::{Chunk, Parser, ParserKind, VirtualMachine, compile};

#[cfg(feature = "profile-with-puffin")]
use std::collections::HashMap;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

/// Initialize puffin profiler.
#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

/// Call at the end of each benchmark iteration to flush profiling data.
#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// Print the total time recorded under each top-level scope.
#[cfg(feature = "profile-with-puffin")]
fn print_profiling_stats() {
    use puffin::Reader;

    let Some(frame_view) = FRAME_VIEW.get() else {
        println!("Profiler not initialized");
        return;
    };

    let view = frame_view.lock();
    let scope_collection = view.scope_collection();
    let mut scope_timings: HashMap<String, i64> = HashMap::new();
    let mut frame_count = 0i64;

    for frame in view.recent_frames() {
        frame_count += 1;
        let Ok(unpacked) = frame.unpacked() else {
            continue;
        };
        for (_thread_info, stream_info) in unpacked.thread_streams.iter() {
            let reader = Reader::from_start(&stream_info.stream);
            let Ok(scopes) = reader.read_top_scopes() else {
                continue;
            };
            for scope in scopes {
                if let Some(details) = scope_collection.fetch_by_id(&scope.id) {
                    *scope_timings.entry(details.name().to_string()).or_insert(0) +=
                        scope.record.duration_ns;
                }
            }
        }
    }

    println!("\n=== Profiling Summary ({frame_count} frames) ===");
    let mut entries: Vec<_> = scope_timings.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    for (name, ns) in entries {
        let avg = ns / frame_count.max(1);
        println!(
            "  {:30} {:>10.2?} avg",
            name,
            std::time::Duration::from_nanos(avg as u64)
        );
    }
    println!("=====================================\n");
}

#[cfg(not(feature = "profile-with-puffin"))]
fn print_profiling_stats() {}

fn compile_source(source: &str) -> Chunk {
    let arena = Bump::new();
    let program = Parser::parse(source, &arena, ParserKind::Pratt).unwrap();
    compile(&program).unwrap()
}

/// Benchmark parse + resolve + emit.
fn compile_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("runtime/compile");

    for (name, source) in [
        ("structs", include_str!("../test_scripts/structs.zn")),
        ("closures", include_str!("../test_scripts/closures.zn")),
        ("many_functions", include_str!("../test_scripts/performance/many_functions.zn")),
    ] {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let arena = Bump::new();
                let program = Parser::parse(black_box(source), &arena, ParserKind::Pratt).unwrap();
                let chunk = compile(&program).unwrap();
                end_profiling_frame();
                black_box(chunk.len())
            });
        });
    }

    group.finish();
    print_profiling_stats();
}

/// Benchmark re-interpreting one compiled chunk.
fn interpret_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("runtime/interpret");

    for (name, source) in [
        ("short_circuit", include_str!("../test_scripts/short_circuit.zn")),
        ("structs", include_str!("../test_scripts/structs.zn")),
        ("many_functions", include_str!("../test_scripts/performance/many_functions.zn")),
    ] {
        let chunk = compile_source(source);
        let mut vm = VirtualMachine::default();
        group.bench_function(name, |b| {
            b.iter(|| {
                vm.interpret(black_box(&chunk), &mut io::sink()).unwrap();
                end_profiling_frame();
                black_box(vm.stack().len())
            });
        });
    }

    group.finish();
    print_profiling_stats();
}

criterion_group!(benches, compile_benchmarks, interpret_benchmarks);
criterion_main!(benches);
