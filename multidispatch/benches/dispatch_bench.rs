//! Resolution benchmarks using criterion.
//!
//! Measures a full call (strategy, scan, invoke) as method tables and type
//! hierarchies grow.
//!
//! Run with: cargo bench --bench dispatch_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use multidispatch::{
    args, single_type_dispatch, type_dispatch, DispatchPattern, MultiMethod, TypeKey,
    TypeRegistry, ANYTHING, DEFAULT,
};

const LEVELS: [&str; 16] = [
    "l0", "l1", "l2", "l3", "l4", "l5", "l6", "l7", "l8", "l9", "l10", "l11", "l12", "l13",
    "l14", "l15",
];

/// A linear hierarchy `l15 <: l14 <: ... <: l0`.
fn chain(depth: usize) -> TypeRegistry {
    let registry = TypeRegistry::new();
    for pair in LEVELS[..depth].windows(2) {
        registry
            .declare(TypeKey::named(pair[1]), TypeKey::named(pair[0]))
            .expect("chain is acyclic");
    }
    registry
}

/// Benchmark dispatch on one type argument across a table of N unrelated
/// tags that the argument never matches.
fn bench_flat_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_table");

    for size in [1_usize, 4, 16] {
        let mm = MultiMethod::<usize>::new("flat", single_type_dispatch);
        for (i, level) in LEVELS[..size].iter().enumerate() {
            mm.register(DispatchPattern::named(*level), move |_| i);
        }
        mm.register(DispatchPattern::of::<u64>(), |_| usize::MAX);
        mm.register(DEFAULT, |_| 0);

        group.bench_with_input(BenchmarkId::new("invoke", size), &size, |b, _| {
            let n = 7_u64;
            b.iter(|| black_box(mm.invoke(&args![&n]).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark the preference walk on deep hierarchies.
fn bench_deep_hierarchy(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_hierarchy");

    for depth in [2_usize, 8, 16] {
        let mm = MultiMethod::<usize>::builder("deep")
            .strategy(|call: &multidispatch::CallArgs<'_>| {
                call.get::<TypeKey>(0)
                    .map(|key| DispatchPattern::Type(*key))
                    .ok_or(multidispatch::StrategyError::MissingArgument { index: 0 })
            })
            .hierarchy(chain(depth))
            .build()
            .expect("strategy supplied");
        for (i, level) in LEVELS[..depth].iter().enumerate() {
            mm.register(DispatchPattern::named(*level), move |_| i);
        }
        let leaf = TypeKey::named(LEVELS[depth - 1]);

        group.bench_with_input(BenchmarkId::new("invoke", depth), &depth, |b, _| {
            b.iter(|| black_box(mm.invoke(&args![&leaf]).unwrap()));
        });
    }

    group.finish();
}

/// Benchmark multi-argument dispatch with wildcards.
fn bench_tuple_patterns(c: &mut Criterion) {
    let mm = MultiMethod::<u8>::new("pairs", type_dispatch);
    mm.register(DispatchPattern::types([TypeKey::of::<u8>(), TypeKey::of::<u16>()]), |_| 1);
    mm.register(DispatchPattern::tuple([ANYTHING, DispatchPattern::of::<u32>()]), |_| 2);
    mm.register(DispatchPattern::tuple([DispatchPattern::of::<u32>(), ANYTHING]), |_| 3);
    mm.register(DEFAULT, |_| 0);

    let (a, b) = (1_u32, 2_u64);
    c.bench_function("tuple_patterns", |bench| {
        bench.iter(|| black_box(mm.invoke(&args![&a, &b]).unwrap()));
    });
}

criterion_group!(benches, bench_flat_table, bench_deep_hierarchy, bench_tuple_patterns);
criterion_main!(benches);
