use criterion::{criterion_group, criterion_main, Criterion};
use repair_core::rep::Backend;
use repair_core::{
    AtomId, ContentDigest, EvalContext, LineProgram, RepairConfig, Representation, TestCache,
    TestCase, Variant,
};

fn program_text(lines: usize) -> String {
    (1..=lines).map(|i| format!("\tmovl ${}, %eax\n", i)).collect()
}

fn id(n: usize) -> AtomId {
    AtomId::new(n).unwrap()
}

fn bench_cache(c: &mut Criterion) {
    let mut cache = TestCache::new(std::env::temp_dir().join("repair-bench.cache"));
    let digests: Vec<ContentDigest> = (0..1000)
        .map(|i| ContentDigest::of(format!("variant-{}", i)))
        .collect();
    for (i, digest) in digests.iter().enumerate() {
        cache.add(*digest, TestCase::Positive(1), i % 2 == 0);
    }

    let source = program_text(500);
    c.bench_function("digest_500_lines", |b| b.iter(|| ContentDigest::of(&source)));

    c.bench_function("cache_query_hit", |b| {
        b.iter(|| cache.query(&digests[500], TestCase::Positive(1)))
    });

    c.bench_function("cache_query_miss", |b| {
        b.iter(|| cache.query(&digests[500], TestCase::Negative(1)))
    });
}

fn bench_mutation(c: &mut Criterion) {
    let source = program_text(500);
    let program = LineProgram::parse(&source).unwrap();
    c.bench_function("render_500_lines", |b| b.iter(|| program.render()));

    let config = RepairConfig {
        use_cache: false,
        ..RepairConfig::default()
    };
    let mut original = Variant::<LineProgram>::from_source(EvalContext::new(config), &source).unwrap();
    original.compute_fault_localization().unwrap();

    c.bench_function("copy_and_mutate_500_lines", |b| {
        b.iter(|| {
            let mut variant = original.copy();
            variant.append(id(10), id(400)).unwrap();
            variant.swap(id(20), id(300)).unwrap();
            variant.delete(id(250)).unwrap();
            variant
        })
    });
}

criterion_group!(benches, bench_cache, bench_mutation);
criterion_main!(benches);
