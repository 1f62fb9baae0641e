//! Matching throughput benchmarks.
//!
//! These benchmarks measure how index build time and scan throughput behave
//! as the pattern catalog grows, validating that per-string matching stays
//! flat while the catalog scales by orders of magnitude.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use phrase_engine::{EngineOptions, MatchContext, PhraseIndex};

/// Generate a synthetic catalog of multi-word patterns.
fn generate_patterns(count: usize) -> Vec<String> {
    let adjectives = [
        "quick", "lazy", "bright", "silent", "golden", "hidden", "rapid", "frozen",
    ];
    let nouns = [
        "river", "mountain", "engine", "harbor", "signal", "market", "garden", "bridge",
    ];

    (0..count)
        .map(|i| {
            let adjective = adjectives[i % adjectives.len()];
            let noun = nouns[(i / adjectives.len()) % nouns.len()];
            if i % 3 == 0 {
                format!("{adjective} {noun} zone{i}\tREF{i}\tcat{}", i % 10)
            } else {
                format!("{adjective} zone{i} {noun}\tREF{i}\tcat{}", i % 10)
            }
        })
        .collect()
}

fn build_index(patterns: &[String]) -> PhraseIndex {
    let options = EngineOptions::default();
    let mut index = PhraseIndex::new();
    for pattern in patterns {
        index.add_pattern(pattern, &options).unwrap();
    }
    index.prepare_for_matching().unwrap();
    index
}

/// Inputs with a realistic mix of hits and misses.
fn generate_inputs(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 4 {
            0 => format!("the quick river flows through zone{} today", i % 1000),
            1 => format!("nothing interesting on line {i} at all"),
            2 => format!("bright zone{} mountain panorama", i % 1000),
            _ => "completely unrelated text with many ordinary words inside".to_string(),
        })
        .collect()
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_build");

    for &size in &[1_000usize, 10_000, 50_000] {
        let patterns = generate_patterns(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &patterns, |b, patterns| {
            b.iter(|| {
                let index = build_index(black_box(patterns));
                black_box(index.pattern_count())
            });
        });
    }

    group.finish();
}

fn bench_match_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_throughput");
    let inputs = generate_inputs(1_000);

    for &size in &[1_000usize, 10_000, 100_000] {
        let index = build_index(&generate_patterns(size));
        let options = EngineOptions::new().with_matching_substring(true);

        group.throughput(Throughput::Elements(inputs.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &index,
            |b, index| {
                let mut ctx = MatchContext::new();
                b.iter(|| {
                    let mut total = 0usize;
                    for input in &inputs {
                        total += index.match_str(black_box(input), &options, &mut ctx).len();
                    }
                    black_box(total)
                });
            },
        );
    }

    group.finish();
}

fn bench_context_reuse(c: &mut Criterion) {
    let index = build_index(&generate_patterns(10_000));
    let options = EngineOptions::new().with_matching_substring(true);
    let input = "the quick river flows through zone42 today";

    let mut group = c.benchmark_group("context");

    group.bench_function("reused", |b| {
        let mut ctx = MatchContext::new();
        b.iter(|| black_box(index.match_str(black_box(input), &options, &mut ctx)));
    });

    group.bench_function("fresh_per_call", |b| {
        b.iter(|| {
            let mut ctx = MatchContext::new();
            black_box(index.match_str(black_box(input), &options, &mut ctx))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_index_build,
    bench_match_throughput,
    bench_context_reuse
);
criterion_main!(benches);
