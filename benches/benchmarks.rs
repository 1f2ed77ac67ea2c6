use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use symdel::test::*;
use symdel::*;

pub fn benchmarks(c: &mut Criterion) {
    let inputs: &[&str] = &["a", "rat", "houses", "benchmarking"];

    let mut group = c.benchmark_group("variant_enumeration");
    for input in inputs {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("edits_prefix", format!("input {} chars", input.chars().count())),
            input,
            |b, input| b.iter(|| edits_prefix(black_box(input), 2, 7)),
        );
    }
    group.finish();

    let model = get_test_model();
    let queries: &[&str] = &["teh", "memebers", "qick", "wrld"];

    let mut group = c.benchmark_group("lookup");
    for distance in 1..=2usize {
        for query in queries {
            group.bench_with_input(
                BenchmarkId::new(format!("distance{}", distance), *query),
                query,
                |b, query| {
                    let params = LookupParams::default()
                        .with_verbosity(Verbosity::Top)
                        .with_max_edit_distance(distance);
                    b.iter(|| model.lookup(black_box(query), &params).expect("lookup"))
                },
            );
        }
    }
    group.finish();

    let phrases: &[&str] = &["thequickbrownfox", "thequickbrownfoxjumpsoverthelazydog"];

    let mut group = c.benchmark_group("segmentation");
    for phrase in phrases {
        group.throughput(Throughput::Bytes(phrase.len() as u64));
        group.bench_with_input(
            BenchmarkId::new(
                "word_segmentation",
                format!("input {} chars", phrase.chars().count()),
            ),
            phrase,
            |b, phrase| {
                b.iter(|| {
                    model
                        .word_segmentation(black_box(phrase), &SegmentParams::default())
                        .expect("segmentation")
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
