//! Benchmarks for the Rain foundation layer.
//!
//! Run with: `cargo bench --package rain_foundation`

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use rain_foundation::TypeTag;
use rain_foundation::abi::{HASH_SIZE, key_hash, probe};

fn bench_key_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("abi/key_hash");

    group.bench_function("int", |b| {
        b.iter(|| black_box(key_hash(TypeTag::Int, black_box(42), None)));
    });

    for len in [8usize, 64, 512] {
        let text = "x".repeat(len);
        group.bench_with_input(BenchmarkId::new("str", len), &text, |b, text| {
            b.iter(|| black_box(key_hash(TypeTag::Str, 0, Some(text.as_bytes()))));
        });
    }

    group.finish();
}

fn bench_probe(c: &mut Criterion) {
    c.bench_function("abi/probe_full_scan", |b| {
        b.iter(|| black_box(probe(black_box(17), HASH_SIZE).sum::<usize>()));
    });
}

criterion_group!(benches, bench_key_hash, bench_probe);
criterion_main!(benches);
