use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use logomatch::hamming::{hamming_32, hamming_naive, knn_hamming};
use rand::prelude::*;

fn bench_hamming(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hamming");
    let mut rng = rand::rng();
    let mut src = vec![0u8; 32];
    let mut dst = vec![0u8; 8 << 20];
    rng.fill_bytes(&mut src);
    rng.fill_bytes(&mut dst);

    group.throughput(Throughput::Bytes(dst.len() as u64));
    group.bench_function("hamming_32_naive", |b| {
        b.iter(|| {
            dst.chunks_exact(black_box(32))
                .map(|chunk| hamming_naive::<32>(&src, chunk))
                .sum::<u32>()
        });
    });
    group.bench_function("hamming_32_unrolled", |b| {
        b.iter(|| dst.chunks_exact(32).map(|chunk| hamming_32(&src, chunk)).sum::<u32>());
    });
    group.finish();
}

fn bench_hamming_knn(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hamming KNN");
    let mut rng = rand::rng();
    let mut src = [0u8; 32];
    let mut dst = vec![[0u8; 32]; 1 << 16];
    rng.fill_bytes(&mut src);
    dst.iter_mut().for_each(|d| rng.fill_bytes(d));

    group.throughput(Throughput::Elements(dst.len() as u64));
    group.bench_function("k=2", |b| {
        b.iter(|| knn_hamming::<32>(&src, &dst, black_box(2)));
    });
    group.finish();
}

criterion_group!(benches, bench_hamming, bench_hamming_knn);
criterion_main!(benches);
