// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use stream_sketches::*;

fn bench_update(c: &mut Criterion) {
    let words: Vec<String> = (0..1000).map(|i| format!("word_{}", i)).collect();

    let mut group = c.benchmark_group("Sketch Update");

    group.bench_function("HyperLogLog add (p=14)", |bencher| {
        let mut hll = HyperLogLog::with_precision(14).unwrap();
        bencher.iter(|| {
            for w in &words {
                hll.add(black_box(w.as_str()));
            }
        })
    });

    group.bench_function("BloomFilter add (n=10000, p=0.01)", |bencher| {
        let mut bloom = BloomFilter::new(10_000, 0.01).unwrap();
        bencher.iter(|| {
            for w in &words {
                bloom.add(black_box(w.as_str()));
            }
        })
    });

    group.bench_function("BloomFilter contains (n=10000, p=0.01)", |bencher| {
        let mut bloom = BloomFilter::new(10_000, 0.01).unwrap();
        for w in words.iter().step_by(2) {
            bloom.add(w.as_str());
        }
        bencher.iter(|| words.iter().filter(|w| bloom.contains(black_box(w.as_str()))).count())
    });

    for num_perm in [64usize, 256].iter() {
        group.bench_function(format!("MinHash update (perm={})", num_perm), |bencher| {
            let mut m = MinHash::new(*num_perm).unwrap();
            bencher.iter(|| {
                for w in &words {
                    m.update(black_box(w.as_str()));
                }
            })
        });
    }

    group.bench_function("CountMinSketch increment (2048x5)", |bencher| {
        let mut cms = CountMinSketch::new(2048, 5).unwrap();
        bencher.iter(|| {
            for w in &words {
                cms.increment(black_box(w.as_str()));
            }
        })
    });

    group.bench_function("TDigest insert (delta=0.01)", |bencher| {
        let mut td = TDigest::new(0.01).unwrap();
        let mut i = 0u64;
        bencher.iter(|| {
            i = i.wrapping_add(7919);
            td.insert(black_box((i % 100_000) as f64)).unwrap();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_update);
criterion_main!(benches);
