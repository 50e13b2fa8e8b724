// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Accuracy guarantees of each sketch, checked empirically with fixed seeds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stream_sketches::*;

fn random_u64s(seed: u64, n: usize) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.random::<u64>()).collect()
}

/// `n` evenly spaced points in (0, 1), visited in a scrambled order.
fn scrambled_uniform(n: usize, stride: usize) -> Vec<f64> {
    (0..n)
        .map(|i| ((i * stride) % n) as f64 + 0.5)
        .map(|x| x / n as f64)
        .collect()
}

#[test]
fn test_hyperloglog_error_bound() {
    for trial in 0..5 {
        let mut hll = HyperLogLog::new(0.01).unwrap();
        for x in random_u64s(trial, 10_000) {
            hll.add(&x);
        }
        let count = hll.count();
        assert!((9700..=10300).contains(&count), "trial {} count {}", trial, count);
    }
}

#[test]
fn test_hyperloglog_large_cardinality() {
    let mut hll = HyperLogLog::with_precision(12).unwrap();
    for x in random_u64s(99, 200_000) {
        hll.add(&x);
    }
    // Past the linear-counting range; 3x the standard error of 1.6%
    let err = (hll.estimate() - 200_000.0).abs() / 200_000.0;
    assert!(err < 3.0 * hll.relative_error(), "relative error {}", err);
}

#[test]
fn test_hyperloglog_merge_disjoint_streams() {
    let mut a = HyperLogLog::new(0.01).unwrap();
    let mut b = HyperLogLog::new(0.01).unwrap();
    for x in random_u64s(1, 4000) {
        a.add(&x);
    }
    for x in random_u64s(2, 6000) {
        b.add(&x);
    }
    a.merge(&b).unwrap();
    let count = a.count();
    assert!((9700..=10300).contains(&count), "merged count {}", count);
}

#[test]
fn test_bloom_no_false_negatives_across_configs() {
    for &(capacity, rate) in &[(10, 0.5), (100, 0.1), (1000, 0.01), (5000, 0.0001)] {
        let mut bloom = BloomFilter::new(capacity, rate).unwrap();
        let items: Vec<String> = (0..capacity * 2).map(|i| format!("item-{}", i)).collect();
        for item in &items {
            bloom.add(item.as_str());
        }
        assert!(items.iter().all(|item| bloom.contains(item.as_str())));
    }
}

#[test]
fn test_bloom_false_positive_rate() {
    let mut bloom = BloomFilter::new(10_000, 0.001).unwrap();
    for i in 0..5_000u64 {
        bloom.add(&i);
    }
    let probes = 100_000u64;
    let false_positives = (1_000_000..1_000_000 + probes)
        .filter(|i| bloom.contains(i))
        .count();
    let observed = false_positives as f64 / probes as f64;
    assert!(observed <= 0.01, "observed false positive rate {}", observed);
    assert!(bloom.current_false_positive_rate() < 0.001);
}

#[test]
fn test_minhash_converges_with_more_permutations() {
    // |A ∩ B| = 100, |A ∪ B| = 200
    let truth = 0.5;
    let mean_error = |num_perm: usize| -> f64 {
        let total: f64 = (0..10u64)
            .map(|seed| {
                let mut a = MinHash::with_seed(num_perm, seed).unwrap();
                let mut b = MinHash::with_seed(num_perm, seed).unwrap();
                for i in 0..150u32 {
                    a.update(&i);
                }
                for i in 50..200u32 {
                    b.update(&i);
                }
                (a.jaccard(&b).unwrap() - truth).abs()
            })
            .sum();
        total / 10.0
    };

    let coarse = mean_error(16);
    let fine = mean_error(512);
    assert!(fine < coarse, "fine {} coarse {}", fine, coarse);
    assert!(fine < 0.04, "mean error at 512 permutations {}", fine);
}

#[test]
fn test_minhash_disjoint_sets() {
    let mut a = MinHash::new(256).unwrap();
    let mut b = MinHash::new(256).unwrap();
    for i in 0..500u32 {
        a.update(&i);
        b.update(&(i + 10_000));
    }
    assert!(a.jaccard(&b).unwrap() < 0.05);
}

#[test]
fn test_count_min_never_underestimates() {
    let mut cms = CountMinSketch::new(50, 3).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    let mut truth = vec![0u64; 500];
    for _ in 0..20_000 {
        let item = rng.random_range(0..500usize);
        truth[item] += 1;
        cms.increment(&item);
    }
    for (item, &count) in truth.iter().enumerate() {
        assert!(cms.estimate(&item) >= count);
    }
    assert_eq!(cms.total(), 20_000);
}

#[test]
fn test_count_min_heavy_hitters_are_near_exact() {
    let distinct = 100u32;
    let mut cms = CountMinSketch::new(3 * distinct as usize, 4).unwrap();
    for item in 0..distinct {
        let count = if item < 5 { 1000 } else { (item % 5 + 1) as i64 };
        cms.update(&item, count).unwrap();
    }
    for item in 0..5u32 {
        let est = cms.estimate(&item);
        assert!((1000..=1010).contains(&est), "item {} estimate {}", item, est);
    }
}

#[test]
fn test_tdigest_uniform_quantiles() {
    let mut td = TDigest::new(0.01).unwrap();
    td.add_batch(scrambled_uniform(1000, 919)).unwrap();

    for &q in &[0.05, 0.5, 0.95] {
        let est = td.quantile(q).unwrap();
        assert!((est - q).abs() <= 0.02, "q {} estimate {}", q, est);
    }
}

#[test]
fn test_tdigest_quantile_is_monotone() {
    let mut td = TDigest::with_params(0.05, 5, 11).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..5000 {
        let x: f64 = rng.random();
        td.insert(x * x * 100.0).unwrap();
    }

    let mut prev = f64::NEG_INFINITY;
    for i in 0..=200 {
        let est = td.quantile(i as f64 / 200.0).unwrap();
        assert!(est >= prev, "quantile decreased at step {}", i);
        prev = est;
    }
}

#[test]
fn test_tdigest_large_stream_stays_bounded() {
    let n = 20_000;
    let mut td = TDigest::new(0.01).unwrap();
    td.add_batch(scrambled_uniform(n, 7919)).unwrap();

    assert_eq!(td.total_weight(), n as f64);
    assert!(td.centroid_count() < n / 4, "{} centroids", td.centroid_count());

    let median = td.quantile(0.5).unwrap();
    assert!((median - 0.5).abs() < 0.015, "median {}", median);

    // Tail centroids stay tiny, so extreme quantiles are sharper than the median
    let low = td.quantile(0.001).unwrap();
    let high = td.quantile(0.999).unwrap();
    assert!((low - 0.001).abs() < 0.002, "q0.001 {}", low);
    assert!((high - 0.999).abs() < 0.002, "q0.999 {}", high);
}
