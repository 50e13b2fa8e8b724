// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use proptest::prelude::*;
use stream_sketches::*;

// ============================================================================
// Strategies
// ============================================================================

fn arb_items() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..500, 0..40)
}

fn arb_hyperloglog() -> impl Strategy<Value = HyperLogLog> {
    arb_items().prop_map(|items| {
        let mut hll = HyperLogLog::with_precision(8).unwrap();
        for item in &items {
            hll.add(item);
        }
        hll
    })
}

fn arb_bloom() -> impl Strategy<Value = BloomFilter> {
    arb_items().prop_map(|items| {
        let mut bloom = BloomFilter::new(100, 0.05).unwrap();
        for item in &items {
            bloom.add(item);
        }
        bloom
    })
}

fn arb_minhash() -> impl Strategy<Value = MinHash> {
    arb_items().prop_map(|items| {
        let mut m = MinHash::new(32).unwrap();
        for item in &items {
            m.update(item);
        }
        m
    })
}

fn arb_count_min() -> impl Strategy<Value = CountMinSketch> {
    prop::collection::vec((0u32..500, 1i64..20), 0..40).prop_map(|updates| {
        let mut cms = CountMinSketch::new(32, 3).unwrap();
        for (item, count) in &updates {
            cms.update(item, *count).unwrap();
        }
        cms
    })
}

fn arb_samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1000.0f64..1000.0, 1..200)
}

/// Few distinct values, so many centroids share a mean.
fn arb_repeated_samples() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((0u32..10).prop_map(f64::from), 1..300)
}

fn arb_compression() -> impl Strategy<Value = f64> {
    prop::sample::select(vec![1.0, 0.5, 0.2, 0.1, 0.05])
}

// ============================================================================
// Merge laws
// ============================================================================

macro_rules! test_properties {
    ($type:ident, $arb:expr) => {
        paste::paste! {
            proptest! {
                #[test]
                fn [< $type:lower _idempotence >](a in $arb) {
                    let mut a1 = a.clone();
                    a1.merge(&a).unwrap();
                    prop_assert_eq!(a1, a);
                }

                #[test]
                fn [< $type:lower _commutativity >](a in $arb, b in $arb) {
                    let mut a_merged = a.clone();
                    a_merged.merge(&b).unwrap();

                    let mut b_merged = b.clone();
                    b_merged.merge(&a).unwrap();

                    prop_assert_eq!(a_merged, b_merged);
                }

                #[test]
                fn [< $type:lower _associativity >](a in $arb, b in $arb, c in $arb) {
                    let mut ab_c = a.clone();
                    ab_c.merge(&b).unwrap();
                    ab_c.merge(&c).unwrap();

                    let mut a_bc = a.clone();
                    let mut bc = b.clone();
                    bc.merge(&c).unwrap();
                    a_bc.merge(&bc).unwrap();

                    prop_assert_eq!(ab_c, a_bc);
                }
            }
        }
    };
}

test_properties!(HyperLogLog, arb_hyperloglog());
test_properties!(BloomFilter, arb_bloom());
test_properties!(MinHash, arb_minhash());

proptest! {
    #[test]
    fn hyperloglog_merge_equals_union_stream(a in arb_items(), b in arb_items()) {
        let mut left = HyperLogLog::with_precision(8).unwrap();
        let mut right = HyperLogLog::with_precision(8).unwrap();
        let mut whole = HyperLogLog::with_precision(8).unwrap();
        for x in &a {
            left.add(x);
            whole.add(x);
        }
        for x in &b {
            right.add(x);
            whole.add(x);
        }
        left.merge(&right).unwrap();
        prop_assert_eq!(left, whole);
    }

    #[test]
    fn bloom_has_no_false_negatives(items in arb_items()) {
        let mut bloom = BloomFilter::new(10, 0.2).unwrap();
        for x in &items {
            bloom.add(x);
        }
        for x in &items {
            prop_assert!(bloom.contains(x));
        }
    }

    #[test]
    fn count_min_commutativity(a in arb_count_min(), b in arb_count_min()) {
        let mut a_merged = a.clone();
        a_merged.merge(&b).unwrap();
        let mut b_merged = b.clone();
        b_merged.merge(&a).unwrap();
        prop_assert_eq!(a_merged, b_merged);
    }

    #[test]
    fn count_min_associativity(a in arb_count_min(), b in arb_count_min(), c in arb_count_min()) {
        let mut ab_c = a.clone();
        ab_c.merge(&b).unwrap();
        ab_c.merge(&c).unwrap();

        let mut bc = b.clone();
        bc.merge(&c).unwrap();
        let mut a_bc = a.clone();
        a_bc.merge(&bc).unwrap();

        prop_assert_eq!(ab_c, a_bc);
    }

    #[test]
    fn count_min_merge_is_additive(updates in prop::collection::vec((0u32..50, 1i64..20), 0..60)) {
        let mut whole = CountMinSketch::new(16, 3).unwrap();
        let mut first = CountMinSketch::new(16, 3).unwrap();
        let mut second = CountMinSketch::new(16, 3).unwrap();
        for (i, (item, count)) in updates.iter().enumerate() {
            whole.update(item, *count).unwrap();
            let shard = if i % 2 == 0 { &mut first } else { &mut second };
            shard.update(item, *count).unwrap();
        }
        first.merge(&second).unwrap();
        prop_assert_eq!(&first, &whole);

        for (item, _) in &updates {
            let truth: i64 = updates.iter().filter(|(x, _)| x == item).map(|(_, c)| c).sum();
            prop_assert!(first.estimate(item) >= truth as u64);
        }
    }

    #[test]
    fn tdigest_merge_conserves_weight_and_range(a in arb_samples(), b in arb_samples()) {
        let mut left = TDigest::with_params(0.05, 5, 1).unwrap();
        let mut right = TDigest::with_params(0.05, 5, 2).unwrap();
        left.add_batch(a.iter().copied()).unwrap();
        right.add_batch(b.iter().copied()).unwrap();
        left.merge(&right).unwrap();

        let expected = (a.len() + b.len()) as f64;
        prop_assert!((left.total_weight() - expected).abs() < 1e-9);

        let lo = a.iter().chain(&b).copied().fold(f64::INFINITY, f64::min);
        let hi = a.iter().chain(&b).copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(left.min(), Some(lo));
        prop_assert_eq!(left.max(), Some(hi));

        let mut prev = lo;
        for i in 0..=20 {
            let est = left.quantile(i as f64 / 20.0).unwrap();
            prop_assert!(est >= prev && est <= hi);
            prev = est;
        }
    }

    #[test]
    fn tdigest_centroids_stay_sorted(samples in arb_samples()) {
        let mut td = TDigest::with_params(0.1, 2, 9).unwrap();
        td.add_batch(samples.iter().copied()).unwrap();
        let means: Vec<f64> = td.centroids().iter().map(|c| c.mean).collect();
        prop_assert!(means.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn tdigest_repeated_values_round_trip(
        samples in arb_repeated_samples(),
        compression in arb_compression(),
        seed in 0u64..1000,
    ) {
        let mut td = TDigest::with_params(compression, 25, seed).unwrap();
        td.add_batch(samples.iter().copied()).unwrap();

        let means: Vec<f64> = td.centroids().iter().map(|c| c.mean).collect();
        prop_assert!(means.windows(2).all(|w| w[0] <= w[1]));

        let restored = TDigest::from_bytes(&td.to_bytes().unwrap());
        prop_assert_eq!(restored, Ok(td.clone()));

        let mut prev = f64::NEG_INFINITY;
        for i in 0..=50 {
            let est = td.quantile(i as f64 / 50.0).unwrap();
            prop_assert!(est >= prev);
            prev = est;
        }
    }
}
