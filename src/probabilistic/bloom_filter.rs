// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::config::BloomFilterConfig;
use crate::enums::SketchKind;
use crate::hashing::{hash_item, nth_seed};
use crate::traits::{IdempotentMerge, Sketch, SketchError};
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_2;
use std::hash::Hash;
use tracing::debug;

/// Bloom Filter - Membership Set
///
/// A space-efficient probabilistic set. `contains` never returns a false negative; it may
/// return a false positive with probability close to `(1 - e^{-k·n/m})^k` after `n`
/// insertions into `m` bits with `k` hash functions.
///
/// Bit positions come from double hashing `h1 + i·h2 (mod m)` over two seeded base hashes.
///
/// # Key Properties
///
/// - **Fixed Memory**: `m = ceil(-n·ln(p) / ln(2)^2)` bits for capacity `n` and target rate `p`.
/// - **Mergeable**: Filters with the same size, hash count and seed merge by bitwise OR.
/// - **Idempotent**: Bits are only ever set, never cleared.
///
/// # Example
///
/// ```
/// use stream_sketches::BloomFilter;
///
/// let mut bloom = BloomFilter::new(1000, 0.01).unwrap();
/// bloom.add("apple");
/// bloom.add("banana");
///
/// assert!(bloom.contains("apple"));
/// assert!(bloom.contains("banana"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloomFilter {
    capacity: usize,
    false_positive_rate: f64,
    seed: u64,
    num_bits: u64,
    num_hashes: u32,
    bits: Vec<u64>,
}

impl BloomFilter {
    /// Creates a filter for `capacity` items at target false-positive rate `false_positive_rate`.
    pub fn new(capacity: usize, false_positive_rate: f64) -> Result<Self, SketchError> {
        Self::with_seed(capacity, false_positive_rate, 0)
    }

    /// Same as [`BloomFilter::new`] with an explicit hash seed.
    pub fn with_seed(
        capacity: usize,
        false_positive_rate: f64,
        seed: u64,
    ) -> Result<Self, SketchError> {
        if capacity == 0 {
            return Err(SketchError::InvalidConfig(
                "Bloom filter capacity must be positive".into(),
            ));
        }
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(SketchError::InvalidConfig(format!(
                "Bloom filter false positive rate must be in (0, 1), got {}",
                false_positive_rate
            )));
        }

        let n = capacity as f64;
        let num_bits = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil().max(1.0) as u64;
        let num_hashes = ((num_bits as f64 / n) * LN_2).round().max(1.0) as u32;

        debug!(capacity, false_positive_rate, num_bits, num_hashes, "created BloomFilter");

        Ok(Self {
            capacity,
            false_positive_rate,
            seed,
            num_bits,
            num_hashes,
            bits: vec![0u64; num_bits.div_ceil(64) as usize],
        })
    }

    /// Sets the `k` bits for `item`.
    pub fn add<T: Hash + ?Sized>(&mut self, item: &T) {
        let (h1, h2) = self.base_hashes(item);
        for i in 0..self.num_hashes as u64 {
            let bit = self.position(h1, h2, i);
            self.bits[(bit / 64) as usize] |= 1u64 << (bit % 64);
        }
    }

    /// Returns `true` if `item` might have been added, `false` if it definitely was not.
    pub fn contains<T: Hash + ?Sized>(&self, item: &T) -> bool {
        let (h1, h2) = self.base_hashes(item);
        (0..self.num_hashes as u64).all(|i| {
            let bit = self.position(h1, h2, i);
            self.bits[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0
        })
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Target false-positive rate the filter was sized for.
    pub fn target_false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    /// Number of bits set to 1.
    pub fn bits_set(&self) -> u64 {
        self.bits.iter().map(|w| w.count_ones() as u64).sum()
    }

    /// False-positive probability implied by the current fill ratio (`fill^k`).
    pub fn current_false_positive_rate(&self) -> f64 {
        let fill = self.bits_set() as f64 / self.num_bits as f64;
        fill.powi(self.num_hashes as i32)
    }

    /// Estimated number of distinct items inserted, from the fill ratio.
    ///
    /// `n ≈ -(m/k)·ln(1 - X/m)` where `X` is the number of set bits. Saturated filters
    /// report infinity.
    pub fn estimated_count(&self) -> f64 {
        let m = self.num_bits as f64;
        let x = self.bits_set() as f64;
        if x >= m {
            return f64::INFINITY;
        }
        -(m / self.num_hashes as f64) * (1.0 - x / m).ln()
    }

    pub fn config(&self) -> BloomFilterConfig {
        BloomFilterConfig {
            capacity: self.capacity,
            false_positive_rate: self.target_false_positive_rate(),
            seed: self.seed,
        }
    }

    pub fn clear(&mut self) {
        self.bits.iter_mut().for_each(|w| *w = 0);
    }

    fn base_hashes<T: Hash + ?Sized>(&self, item: &T) -> (u64, u64) {
        let h1 = hash_item(nth_seed(self.seed, 0), item);
        // Odd step so the probe sequence never collapses to a single bit
        let h2 = hash_item(nth_seed(self.seed, 1), item) | 1;
        (h1, h2)
    }

    #[inline]
    fn position(&self, h1: u64, h2: u64, i: u64) -> u64 {
        h1.wrapping_add(i.wrapping_mul(h2)) % self.num_bits
    }
}

impl Sketch for BloomFilter {
    const KIND: SketchKind = SketchKind::BloomFilter;

    /// Bitwise OR of two filters with identical geometry and seed.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.num_bits != other.num_bits
            || self.num_hashes != other.num_hashes
            || self.seed != other.seed
        {
            debug!(
                ours_bits = self.num_bits,
                theirs_bits = other.num_bits,
                "rejected BloomFilter merge"
            );
            return Err(SketchError::IncompatibleMerge(format!(
                "Bloom filter mismatch: bits={}, hashes={}, seed={} vs bits={}, hashes={}, seed={}",
                self.num_bits,
                self.num_hashes,
                self.seed,
                other.num_bits,
                other.num_hashes,
                other.seed
            )));
        }
        for (mine, theirs) in self.bits.iter_mut().zip(&other.bits) {
            *mine |= theirs;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), SketchError> {
        if self.capacity == 0 || self.num_bits == 0 || self.num_hashes == 0 {
            return Err(SketchError::MalformedInput(
                "Bloom filter with zero capacity, bits or hashes".into(),
            ));
        }
        if self.bits.len() as u64 != self.num_bits.div_ceil(64) {
            return Err(SketchError::MalformedInput(format!(
                "Bloom filter word count mismatch: expected {}, got {}",
                self.num_bits.div_ceil(64),
                self.bits.len()
            )));
        }
        let tail = self.num_bits % 64;
        if tail != 0 && self.bits.last().is_some_and(|&w| w >> tail != 0) {
            return Err(SketchError::MalformedInput(
                "Bloom filter has bits set past its length".into(),
            ));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }
}

impl IdempotentMerge for BloomFilter {}
