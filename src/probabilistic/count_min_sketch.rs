// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::config::CountMinSketchConfig;
use crate::enums::SketchKind;
use crate::hashing::{derive_seeds, hash_item};
use crate::traits::{Sketch, SketchError};
use serde::{Deserialize, Serialize};
use std::f64::consts::E;
use std::hash::Hash;
use tracing::debug;

/// Count-Min Sketch - Frequency Estimation
///
/// A probabilistic data structure for estimating the frequency of events in a stream of data.
/// It uses a matrix of counters and one seeded hash function per row to map events to counters.
///
/// # Key Properties
///
/// - **Fixed Memory**: Uses a fixed size matrix (`width` × `depth` × 8 bytes), regardless of the number of unique items.
/// - **Conservative**: Frequencies are never underestimated, but may be overestimated due to collisions.
/// - **Mergeable**: Sketches with the same dimensions and seeds merge by summing counters.
///
/// # Algebraic Properties
///
/// - **Commutativity**: Yes (Matrix addition is commutative).
/// - **Associativity**: Yes (Matrix addition is associative).
/// - **Idempotence**: **NO**. Merging the same sketch twice doubles the counts.
///
/// # Example
///
/// ```
/// use stream_sketches::CountMinSketch;
///
/// let mut cms = CountMinSketch::new(100, 5).unwrap();
/// cms.update("apple", 1).unwrap();
/// cms.update("apple", 1).unwrap();
/// cms.update("banana", 1).unwrap();
///
/// assert!(cms.estimate("apple") >= 2);
/// assert!(cms.estimate("banana") >= 1);
/// assert_eq!(cms.estimate("cherry"), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountMinSketch {
    /// Number of counters per row
    width: usize,
    /// Number of hash functions (rows)
    depth: usize,
    /// Base seed; row seeds are derived from it
    seed: u64,
    /// One hash seed per row
    row_seeds: Vec<u64>,
    /// Sum of all increments
    total: u64,
    /// The matrix of counters, row-major
    counters: Vec<u64>,
}

impl CountMinSketch {
    /// Creates a `depth × width` sketch with base seed 0.
    pub fn new(width: usize, depth: usize) -> Result<Self, SketchError> {
        Self::with_seed(width, depth, 0)
    }

    /// Creates a `depth × width` sketch whose row hashes derive from `seed`.
    pub fn with_seed(width: usize, depth: usize, seed: u64) -> Result<Self, SketchError> {
        if width == 0 || depth == 0 {
            return Err(SketchError::InvalidConfig(format!(
                "Count-Min Sketch width and depth must be positive, got {}x{}",
                width, depth
            )));
        }
        let cells = width.checked_mul(depth).ok_or_else(|| {
            SketchError::InvalidConfig(format!("Count-Min Sketch {}x{} is too large", width, depth))
        })?;

        debug!(width, depth, seed, "created CountMinSketch");

        Ok(Self {
            width,
            depth,
            seed,
            row_seeds: derive_seeds(seed, depth),
            total: 0,
            counters: vec![0; cells],
        })
    }

    /// Sizes the sketch so that, with probability `1 - delta`, every estimate exceeds the
    /// true count by at most `epsilon · total`.
    ///
    /// `width = ceil(e / epsilon)`, `depth = ceil(ln(1 / delta))`.
    pub fn with_error(epsilon: f64, delta: f64) -> Result<Self, SketchError> {
        if !(epsilon > 0.0 && epsilon < 1.0) || !(delta > 0.0 && delta < 1.0) {
            return Err(SketchError::InvalidConfig(format!(
                "Count-Min Sketch epsilon and delta must be in (0, 1), got {} and {}",
                epsilon, delta
            )));
        }
        let width = (E / epsilon).ceil() as usize;
        let depth = ((1.0 / delta).ln().ceil() as usize).max(1);
        Self::new(width, depth)
    }

    /// Adds `increment` occurrences of `item`.
    ///
    /// Fails with [`SketchError::MalformedInput`] when `increment` is not positive.
    pub fn update<T: Hash + ?Sized>(&mut self, item: &T, increment: i64) -> Result<(), SketchError> {
        if increment <= 0 {
            return Err(SketchError::MalformedInput(format!(
                "Count-Min Sketch increment must be positive, got {}",
                increment
            )));
        }
        self.add_count(item, increment as u64);
        Ok(())
    }

    /// Adds one occurrence of `item`.
    pub fn increment<T: Hash + ?Sized>(&mut self, item: &T) {
        self.add_count(item, 1);
    }

    /// Estimated count of `item`: the minimum over its `depth` cells. Never below the true count.
    pub fn estimate<T: Hash + ?Sized>(&self, item: &T) -> u64 {
        (0..self.depth)
            .map(|row| self.counters[self.cell(row, item)])
            .min()
            .unwrap_or(0)
    }

    /// Sum of all increments added (including merged sketches).
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Additive overestimate `e · total / width`, exceeded with probability at most `e^-depth`.
    pub fn error_bound(&self) -> f64 {
        E * self.total as f64 / self.width as f64
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn config(&self) -> CountMinSketchConfig {
        CountMinSketchConfig {
            width: self.width,
            depth: self.depth,
            seed: self.seed,
        }
    }

    pub fn clear(&mut self) {
        self.counters.iter_mut().for_each(|c| *c = 0);
        self.total = 0;
    }

    fn add_count<T: Hash + ?Sized>(&mut self, item: &T, count: u64) {
        for row in 0..self.depth {
            let idx = self.cell(row, item);
            self.counters[idx] = self.counters[idx].saturating_add(count);
        }
        self.total = self.total.saturating_add(count);
    }

    #[inline]
    fn cell<T: Hash + ?Sized>(&self, row: usize, item: &T) -> usize {
        let col = (hash_item(self.row_seeds[row], item) % self.width as u64) as usize;
        row * self.width + col
    }
}

impl Sketch for CountMinSketch {
    const KIND: SketchKind = SketchKind::CountMinSketch;

    /// Merges another CountMinSketch into this one by summing counters.
    ///
    /// Not idempotent: apply exactly once per contributing stream.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.width != other.width || self.depth != other.depth || self.row_seeds != other.row_seeds
        {
            debug!(
                ours_width = self.width,
                theirs_width = other.width,
                ours_seed = self.seed,
                theirs_seed = other.seed,
                "rejected CountMinSketch merge"
            );
            return Err(SketchError::IncompatibleMerge(format!(
                "Count-Min Sketch mismatch: {}x{} seed {} vs {}x{} seed {}",
                self.depth, self.width, self.seed, other.depth, other.width, other.seed
            )));
        }
        for (mine, &theirs) in self.counters.iter_mut().zip(&other.counters) {
            *mine = mine.saturating_add(theirs);
        }
        self.total = self.total.saturating_add(other.total);
        Ok(())
    }

    fn validate(&self) -> Result<(), SketchError> {
        if self.width == 0 || self.depth == 0 {
            return Err(SketchError::MalformedInput("Zero Count-Min Sketch dimension".into()));
        }
        if self.row_seeds.len() != self.depth {
            return Err(SketchError::MalformedInput("Row seed count mismatch".into()));
        }
        if Some(self.counters.len()) != self.width.checked_mul(self.depth) {
            return Err(SketchError::MalformedInput("Matrix size mismatch".into()));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.total == 0 && self.counters.iter().all(|&x| x == 0)
    }
}
