// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::config::TDigestConfig;
use crate::enums::SketchKind;
use crate::hashing::nth_seed;
use crate::traits::{Sketch, SketchError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A weighted representative point of a cluster of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub mean: f64,
    pub weight: f64,
}

impl Centroid {
    pub fn new(mean: f64, weight: f64) -> Self {
        Self { mean, weight }
    }

    fn absorb(&mut self, value: f64, weight: f64) {
        let (lo, hi) = (self.mean.min(value), self.mean.max(value));
        self.weight += weight;
        self.mean = (self.mean + weight * (value - self.mean) / self.weight).clamp(lo, hi);
    }
}

/// TDigest - Quantile Digest
///
/// Summarises a numeric stream as a sorted sequence of weighted centroids. A sample joins
/// its nearest centroid only while that centroid stays under the size bound
/// `4·n·δ·q·(1-q)`, where `q` is the centroid's normalized rank and `n` the total weight.
/// Centroids near the tails are therefore kept small, which makes extreme quantiles far more
/// accurate than the median.
///
/// # Key Properties
///
/// - **Memory Efficiency**: Once the centroid count exceeds `K/δ` the digest is rebuilt by
///   re-inserting its centroids in random order.
/// - **Tail Accuracy**: Particularly accurate at the tails of the distribution (e.g., P99, P99.9).
/// - **Mergeable**: Any two digests can be merged; the result is recompressed.
///
/// # Example
///
/// ```
/// use stream_sketches::TDigest;
///
/// let mut td = TDigest::new(0.01).unwrap();
/// for i in 1..=100 {
///     td.insert(i as f64).unwrap();
/// }
///
/// assert!((td.quantile(0.5).unwrap() - 50.5).abs() < 1.0);
/// assert!((td.quantile(0.99).unwrap() - 99.0).abs() < 1.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TDigest {
    compression: f64,
    buffer_factor: usize,
    seed: u64,
    /// Recompression rounds so far; feeds the shuffle seed
    rounds: u64,
    total_weight: f64,
    min: f64,
    max: f64,
    /// Sorted ascending by mean
    centroids: Vec<Centroid>,
    /// Rebuilt on demand whenever its length disagrees with `centroids`
    #[serde(skip)]
    ranks: RankIndex,
}

impl PartialEq for TDigest {
    fn eq(&self, other: &Self) -> bool {
        self.compression == other.compression
            && self.buffer_factor == other.buffer_factor
            && self.seed == other.seed
            && self.rounds == other.rounds
            && self.total_weight == other.total_weight
            && self.min == other.min
            && self.max == other.max
            && self.centroids == other.centroids
    }
}

/// Fenwick tree over the centroid weights, indexed like `centroids`.
///
/// Gives the weight ranked below any centroid in `O(log n)`.
#[derive(Debug, Clone, Default)]
struct RankIndex {
    tree: Vec<f64>,
}

impl RankIndex {
    fn len(&self) -> usize {
        self.tree.len()
    }

    fn rebuild(&mut self, centroids: &[Centroid]) {
        self.tree.clear();
        self.tree.extend(centroids.iter().map(|c| c.weight));
        let n = self.tree.len();
        for i in 0..n {
            let parent = i | (i + 1);
            if parent < n {
                let w = self.tree[i];
                self.tree[parent] += w;
            }
        }
    }

    fn add(&mut self, mut i: usize, delta: f64) {
        while i < self.tree.len() {
            self.tree[i] += delta;
            i |= i + 1;
        }
    }

    /// Total weight of the centroids before index `end`.
    fn prefix(&self, end: usize) -> f64 {
        let mut sum = 0.0;
        let mut i = end.min(self.tree.len());
        while i > 0 {
            sum += self.tree[i - 1];
            i &= i - 1;
        }
        sum
    }
}

impl TDigest {
    /// Creates an empty digest with compression factor `compression` (δ) in (0, 1].
    pub fn new(compression: f64) -> Result<Self, SketchError> {
        let defaults = TDigestConfig::default();
        Self::with_params(compression, defaults.buffer_factor, defaults.seed)
    }

    /// Creates an empty digest with every parameter explicit.
    ///
    /// Recompression runs when the centroid count exceeds `buffer_factor / compression`;
    /// `seed` fixes the random re-insertion order.
    pub fn with_params(compression: f64, buffer_factor: usize, seed: u64) -> Result<Self, SketchError> {
        if !(compression > 0.0 && compression <= 1.0) {
            return Err(SketchError::InvalidConfig(format!(
                "t-digest compression must be in (0, 1], got {}",
                compression
            )));
        }
        if buffer_factor == 0 {
            return Err(SketchError::InvalidConfig(
                "t-digest buffer factor must be positive".into(),
            ));
        }
        debug!(compression, buffer_factor, seed, "created TDigest");
        Ok(Self {
            compression,
            buffer_factor,
            seed,
            rounds: 0,
            total_weight: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            centroids: Vec::new(),
            ranks: RankIndex::default(),
        })
    }

    /// Adds `value` with weight `weight`.
    ///
    /// `value` must be finite and `weight` finite and positive.
    pub fn add(&mut self, value: f64, weight: f64) -> Result<(), SketchError> {
        if !value.is_finite() {
            return Err(SketchError::MalformedInput(format!(
                "t-digest value must be finite, got {}",
                value
            )));
        }
        if !(weight.is_finite() && weight > 0.0) {
            return Err(SketchError::MalformedInput(format!(
                "t-digest weight must be finite and positive, got {}",
                weight
            )));
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.absorb(value, weight);
        if self.centroids.len() > self.centroid_limit() {
            self.compress();
        }
        Ok(())
    }

    /// Adds a single sample of weight 1.
    pub fn insert(&mut self, value: f64) -> Result<(), SketchError> {
        self.add(value, 1.0)
    }

    /// Adds each value with weight 1. Stops at the first invalid value.
    pub fn add_batch<I: IntoIterator<Item = f64>>(&mut self, values: I) -> Result<(), SketchError> {
        for value in values {
            self.insert(value)?;
        }
        Ok(())
    }

    /// Estimated value at quantile `q` in `[0, 1]`.
    ///
    /// The cumulative distribution is modeled as a piecewise linear function through each
    /// centroid's midpoint `(weight_before + weight/2, mean)`, anchored at `(0, min)` and
    /// `(n, max)`.
    pub fn quantile(&self, q: f64) -> Result<f64, SketchError> {
        if !(0.0..=1.0).contains(&q) {
            return Err(SketchError::MalformedInput(format!(
                "Quantile must be in [0, 1], got {}",
                q
            )));
        }
        if self.centroids.is_empty() {
            return Err(SketchError::EmptyDigest);
        }
        if q == 0.0 {
            return Ok(self.min);
        }
        if q == 1.0 {
            return Ok(self.max);
        }

        let target = q * self.total_weight;
        let mut prev_rank = 0.0;
        let mut prev_mean = self.min;
        let mut cumulative = 0.0;

        for c in &self.centroids {
            let mid = cumulative + c.weight / 2.0;
            if target < mid {
                let span = mid - prev_rank;
                if span <= 0.0 {
                    return Ok(prev_mean);
                }
                let t = (target - prev_rank) / span;
                return Ok(prev_mean + t * (c.mean - prev_mean));
            }
            cumulative += c.weight;
            prev_rank = mid;
            prev_mean = c.mean;
        }

        let span = self.total_weight - prev_rank;
        if span <= 0.0 {
            return Ok(self.max);
        }
        let t = (target - prev_rank) / span;
        Ok(prev_mean + t * (self.max - prev_mean))
    }

    /// Estimated fraction of the weight at or below `x`; the inverse of [`TDigest::quantile`].
    pub fn cdf(&self, x: f64) -> Result<f64, SketchError> {
        if x.is_nan() {
            return Err(SketchError::MalformedInput("cdf of NaN".into()));
        }
        if self.centroids.is_empty() {
            return Err(SketchError::EmptyDigest);
        }
        if x < self.min {
            return Ok(0.0);
        }
        if x >= self.max {
            return Ok(1.0);
        }

        let n = self.total_weight;
        let mut prev_rank = 0.0;
        let mut prev_mean = self.min;
        let mut cumulative = 0.0;

        for c in &self.centroids {
            let mid = cumulative + c.weight / 2.0;
            if x < c.mean {
                let span = c.mean - prev_mean;
                let rank = if span <= 0.0 {
                    prev_rank
                } else {
                    prev_rank + (x - prev_mean) / span * (mid - prev_rank)
                };
                return Ok(rank / n);
            }
            cumulative += c.weight;
            prev_rank = mid;
            prev_mean = c.mean;
        }

        let span = self.max - prev_mean;
        let rank = if span <= 0.0 {
            n
        } else {
            prev_rank + (x - prev_mean) / span * (n - prev_rank)
        };
        Ok(rank / n)
    }

    /// Mean of the samples whose rank lies between quantiles `lower` and `upper`.
    ///
    /// Each centroid's weight is treated as spread evenly over its rank interval.
    pub fn trimmed_mean(&self, lower: f64, upper: f64) -> Result<f64, SketchError> {
        if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower >= upper {
            return Err(SketchError::MalformedInput(format!(
                "Trimmed mean bounds must satisfy 0 <= lower < upper <= 1, got {} and {}",
                lower, upper
            )));
        }
        if self.centroids.is_empty() {
            return Err(SketchError::EmptyDigest);
        }

        let lo = lower * self.total_weight;
        let hi = upper * self.total_weight;
        let mut cumulative = 0.0;
        let mut weight_in = 0.0;
        let mut sum = 0.0;

        for c in &self.centroids {
            let start = cumulative;
            let end = cumulative + c.weight;
            cumulative = end;
            let overlap = end.min(hi) - start.max(lo);
            if overlap > 0.0 {
                weight_in += overlap;
                sum += overlap * c.mean;
            }
            if end >= hi {
                break;
            }
        }

        if weight_in <= 0.0 {
            return Err(SketchError::EmptyDigest);
        }
        Ok(sum / weight_in)
    }

    /// Smallest sample seen.
    pub fn min(&self) -> Option<f64> {
        (!self.centroids.is_empty()).then_some(self.min)
    }

    /// Largest sample seen.
    pub fn max(&self) -> Option<f64> {
        (!self.centroids.is_empty()).then_some(self.max)
    }

    /// Sum of all sample weights (the sample count for unit weights).
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn centroid_count(&self) -> usize {
        self.centroids.len()
    }

    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    pub fn compression(&self) -> f64 {
        self.compression
    }

    pub fn config(&self) -> TDigestConfig {
        TDigestConfig {
            compression: self.compression,
            buffer_factor: self.buffer_factor,
            seed: self.seed,
        }
    }

    /// Rebuilds the digest by re-inserting every centroid in random order.
    pub fn compress(&mut self) {
        let mut centroids = std::mem::take(&mut self.centroids);
        let before = centroids.len();
        centroids.shuffle(&mut self.next_rng());

        self.total_weight = 0.0;
        for c in centroids {
            self.absorb(c.mean, c.weight);
        }
        trace!(before, after = self.centroids.len(), round = self.rounds, "compressed TDigest");
    }

    fn centroid_limit(&self) -> usize {
        (self.buffer_factor as f64 / self.compression).ceil() as usize
    }

    fn next_rng(&mut self) -> StdRng {
        let rng = StdRng::seed_from_u64(nth_seed(self.seed, self.rounds));
        self.rounds += 1;
        rng
    }

    /// Size bound for a centroid at normalized rank `q`.
    fn threshold(&self, q: f64) -> f64 {
        4.0 * self.total_weight * self.compression * q * (1.0 - q)
    }

    /// Core update: folds a weighted point into its nearest centroid if the size bound
    /// allows, otherwise inserts it as a new centroid. Does not recompress.
    fn absorb(&mut self, value: f64, weight: f64) {
        if self.ranks.len() != self.centroids.len() {
            self.ranks.rebuild(&self.centroids);
        }
        self.total_weight += weight;

        let (lo, hi) = self.nearest(value);
        for j in lo..hi {
            let c = self.centroids[j];
            let q = (self.ranks.prefix(j) + c.weight / 2.0) / self.total_weight;
            if c.weight + weight <= self.threshold(q) {
                self.centroids[j].absorb(value, weight);
                self.ranks.add(j, weight);
                self.settle(j, c.mean);
                return;
            }
        }

        let at = self.centroids.partition_point(|c| c.mean <= value);
        self.centroids.insert(at, Centroid::new(value, weight));
        self.ranks.rebuild(&self.centroids);
    }

    /// Moves centroid `j` past the run of centroids that shared its old mean, in the
    /// direction its mean moved, so the vector stays sorted.
    fn settle(&mut self, j: usize, old_mean: f64) {
        let new_mean = self.centroids[j].mean;
        let run = if new_mean > old_mean {
            let ties = self.centroids[j + 1..]
                .iter()
                .take_while(|c| c.mean == old_mean)
                .count();
            j..j + ties + 1
        } else if new_mean < old_mean {
            let ties = self.centroids[..j]
                .iter()
                .rev()
                .take_while(|c| c.mean == old_mean)
                .count();
            j - ties..j + 1
        } else {
            return;
        };
        if run.len() < 2 {
            return;
        }

        let before: Vec<f64> = self.centroids[run.clone()].iter().map(|c| c.weight).collect();
        if new_mean > old_mean {
            self.centroids[run.clone()].rotate_left(1);
        } else {
            self.centroids[run.clone()].rotate_right(1);
        }
        for (i, old) in run.zip(before) {
            let delta = self.centroids[i].weight - old;
            if delta != 0.0 {
                self.ranks.add(i, delta);
            }
        }
    }

    /// Index range of the centroids at minimum distance from `value`.
    fn nearest(&self, value: f64) -> (usize, usize) {
        let idx = self.centroids.partition_point(|c| c.mean < value);
        let left = idx.checked_sub(1).map(|i| value - self.centroids[i].mean);
        let right = self.centroids.get(idx).map(|c| c.mean - value);
        let best = match (left, right) {
            (Some(l), Some(r)) => l.min(r),
            (Some(l), None) => l,
            (None, Some(r)) => r,
            (None, None) => return (0, 0),
        };

        let mut lo = idx;
        while lo > 0 && value - self.centroids[lo - 1].mean == best {
            lo -= 1;
        }
        let mut hi = idx;
        while hi < self.centroids.len() && self.centroids[hi].mean - value == best {
            hi += 1;
        }
        (lo, hi)
    }
}

impl Sketch for TDigest {
    const KIND: SketchKind = SketchKind::TDigest;

    /// Re-inserts `other`'s centroids in random order, then recompresses.
    ///
    /// Valid for any pair of digests; `self` keeps its own compression settings. Like the
    /// Count-Min Sketch merge this is additive: merging the same digest twice doubles its weight.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if other.centroids.is_empty() {
            return Ok(());
        }
        let mut incoming = other.centroids.clone();
        incoming.shuffle(&mut self.next_rng());

        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        for c in incoming {
            self.absorb(c.mean, c.weight);
        }
        self.compress();
        Ok(())
    }

    fn validate(&self) -> Result<(), SketchError> {
        if !(self.compression > 0.0 && self.compression <= 1.0) || self.buffer_factor == 0 {
            return Err(SketchError::MalformedInput(format!(
                "Invalid t-digest parameters: compression {}, buffer factor {}",
                self.compression, self.buffer_factor
            )));
        }
        if self
            .centroids
            .iter()
            .any(|c| !c.mean.is_finite() || !(c.weight.is_finite() && c.weight > 0.0))
        {
            return Err(SketchError::MalformedInput("Invalid centroid".into()));
        }
        if self.centroids.windows(2).any(|w| w[0].mean > w[1].mean) {
            return Err(SketchError::MalformedInput("Centroids out of order".into()));
        }
        if let (Some(first), Some(last)) = (self.centroids.first(), self.centroids.last()) {
            if !(self.min <= first.mean && last.mean <= self.max) {
                return Err(SketchError::MalformedInput(
                    "Centroids outside the recorded min/max".into(),
                ));
            }
        }
        let sum: f64 = self.centroids.iter().map(|c| c.weight).sum();
        if (sum - self.total_weight).abs() > 1e-9 * sum.max(1.0) {
            return Err(SketchError::MalformedInput(format!(
                "Centroid weights sum to {} but total weight is {}",
                sum, self.total_weight
            )));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }
}
