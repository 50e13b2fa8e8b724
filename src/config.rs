// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Sketch configuration.
//!
//! Each sketch has a plain configuration struct with sensible defaults. All fields are
//! optional when deserializing, so configuration can be sourced from JSON (or any serde
//! format) by the caller:
//!
//! ```
//! use stream_sketches::config::BloomFilterConfig;
//!
//! let config: BloomFilterConfig = serde_json::from_str(r#"{"capacity": 500}"#).unwrap();
//! let bloom = config.build().unwrap();
//! assert_eq!(bloom.capacity(), 500);
//! ```

use crate::probabilistic::{BloomFilter, CountMinSketch, HyperLogLog, MinHash, TDigest};
use crate::traits::SketchError;
use serde::{Deserialize, Serialize};

/// Configuration for [`HyperLogLog`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperLogLogConfig {
    /// Target relative standard error, in (0, 1).
    pub error_rate: f64,
    /// Explicit precision (`log2` of the register count). Takes priority over `error_rate`.
    pub precision: Option<u8>,
}

impl Default for HyperLogLogConfig {
    fn default() -> Self {
        Self {
            error_rate: 0.01,
            precision: None,
        }
    }
}

impl HyperLogLogConfig {
    pub fn build(&self) -> Result<HyperLogLog, SketchError> {
        match self.precision {
            Some(p) => HyperLogLog::with_precision(p),
            None => HyperLogLog::new(self.error_rate),
        }
    }
}

/// Configuration for [`BloomFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BloomFilterConfig {
    /// Number of insertions the filter is sized for.
    pub capacity: usize,
    /// Target false-positive probability at capacity, in (0, 1).
    pub false_positive_rate: f64,
    /// Selects the hash functions. Filters only merge when seeds match.
    pub seed: u64,
}

impl Default for BloomFilterConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            false_positive_rate: 0.01,
            seed: 0,
        }
    }
}

impl BloomFilterConfig {
    pub fn build(&self) -> Result<BloomFilter, SketchError> {
        BloomFilter::with_seed(self.capacity, self.false_positive_rate, self.seed)
    }
}

/// Configuration for [`MinHash`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinHashConfig {
    /// Signature length.
    pub num_perm: usize,
    /// Seed for the permutation coefficients.
    pub seed: u64,
}

impl Default for MinHashConfig {
    fn default() -> Self {
        Self {
            num_perm: 128,
            seed: 1,
        }
    }
}

impl MinHashConfig {
    pub fn build(&self) -> Result<MinHash, SketchError> {
        MinHash::with_seed(self.num_perm, self.seed)
    }
}

/// Configuration for [`CountMinSketch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountMinSketchConfig {
    /// Counters per row.
    pub width: usize,
    /// Number of rows (independent hash functions).
    pub depth: usize,
    /// Base seed the row seeds are derived from.
    pub seed: u64,
}

impl Default for CountMinSketchConfig {
    fn default() -> Self {
        Self {
            width: 2048,
            depth: 5,
            seed: 0,
        }
    }
}

impl CountMinSketchConfig {
    pub fn build(&self) -> Result<CountMinSketch, SketchError> {
        CountMinSketch::with_seed(self.width, self.depth, self.seed)
    }
}

/// Configuration for [`TDigest`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TDigestConfig {
    /// Compression factor δ in (0, 1]. Smaller values keep more centroids.
    pub compression: f64,
    /// Recompression runs once the centroid count exceeds `buffer_factor / compression`.
    pub buffer_factor: usize,
    /// Seed for the re-insertion order used by recompression and merge.
    pub seed: u64,
}

impl Default for TDigestConfig {
    fn default() -> Self {
        Self {
            compression: 0.01,
            buffer_factor: 25,
            seed: 0,
        }
    }
}

impl TDigestConfig {
    pub fn build(&self) -> Result<TDigest, SketchError> {
        TDigest::with_params(self.compression, self.buffer_factor, self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build() {
        assert_eq!(HyperLogLogConfig::default().build().unwrap().precision(), 14);
        assert_eq!(BloomFilterConfig::default().build().unwrap().capacity(), 10_000);
        assert_eq!(MinHashConfig::default().build().unwrap().num_perm(), 128);
        assert_eq!(CountMinSketchConfig::default().build().unwrap().width(), 2048);
        assert_eq!(TDigestConfig::default().build().unwrap().compression(), 0.01);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TDigestConfig = serde_json::from_str(r#"{"seed": 9}"#).unwrap();
        assert_eq!(config.seed, 9);
        assert_eq!(config.compression, 0.01);
        assert_eq!(config.buffer_factor, 25);

        let config: HyperLogLogConfig = serde_json::from_str(r#"{"precision": 10}"#).unwrap();
        assert_eq!(config.build().unwrap().num_registers(), 1024);
    }

    #[test]
    fn test_invalid_values_are_rejected_at_build() {
        let config = CountMinSketchConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(config.build(), Err(SketchError::InvalidConfig(_))));

        let config = HyperLogLogConfig {
            error_rate: 1.5,
            precision: None,
        };
        assert!(matches!(config.build(), Err(SketchError::InvalidConfig(_))));
    }

    #[test]
    fn test_sketch_reports_its_config() {
        let config = MinHashConfig { num_perm: 32, seed: 4 };
        assert_eq!(config.build().unwrap().config(), config);

        let config = BloomFilterConfig {
            capacity: 100,
            false_positive_rate: 0.05,
            seed: 3,
        };
        assert_eq!(config.build().unwrap().config(), config);
    }
}
