// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! # stream-sketches
//!
//! Fixed-memory probabilistic summaries of unbounded data streams.
//!
//! - [`HyperLogLog`]: distinct-element counting.
//! - [`BloomFilter`]: approximate set membership without false negatives.
//! - [`MinHash`]: Jaccard similarity between sets.
//! - [`CountMinSketch`]: per-item frequency estimation.
//! - [`TDigest`]: quantile estimation with extra accuracy in the tails.
//!
//! Every sketch implements [`Sketch`]: instances with equal configuration merge into one,
//! and every sketch serializes to a self-describing byte buffer, so shards can be built
//! independently and combined by a reducer (see [`compaction`]).

pub mod codec;
pub mod compaction;
pub mod config;
pub mod enums;
pub mod hashing;
pub mod probabilistic;
pub mod traits;

// Re-export core traits
pub use traits::{IdempotentMerge, Sketch, SketchError};

pub use config::{
    BloomFilterConfig, CountMinSketchConfig, HyperLogLogConfig, MinHashConfig, TDigestConfig,
};
pub use enums::SketchKind;
pub use probabilistic::{BloomFilter, Centroid, CountMinSketch, HyperLogLog, MinHash, TDigest};
