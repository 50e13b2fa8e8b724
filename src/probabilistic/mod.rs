// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Probabilistic Data Structures (Sketches)
//!
//! These data structures provide approximate answers to queries (cardinality, membership,
//! similarity, frequency, quantiles) using significantly less memory than exact structures.
//! Each one is an independent type; they share only the hashing utility and the
//! [`Sketch`](crate::traits::Sketch) contract for merge and serialization.

pub mod bloom_filter;
pub mod count_min_sketch;
pub mod hyperloglog;
pub mod minhash;
pub mod tdigest;

pub use bloom_filter::BloomFilter;
pub use count_min_sketch::CountMinSketch;
pub use hyperloglog::HyperLogLog;
pub use minhash::MinHash;
pub use tdigest::{Centroid, TDigest};
