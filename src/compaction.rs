// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Sketch Compaction Module
//!
//! Provides utilities for folding many sketch states (one per shard, partition or time
//! window) into a single merged state. This is the reducer side of distributed
//! aggregation: every worker ships its local sketch and the reducer compacts them.
//!
//! # Two Compaction Pathways
//!
//! - **Typed Compaction**: [`merge_all`] and [`merge_serialized`] when the caller knows the
//!   sketch type statically.
//! - **Byte Compaction**: [`compact_bytes`] when buffers arrive untyped, e.g. from a
//!   storage layer. The kind is read from the buffer header with [`peek_kind`].
//!
//! Sketches whose merge is idempotent can also be folded into a long-lived accumulator with
//! [`fold_serialized`], where redelivered shards are harmless.
//!
//! # Example
//!
//! ```
//! use stream_sketches::compaction::compact_bytes;
//! use stream_sketches::{HyperLogLog, Sketch, SketchKind};
//!
//! let mut shard_a = HyperLogLog::new(0.02).unwrap();
//! let mut shard_b = HyperLogLog::new(0.02).unwrap();
//! for i in 0..500u32 {
//!     shard_a.add(&i);
//!     shard_b.add(&(i + 250));
//! }
//!
//! let a = shard_a.to_bytes().unwrap();
//! let b = shard_b.to_bytes().unwrap();
//! let compacted = compact_bytes(SketchKind::HyperLogLog, &[&a, &b]).unwrap();
//!
//! let merged = HyperLogLog::from_bytes(&compacted).unwrap();
//! assert!((merged.count() as f64 - 750.0).abs() < 75.0);
//! ```

use crate::enums::SketchKind;
use crate::probabilistic::{BloomFilter, CountMinSketch, HyperLogLog, MinHash, TDigest};
use crate::traits::{IdempotentMerge, Sketch, SketchError};
use tracing::debug;

pub use crate::codec::peek_kind;

/// Merges a slice of sketches into a new one, left to right.
///
/// Fails with [`SketchError::InvalidConfig`] on an empty slice, since there is no
/// configuration to build the result from, and with [`SketchError::IncompatibleMerge`]
/// as soon as one sketch does not match the first.
pub fn merge_all<S: Sketch>(sketches: &[S]) -> Result<S, SketchError> {
    let (first, rest) = sketches.split_first().ok_or_else(|| {
        SketchError::InvalidConfig(format!("Nothing to compact into a {}", S::KIND))
    })?;
    let mut merged = first.clone();
    for sketch in rest {
        merged.merge(sketch)?;
    }
    debug!(kind = %S::KIND, inputs = sketches.len(), "compacted sketches");
    Ok(merged)
}

/// Decodes and merges serialized sketches of a statically known type.
pub fn merge_serialized<S: Sketch>(buffers: &[&[u8]]) -> Result<S, SketchError> {
    let (first, rest) = buffers.split_first().ok_or_else(|| {
        SketchError::InvalidConfig(format!("Nothing to compact into a {}", S::KIND))
    })?;
    let mut merged = S::from_bytes(first)?;
    for bytes in rest {
        merged.merge(&S::from_bytes(bytes)?)?;
    }
    debug!(kind = %S::KIND, inputs = buffers.len(), "compacted serialized sketches");
    Ok(merged)
}

/// Folds serialized shards into an existing accumulator, one buffer at a time.
///
/// On error `target` keeps every shard merged before the failing buffer. Because merging
/// a shard twice leaves the sketch unchanged, the whole batch can simply be retried, and
/// shards delivered more than once are counted once. Count-Min sketches and t-digests add
/// on merge and are excluded by the bound.
pub fn fold_serialized<S: IdempotentMerge>(
    target: &mut S,
    buffers: &[&[u8]],
) -> Result<(), SketchError> {
    for bytes in buffers {
        target.merge(&S::from_bytes(bytes)?)?;
    }
    debug!(kind = %S::KIND, inputs = buffers.len(), "folded serialized sketches");
    Ok(())
}

/// Compacts multiple serialized sketches into a single serialized sketch.
///
/// Every buffer must carry the header for `kind`; a buffer of another kind fails with
/// [`SketchError::MalformedInput`] before anything is merged. An empty slice compacts to an
/// empty buffer.
///
/// # Arguments
/// * `kind` - The sketch type every buffer is expected to hold.
/// * `buffers` - Slice of buffers produced by [`Sketch::to_bytes`].
pub fn compact_bytes(kind: SketchKind, buffers: &[&[u8]]) -> Result<Vec<u8>, SketchError> {
    if buffers.is_empty() {
        return Ok(Vec::new());
    }
    for bytes in buffers {
        let found = peek_kind(bytes)?;
        if found != kind {
            return Err(SketchError::MalformedInput(format!(
                "Cannot compact a {} buffer as {}",
                found, kind
            )));
        }
    }

    match kind {
        SketchKind::HyperLogLog => merge_serialized::<HyperLogLog>(buffers)?.to_bytes(),
        SketchKind::BloomFilter => merge_serialized::<BloomFilter>(buffers)?.to_bytes(),
        SketchKind::MinHash => merge_serialized::<MinHash>(buffers)?.to_bytes(),
        SketchKind::CountMinSketch => merge_serialized::<CountMinSketch>(buffers)?.to_bytes(),
        SketchKind::TDigest => merge_serialized::<TDigest>(buffers)?.to_bytes(),
    }
}
