// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::codec;
use crate::enums::SketchKind;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Error type for sketch operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SketchError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Incompatible merge: {0}")]
    IncompatibleMerge(String),
    #[error("Quantile query on an empty digest")]
    EmptyDigest,
    #[error("Malformed input: {0}")]
    MalformedInput(String),
}

/// Core sketch trait - the capability contract shared by every structure in this crate.
///
/// Each sketch is built once from its configuration, updated one element at a time and
/// queried through read-only estimate methods. Instances built with the same configuration
/// can be combined with [`Sketch::merge`], which is the mechanism for distributed
/// aggregation: every shard builds a local sketch and a reducer merges them.
///
/// # Requirements
///
/// Implementations must satisfy the following algebraic properties:
/// - **Commutativity**: `merge(A, B)` answers queries like `merge(B, A)`
/// - **Associativity**: `merge(merge(A, B), C)` answers queries like `merge(A, merge(B, C))`
///
/// Sketches whose merge is also idempotent additionally implement [`IdempotentMerge`].
pub trait Sketch: Clone + Serialize + DeserializeOwned {
    /// Tag written into the serialized header.
    const KIND: SketchKind;

    /// Merges `other` into `self`.
    ///
    /// Fails with [`SketchError::IncompatibleMerge`] when the two instances were built with
    /// different structural parameters. `self` is left untouched on failure.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError>;

    /// Validates the internal consistency of the sketch state.
    ///
    /// Called after decoding a byte buffer so a corrupted payload is rejected up front.
    fn validate(&self) -> Result<(), SketchError>;

    /// Returns true if nothing has been added to the sketch.
    fn is_empty(&self) -> bool;

    /// Serializes the sketch: header, configuration, then raw payload.
    fn to_bytes(&self) -> Result<Vec<u8>, SketchError> {
        codec::encode(Self::KIND, self)
    }

    /// Restores a sketch previously produced by [`Sketch::to_bytes`].
    fn from_bytes(bytes: &[u8]) -> Result<Self, SketchError>
    where
        Self: Sized,
    {
        let sketch: Self = codec::decode(Self::KIND, bytes)?;
        sketch.validate()?;
        Ok(sketch)
    }
}

/// Marker for sketches whose merge is an element-wise max/min/or.
///
/// Merging the same snapshot twice is harmless for these types. Count-Min Sketch and
/// t-digest merges are additive and must be applied exactly once per contributing stream.
pub trait IdempotentMerge: Sketch {}
