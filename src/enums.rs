// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::traits::SketchError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enumeration of supported sketch types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SketchKind {
    HyperLogLog,
    BloomFilter,
    MinHash,
    CountMinSketch,
    TDigest,
}

impl SketchKind {
    /// Whether merging the same snapshot more than once leaves estimates unchanged.
    pub fn has_idempotent_merge(&self) -> bool {
        matches!(
            self,
            SketchKind::HyperLogLog | SketchKind::BloomFilter | SketchKind::MinHash
        )
    }
}

impl fmt::Display for SketchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchKind::HyperLogLog => write!(f, "HyperLogLog"),
            SketchKind::BloomFilter => write!(f, "BloomFilter"),
            SketchKind::MinHash => write!(f, "MinHash"),
            SketchKind::CountMinSketch => write!(f, "CountMinSketch"),
            SketchKind::TDigest => write!(f, "TDigest"),
        }
    }
}

impl FromStr for SketchKind {
    type Err = SketchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace(['_', '-'], "").to_lowercase().as_str() {
            "hyperloglog" | "hll" => Ok(SketchKind::HyperLogLog),
            "bloomfilter" | "bloom" => Ok(SketchKind::BloomFilter),
            "minhash" => Ok(SketchKind::MinHash),
            "countminsketch" | "cms" => Ok(SketchKind::CountMinSketch),
            "tdigest" => Ok(SketchKind::TDigest),
            _ => Err(SketchError::InvalidConfig(format!("Unknown sketch type: {}", s))),
        }
    }
}
