// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::config::MinHashConfig;
use crate::enums::SketchKind;
use crate::hashing::hash_item;
use crate::traits::{IdempotentMerge, Sketch, SketchError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use tracing::debug;

/// Modulus of the universal hash family, 2^61 - 1.
pub const MERSENNE_PRIME: u64 = (1 << 61) - 1;

/// Value of a slot that has not seen any element.
pub const EMPTY_SLOT: u64 = u64::MAX;

/// MinHash - Similarity Signature
///
/// Keeps, for each of `num_perm` hash functions `h_i(x) = (a_i·hash(x) + b_i) mod p`, the
/// minimum value seen. The fraction of slots on which two signatures agree is an unbiased
/// estimate of the Jaccard similarity of the underlying sets, with variance `O(1/num_perm)`.
///
/// # Key Properties
///
/// - **Fixed Memory**: `num_perm` slots plus one coefficient pair per slot.
/// - **Mergeable**: Signatures with the same coefficients merge by element-wise minimum,
///   which yields the signature of the set union.
/// - **Idempotent**: Re-adding an element or re-merging a signature changes nothing.
///
/// # Example
///
/// ```
/// use stream_sketches::MinHash;
///
/// let mut a = MinHash::new(128).unwrap();
/// let mut b = MinHash::new(128).unwrap();
/// for word in ["the", "quick", "brown", "fox"] {
///     a.update(word);
/// }
/// for word in ["the", "quick", "brown", "dog"] {
///     b.update(word);
/// }
///
/// let j = a.jaccard(&b).unwrap();
/// assert!(j > 0.3 && j < 0.9); // true value is 0.6
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinHash {
    seed: u64,
    /// `(a_i, b_i)` with `a_i` in `[1, p)` and `b_i` in `[0, p)`
    permutations: Vec<(u64, u64)>,
    hashvalues: Vec<u64>,
}

impl MinHash {
    /// Creates an empty signature of length `num_perm` using seed 1.
    pub fn new(num_perm: usize) -> Result<Self, SketchError> {
        Self::with_seed(num_perm, 1)
    }

    /// Creates an empty signature whose coefficients are drawn from `seed`.
    ///
    /// Only signatures created with the same `num_perm` and `seed` can be compared or merged.
    pub fn with_seed(num_perm: usize, seed: u64) -> Result<Self, SketchError> {
        if num_perm == 0 {
            return Err(SketchError::InvalidConfig(
                "MinHash num_perm must be positive".into(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let permutations = (0..num_perm)
            .map(|_| {
                (
                    rng.random_range(1..MERSENNE_PRIME),
                    rng.random_range(0..MERSENNE_PRIME),
                )
            })
            .collect();

        debug!(num_perm, seed, "created MinHash");

        Ok(Self {
            seed,
            permutations,
            hashvalues: vec![EMPTY_SLOT; num_perm],
        })
    }

    /// Folds `item` into every slot of the signature.
    pub fn update<T: Hash + ?Sized>(&mut self, item: &T) {
        let hv = hash_item(self.seed, item) as u128;
        let p = MERSENNE_PRIME as u128;
        for (slot, &(a, b)) in self.hashvalues.iter_mut().zip(&self.permutations) {
            let phv = ((a as u128 * hv + b as u128) % p) as u64;
            if phv < *slot {
                *slot = phv;
            }
        }
    }

    /// Estimated Jaccard similarity with `other`, in `[0, 1]`.
    ///
    /// Two empty signatures are considered identical.
    pub fn jaccard(&self, other: &Self) -> Result<f64, SketchError> {
        self.check_compatible(other)?;
        let agree = self
            .hashvalues
            .iter()
            .zip(&other.hashvalues)
            .filter(|(a, b)| a == b)
            .count();
        Ok(agree as f64 / self.hashvalues.len() as f64)
    }

    /// Estimated number of distinct elements folded into the signature.
    pub fn count(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let p = MERSENNE_PRIME as f64;
        let sum: f64 = self.hashvalues.iter().map(|&v| v as f64 / p).sum();
        self.hashvalues.len() as f64 / sum - 1.0
    }

    /// The signature itself.
    pub fn digest(&self) -> &[u64] {
        &self.hashvalues
    }

    pub fn num_perm(&self) -> usize {
        self.hashvalues.len()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> MinHashConfig {
        MinHashConfig {
            num_perm: self.num_perm(),
            seed: self.seed,
        }
    }

    pub fn clear(&mut self) {
        self.hashvalues.iter_mut().for_each(|v| *v = EMPTY_SLOT);
    }

    fn check_compatible(&self, other: &Self) -> Result<(), SketchError> {
        if self.hashvalues.len() != other.hashvalues.len() {
            return Err(SketchError::IncompatibleMerge(format!(
                "MinHash num_perm mismatch: {} vs {}",
                self.hashvalues.len(),
                other.hashvalues.len()
            )));
        }
        if self.seed != other.seed || self.permutations != other.permutations {
            return Err(SketchError::IncompatibleMerge(format!(
                "MinHash permutation mismatch: seed {} vs {}",
                self.seed, other.seed
            )));
        }
        Ok(())
    }
}

impl Sketch for MinHash {
    const KIND: SketchKind = SketchKind::MinHash;

    /// Element-wise minimum; the result is the signature of the union.
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if let Err(e) = self.check_compatible(other) {
            debug!(error = %e, "rejected MinHash merge");
            return Err(e);
        }
        for (mine, &theirs) in self.hashvalues.iter_mut().zip(&other.hashvalues) {
            if theirs < *mine {
                *mine = theirs;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), SketchError> {
        if self.hashvalues.is_empty() || self.hashvalues.len() != self.permutations.len() {
            return Err(SketchError::MalformedInput(format!(
                "MinHash has {} slots and {} permutations",
                self.hashvalues.len(),
                self.permutations.len()
            )));
        }
        let coefficients_ok = self
            .permutations
            .iter()
            .all(|&(a, b)| (1..MERSENNE_PRIME).contains(&a) && b < MERSENNE_PRIME);
        let slots_ok = self
            .hashvalues
            .iter()
            .all(|&v| v < MERSENNE_PRIME || v == EMPTY_SLOT);
        if !coefficients_ok || !slots_ok {
            return Err(SketchError::MalformedInput(
                "MinHash value outside the hash field".into(),
            ));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.hashvalues.iter().all(|&v| v == EMPTY_SLOT)
    }
}

impl IdempotentMerge for MinHash {}
