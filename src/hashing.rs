// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

//! Seeded 64-bit hashing.
//!
//! Every sketch derives its hash functions from keyed SipHash-1-3. Both 128 bits of key
//! material are expanded from the caller's seed, so each seed selects an independent
//! member of the family. The hash is well distributed but not meant to resist an
//! adversary choosing inputs.

use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// SplitMix64 finalizer, used to spread a small seed over a full key.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[inline]
fn keyed_hasher(seed: u64) -> SipHasher13 {
    let k0 = mix64(seed);
    let k1 = mix64(seed.wrapping_add(GOLDEN_GAMMA));
    SipHasher13::new_with_keys(k0, k1)
}

/// Hashes raw bytes with the function selected by `seed`.
pub fn hash_bytes(seed: u64, bytes: &[u8]) -> u64 {
    let mut hasher = keyed_hasher(seed);
    hasher.write(bytes);
    hasher.finish()
}

/// Hashes any [`Hash`] value with the function selected by `seed`.
///
/// Note that `str` and `[u8]` feed slightly different byte streams to the hasher, so
/// `"a"` and `b"a"` are distinct items.
pub fn hash_item<T: Hash + ?Sized>(seed: u64, item: &T) -> u64 {
    let mut hasher = keyed_hasher(seed);
    item.hash(&mut hasher);
    hasher.finish()
}

/// The `i`-th seed derived from a base seed.
#[inline]
pub fn nth_seed(seed: u64, i: u64) -> u64 {
    mix64(seed ^ mix64(i.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA)))
}

/// Derives `n` distinct seeds from a base seed.
pub fn derive_seeds(seed: u64, n: usize) -> Vec<u64> {
    (0..n as u64).map(|i| nth_seed(seed, i)).collect()
}
