// Copyright (c) 2026 Adrian Robinson. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.

use crate::config::HyperLogLogConfig;
use crate::enums::SketchKind;
use crate::hashing::hash_item;
use crate::traits::{IdempotentMerge, Sketch, SketchError};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use tracing::{debug, warn};

/// Smallest supported precision (16 registers).
pub const MIN_PRECISION: u8 = 4;

/// Largest supported precision (262,144 registers).
pub const MAX_PRECISION: u8 = 18;

/// Seed of the hash function used for register selection.
const HASH_SEED: u64 = 0x4c4c_4868_7970_6572;

/// 2^64, the size of the hash space.
const HASH_SPACE: f64 = 18_446_744_073_709_551_616.0;

/// HyperLogLog - Cardinality Estimator
///
/// A probabilistic data structure for estimating the number of unique elements (cardinality)
/// in a stream. It uses significantly less memory than storing the elements themselves.
///
/// # Key Properties
///
/// - **Fixed Memory**: One byte per register; `m = 2^p` registers chosen from the target error.
/// - **Accuracy**: Relative standard error is approximately `1.04 / sqrt(m)`.
/// - **Mergeable**: Replicas merge by taking the element-wise maximum of the registers.
/// - **Idempotent**: Adding the same element (or merging the same sketch) twice changes nothing.
///
/// # Example
///
/// ```
/// use stream_sketches::HyperLogLog;
///
/// let mut hll = HyperLogLog::new(0.01).unwrap();
/// hll.add("user1");
/// hll.add("user2");
/// hll.add("user3");
/// hll.add("user1"); // Duplicate
///
/// let count = hll.count();
/// assert!(count >= 2 && count <= 4); // Approximate count
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HyperLogLog {
    /// Number of index bits; `registers.len() == 1 << precision`
    precision: u8,
    /// Each register stores max leading zeros + 1 seen for its bucket
    registers: Vec<u8>,
}

impl HyperLogLog {
    /// Creates a HyperLogLog sized for relative standard error `error_rate`.
    ///
    /// The register count is `next_power_of_two(ceil((1.04 / error_rate)^2))`, clamped to
    /// the supported precision range.
    pub fn new(error_rate: f64) -> Result<Self, SketchError> {
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(SketchError::InvalidConfig(format!(
                "HyperLogLog error rate must be in (0, 1), got {}",
                error_rate
            )));
        }

        let wanted = (1.04 / error_rate).powi(2).ceil();
        let precision = if wanted > (1u64 << MAX_PRECISION) as f64 {
            warn!(
                error_rate,
                max_precision = MAX_PRECISION,
                "HyperLogLog error rate needs more registers than supported, clamping"
            );
            MAX_PRECISION
        } else {
            let m = (wanted as u64).next_power_of_two();
            let p = m.trailing_zeros() as u8;
            if p < MIN_PRECISION {
                warn!(error_rate, p, "HyperLogLog precision raised to minimum");
            }
            p.max(MIN_PRECISION)
        };

        Self::with_precision(precision)
    }

    /// Creates a HyperLogLog with `2^precision` registers.
    pub fn with_precision(precision: u8) -> Result<Self, SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&precision) {
            return Err(SketchError::InvalidConfig(format!(
                "HyperLogLog precision must be in {}..={}, got {}",
                MIN_PRECISION, MAX_PRECISION, precision
            )));
        }
        debug!(precision, registers = 1usize << precision, "created HyperLogLog");
        Ok(Self {
            precision,
            registers: vec![0u8; 1 << precision],
        })
    }

    /// Add an element to the HyperLogLog
    ///
    /// Returns `true` if the internal state changed.
    pub fn add<T: Hash + ?Sized>(&mut self, element: &T) -> bool {
        let hash = hash_item(HASH_SEED, element);
        let p = self.precision as u32;

        // Top p bits pick the register
        let register_idx = (hash >> (64 - p)) as usize;

        // A sentinel bit caps the run at 64 - p + 1 when the remainder is all zeros
        let remaining_bits = (hash << p) | (1u64 << (p - 1));
        let rank = remaining_bits.leading_zeros() as u8 + 1;

        let register = &mut self.registers[register_idx];
        if rank > *register {
            *register = rank;
            true
        } else {
            false
        }
    }

    /// Estimated number of distinct elements, rounded.
    pub fn count(&self) -> u64 {
        self.estimate().round() as u64
    }

    /// Estimated number of distinct elements.
    pub fn estimate(&self) -> f64 {
        let m = self.registers.len() as f64;

        // Harmonic mean of 2^register
        let mut sum = 0.0;
        let mut zeros = 0usize;
        for &val in &self.registers {
            if val == 0 {
                zeros += 1;
            }
            sum += 1.0 / (1u64 << val) as f64;
        }

        let raw = self.alpha() * m * m / sum;

        if raw <= 2.5 * m {
            // Small range correction (LinearCounting)
            if zeros > 0 {
                return m * (m / zeros as f64).ln();
            }
            raw
        } else if raw >= HASH_SPACE {
            // Saturated registers, the log correction is undefined here
            HASH_SPACE
        } else if raw > HASH_SPACE / 30.0 {
            // Large range correction
            (-HASH_SPACE * (1.0 - raw / HASH_SPACE).ln()).min(HASH_SPACE)
        } else {
            raw
        }
    }

    /// Relative standard error of [`HyperLogLog::estimate`] for this register count.
    pub fn relative_error(&self) -> f64 {
        1.04 / (self.registers.len() as f64).sqrt()
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn num_registers(&self) -> usize {
        self.registers.len()
    }

    pub fn registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn config(&self) -> HyperLogLogConfig {
        HyperLogLogConfig {
            error_rate: self.relative_error(),
            precision: Some(self.precision),
        }
    }

    /// Resets every register to zero.
    pub fn clear(&mut self) {
        self.registers.iter_mut().for_each(|r| *r = 0);
    }

    fn alpha(&self) -> f64 {
        match self.registers.len() {
            16 => 0.673,
            32 => 0.697,
            64 => 0.709,
            m => 0.7213 / (1.0 + 1.079 / m as f64),
        }
    }
}

impl Sketch for HyperLogLog {
    const KIND: SketchKind = SketchKind::HyperLogLog;

    /// Merges another HyperLogLog into this one (element-wise max).
    fn merge(&mut self, other: &Self) -> Result<(), SketchError> {
        if self.precision != other.precision {
            debug!(
                ours = self.precision,
                theirs = other.precision,
                "rejected HyperLogLog merge"
            );
            return Err(SketchError::IncompatibleMerge(format!(
                "HyperLogLog register count mismatch: {} vs {}",
                self.registers.len(),
                other.registers.len()
            )));
        }
        for (mine, &theirs) in self.registers.iter_mut().zip(&other.registers) {
            if theirs > *mine {
                *mine = theirs;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), SketchError> {
        if !(MIN_PRECISION..=MAX_PRECISION).contains(&self.precision) {
            return Err(SketchError::MalformedInput(format!(
                "Invalid HyperLogLog precision {}",
                self.precision
            )));
        }
        if self.registers.len() != 1 << self.precision {
            return Err(SketchError::MalformedInput(format!(
                "Invalid register count: expected {}, got {}",
                1usize << self.precision,
                self.registers.len()
            )));
        }
        let max_rank = 64 - self.precision + 1;
        if self.registers.iter().any(|&r| r > max_rank) {
            return Err(SketchError::MalformedInput(format!(
                "Register value above {}",
                max_rank
            )));
        }
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.registers.iter().all(|&x| x == 0)
    }
}

impl IdempotentMerge for HyperLogLog {}
