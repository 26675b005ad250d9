// Spent-Output Filter - Bloom filter over consumed output ids
//
// Insertion-only. Catches reuse of an output even after the output itself
// has been consumed and evicted from the ledger. No false negatives; the
// false-positive rate stays near the configured target while the number of
// inserted ids is within capacity. Nothing is ever evicted.

use crate::ledger::utxo::OutputId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default number of ids the filter is sized for
pub const DEFAULT_FILTER_CAPACITY: usize = 10_000;

/// Default target false-positive rate
pub const DEFAULT_FILTER_ERROR_RATE: f64 = 0.001;

/// Bloom filter of spent output ids
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpentFilter {
    bits: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
    capacity: usize,
    inserted: usize,
}

impl Default for SpentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_CAPACITY, DEFAULT_FILTER_ERROR_RATE)
    }
}

impl SpentFilter {
    /// Create a filter sized for `capacity` ids at `error_rate`
    ///
    /// Degenerate arguments are clamped: capacity to at least 1 and the
    /// error rate into (0, 0.5].
    pub fn new(capacity: usize, error_rate: f64) -> Self {
        let capacity = capacity.max(1);
        let error_rate = if error_rate.is_finite() {
            error_rate.clamp(f64::MIN_POSITIVE, 0.5)
        } else {
            DEFAULT_FILTER_ERROR_RATE
        };

        let ln2 = std::f64::consts::LN_2;
        let n = capacity as f64;
        let m = (-(n * error_rate.ln()) / (ln2 * ln2)).ceil().max(64.0);
        let k = ((m / n) * ln2).round().max(1.0);

        let num_bits = (m as u64).next_power_of_two();
        let words = num_bits.div_ceil(64) as usize;

        Self {
            bits: vec![0; words],
            num_bits,
            num_hashes: k as u32,
            capacity,
            inserted: 0,
        }
    }

    /// Record an id as spent
    pub fn insert(&mut self, id: &OutputId) {
        let (h1, h2) = Self::hash_pair(id);
        for i in 0..self.num_hashes {
            let bit = self.bit_index(h1, h2, i);
            self.bits[(bit / 64) as usize] |= 1u64 << (bit % 64);
        }
        self.inserted += 1;
    }

    /// Check whether an id may have been spent
    pub fn contains(&self, id: &OutputId) -> bool {
        let (h1, h2) = Self::hash_pair(id);
        (0..self.num_hashes).all(|i| {
            let bit = self.bit_index(h1, h2, i);
            self.bits[(bit / 64) as usize] & (1u64 << (bit % 64)) != 0
        })
    }

    /// Number of insert calls so far
    pub fn len(&self) -> usize {
        self.inserted
    }

    /// Check if nothing has been inserted
    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    /// Number of ids the filter was sized for
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Size of the bit array
    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    /// Number of hash functions
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Whether more ids were inserted than the filter was sized for
    pub fn is_saturated(&self) -> bool {
        self.inserted > self.capacity
    }

    fn bit_index(&self, h1: u64, h2: u64, i: u32) -> u64 {
        h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.num_bits
    }

    // Double hashing (Kirsch-Mitzenmacher) over one SHA-256 digest.
    fn hash_pair(id: &OutputId) -> (u64, u64) {
        let mut hasher = Sha256::new();
        hasher.update(b"spent:");
        hasher.update(id.tx_id().as_bytes());
        hasher.update(b":");
        hasher.update(id.index().to_le_bytes());
        let digest = hasher.finalize();

        let mut a = [0u8; 8];
        let mut b = [0u8; 8];
        a.copy_from_slice(&digest[0..8]);
        b.copy_from_slice(&digest[8..16]);
        // Odd step: with a power-of-two bit count the k positions never repeat.
        (u64::from_le_bytes(a), u64::from_le_bytes(b) | 1)
    }
}
