//! # SHA-256 Hashing
//!
//! Commitment hashing and entropy mixing for the consensus core.
//!
//! The commit-reveal scheme records `sha256(in_value)` as a miner's
//! `out_value`; the same digest is recomputed on every path that ingests a
//! revealed value. Signature mixing XORs hashes so that every miner's
//! contribution feeds every other miner's next signature.

use sha2::{Digest, Sha256};
use shared_types::Hash;

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

/// Hash multiple inputs as one stream.
pub fn sha256_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    for input in inputs {
        hasher.update(input);
    }
    let digest = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

/// XOR two hashes.
pub fn xor_hashes(a: &Hash, b: &Hash) -> Hash {
    let mut result = [0u8; 32];
    for i in 0..32 {
        result[i] = a[i] ^ b[i];
    }
    result
}

/// Interpret the leading 8 bytes of a hash as a big-endian `i64`.
///
/// Used to derive mining orders from signature hashes; callers take the
/// absolute value modulo the miner count.
pub fn hash_to_i64(hash: &Hash) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[0..8]);
    i64::from_be_bytes(bytes)
}
