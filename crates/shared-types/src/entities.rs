//! # Core Primitive Types
//!
//! Defines the primitives every Tempo-Chain crate builds on: hashes,
//! timestamps, and block heights.
//!
//! All consensus timestamps are unix milliseconds. Mining slots, round
//! durations, and term periods are expressed in the same unit so slot
//! arithmetic never mixes resolutions.

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// A unix timestamp in milliseconds.
pub type TimestampMs = u64;

/// A block height in the chain.
pub type BlockHeight = u64;

/// Milliseconds in one second, for term-period arithmetic.
pub const MILLISECONDS_PER_SECOND: u64 = 1_000;

/// The zero hash, used as an absent/initial value in a few places.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Abbreviated hex rendering of a byte string, for logs.
///
/// Renders the first four bytes followed by `..` (or the whole string if it
/// is that short already).
pub fn hex_short(bytes: &[u8]) -> String {
    let shown = bytes.iter().take(4).map(|b| format!("{b:02x}")).collect::<String>();
    if bytes.len() > 4 {
        format!("{shown}..")
    } else {
        shown
    }
}

/// Full hex rendering of a byte string.
pub fn hex_full(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
