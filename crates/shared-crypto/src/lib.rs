//! # Shared Crypto - Consensus Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Commitment hashes, entropy mixing |
//! | `field` | Goldilocks prime field | Shamir share arithmetic |
//! | `secret_sharing` | Shamir threshold sharing | Commit-reveal recovery |
//! | `keys` | secp256k1 SEC1 validation | Miner identity ingestion |
//!
//! ## Security Properties
//!
//! - **SHA-256**: the commitment invariant `sha256(in_value) == out_value`
//!   is checked on every ingestion path, primary or side-channel.
//! - **Shamir**: any `threshold` shares reconstruct the secret exactly;
//!   fewer reveal nothing. Reconstruction takes exactly `threshold` shares.
//! - **Keys**: every externally supplied public key is decoded as a SEC1
//!   curve point before a single byte of it is used anywhere else.

pub mod errors;
pub mod field;
pub mod hashing;
pub mod keys;
pub mod secret_sharing;

// Re-exports
pub use errors::CryptoError;
pub use field::FieldElement;
pub use hashing::{hash_to_i64, sha256, sha256_many, xor_hashes};
pub use keys::{MinerPublicKey, MINER_PUBLIC_KEY_LENGTH};
pub use secret_sharing::{decode_secret, encode_secret, secret_sharing_threshold};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
