//! Error types for cryptographic operations

/// Cryptographic error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid public key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Public key is not a valid secp256k1 curve point")]
    InvalidCurvePoint,

    #[error("Cannot share an empty secret")]
    EmptySecret,

    #[error("Secret too long: {actual} bytes, maximum {max}")]
    SecretTooLong { max: usize, actual: usize },

    #[error("Invalid threshold {threshold} for {total} total shares")]
    InvalidThreshold { threshold: usize, total: usize },

    #[error("Reconstruction requires exactly {expected} shares, got {actual}")]
    WrongShareCount { expected: usize, actual: usize },

    #[error("Malformed share: {0}")]
    MalformedShare(String),

    #[error("Duplicate share position: {0}")]
    DuplicateSharePosition(u64),

    #[error("Share positions must be non-zero")]
    ZeroSharePosition,
}

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;
