//! Error types for the consensus core

use shared_crypto::CryptoError;

/// Consensus error types
///
/// Validation rejections are not errors: they come back as a
/// [`crate::validation::ValidationResult`] with `success = false` so the
/// node can drop the block without unwinding. The variants here cover
/// malformed input, missing state, and collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Unknown miner: {0}")]
    UnknownMiner(String),

    #[error("Miner list is empty")]
    EmptyMinerList,

    #[error("Round not found: {0}")]
    RoundNotFound(u64),

    #[error("Consensus state not initialized")]
    NotInitialized,

    #[error("Malformed consensus header information: {0}")]
    MalformedHeaderInformation(String),

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(#[from] CryptoError),

    #[error("Invalid round data: {0}")]
    InvalidRoundData(String),

    #[error("Election gateway error: {0}")]
    ElectionGatewayError(String),

    #[error("Next-term miner list does not match election result")]
    NextTermMinerListMismatch,

    #[error("Missing trigger data for behaviour: {0}")]
    MissingTriggerData(String),

    #[error("No consensus action is currently scheduled for this miner")]
    NothingScheduled,
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;
