//! Domain model for the consensus core
//!
//! Pure data structures and computation: rounds, miner slots, behaviour
//! scheduling, LIB derivation. Nothing in this module touches storage,
//! clocks, or collaborators. Context is passed in explicitly so every
//! function is testable in isolation.

pub mod behaviour;
pub mod command;
pub mod error;
pub mod generation;
pub mod header_info;
pub mod lib_calculator;
pub mod miner;
pub mod round;

pub use behaviour::{BehaviourScheduler, ConsensusBehaviour};
pub use command::ConsensusCommand;
pub use error::{ConsensusError, ConsensusResult};
pub use header_info::{ConsensusHeaderInformation, TriggerInformation};
pub use lib_calculator::LibCalculator;
pub use miner::MinerInRound;
pub use round::Round;

use shared_crypto::sha256;
use shared_types::Hash;

/// The commit-reveal invariant: a revealed value matches its commitment.
///
/// This is the one commitment check in the codebase. Every ingestion path
/// (a proposer's own reveal, reveals embedded for other miners, values
/// reconstructed from Shamir shares) calls this same function.
pub fn commitment_matches(revealed: &Hash, committed: &Hash) -> bool {
    sha256(revealed) == *committed
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::round::Round;
    use k256::elliptic_curve::sec1::ToEncodedPoint;
    use shared_crypto::MinerPublicKey;
    use shared_types::TimestampMs;

    /// Deterministic valid secp256k1 key for tests.
    pub fn test_key(seed: u8) -> MinerPublicKey {
        let mut scalar = [0u8; 32];
        scalar[31] = seed;
        let secret = k256::SecretKey::from_slice(&scalar).expect("nonzero scalar");
        MinerPublicKey::from_bytes(secret.public_key().to_encoded_point(true).as_bytes())
            .expect("generated key is valid")
    }

    pub fn keys(seeds: &[u8]) -> Vec<MinerPublicKey> {
        seeds.iter().map(|&s| test_key(s)).collect()
    }

    /// A fresh round with `count` miners, slots starting at `start_time`.
    pub fn round_with_miners(count: usize, interval_ms: u64, start_time: TimestampMs) -> Round {
        let miner_keys: Vec<MinerPublicKey> = (1..=count as u8).map(test_key).collect();
        Round::generate_first_round_of_new_term(&miner_keys, interval_ms, start_time, 1, 1)
            .expect("non-empty miner list")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commitment_round_trip() {
        let in_value = sha256(b"secret");
        let out_value = sha256(&in_value);
        assert!(commitment_matches(&in_value, &out_value));
        assert!(!commitment_matches(&out_value, &in_value));
    }
}
