//! Consensus header information blob
//!
//! The round-transition proposal a miner attaches to a block header, and
//! the trigger data a local miner supplies when asking the core to build
//! one. Wire format is bincode; malformed bytes surface as errors, never
//! panics.

use crate::domain::behaviour::ConsensusBehaviour;
use crate::domain::error::{ConsensusError, ConsensusResult};
use crate::domain::round::Round;
use serde::{Deserialize, Serialize};
use shared_crypto::MinerPublicKey;
use shared_types::Hash;
use std::collections::BTreeMap;

/// A proposed round transition, as carried in a block header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusHeaderInformation {
    /// Who proposes.
    pub sender_public_key: MinerPublicKey,
    /// The proposed round state after the transition.
    pub round: Round,
    /// Declared transition behaviour.
    pub behaviour: ConsensusBehaviour,
}

impl ConsensusHeaderInformation {
    /// Serialize for transport inside a block header.
    pub fn to_bytes(&self) -> ConsensusResult<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| ConsensusError::MalformedHeaderInformation(e.to_string()))
    }

    /// Deserialize from untrusted header bytes.
    ///
    /// Key fields inside re-validate themselves on decode, so a blob that
    /// parses still cannot smuggle a malformed public key.
    pub fn from_bytes(bytes: &[u8]) -> ConsensusResult<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| ConsensusError::MalformedHeaderInformation(e.to_string()))
    }
}

/// Local trigger data for building a proposal.
///
/// The secrets only the mining node knows: this round's fresh `in_value`,
/// the previous round's value being revealed, and any shares of other
/// miners' secrets this node has decrypted. Raw key bytes are validated at
/// the service boundary before use.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TriggerInformation {
    /// The requesting miner's raw public key bytes.
    pub public_key_bytes: Vec<u8>,
    /// Fresh secret for this round (UpdateValue only).
    pub in_value: Option<Hash>,
    /// Reveal of the previous round's secret.
    pub previous_in_value: Option<Hash>,
    /// Decrypted Shamir shares of other miners' previous-round secrets,
    /// keyed by the producing miner's raw key bytes.
    pub decrypted_pieces: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Chain height of the block being produced; becomes the miner's
    /// implied irreversible height attestation.
    pub current_block_height: u64,
}

impl TriggerInformation {
    /// Trigger with identity only, for behaviours that need no secrets.
    pub fn from_public_key(public_key: &MinerPublicKey) -> Self {
        Self {
            public_key_bytes: public_key.to_vec(),
            ..Self::default()
        }
    }
}
