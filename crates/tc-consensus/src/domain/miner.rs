//! Per-round miner slot entity

use serde::{Deserialize, Serialize};
use shared_crypto::MinerPublicKey;
use shared_types::{BlockHeight, Hash, TimestampMs};
use std::collections::BTreeMap;

/// One miner's state within a round.
///
/// The commit-reveal material lives here: `out_value` is the commitment
/// `sha256(in_value)` published when the miner mines its slot,
/// `previous_in_value` is the reveal of the *prior* round's secret, and the
/// piece maps hold the Shamir shares that let the network recover a secret
/// the miner fails to reveal itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinerInRound {
    /// Validated miner identity.
    pub public_key: MinerPublicKey,
    /// Position (1..N) assigned for this round.
    pub order: u32,
    /// Whether this miner is the designated round terminator.
    pub is_extra_block_producer: bool,
    /// Timestamp this miner's slot begins.
    pub expected_mining_time: TimestampMs,
    /// Commitment `sha256(in_value)`, set once when the miner mines.
    pub out_value: Option<Hash>,
    /// Entropy-mixed signature derived from the revealed secret.
    pub signature: Option<Hash>,
    /// This round's revealed secret, back-filled at round-transition time.
    pub in_value: Option<Hash>,
    /// The prior round's revealed secret; must satisfy
    /// `sha256(previous_in_value) == previous_round.out_value`.
    pub previous_in_value: Option<Hash>,
    /// Shamir shares this miner distributed, keyed by recipient.
    pub encrypted_pieces: BTreeMap<MinerPublicKey, Vec<u8>>,
    /// Shares of this miner's secret decrypted by peers, keyed by contributor.
    pub decrypted_pieces: BTreeMap<MinerPublicKey, Vec<u8>>,
    /// Blocks produced in this round.
    pub produced_blocks: u64,
    /// Cumulative missed slots carried across rounds.
    pub missed_time_slots: u64,
    /// Tiny blocks produced inside the current slot.
    pub produced_tiny_blocks: u32,
    /// Real-world timestamps of every block this miner produced this round.
    pub actual_mining_times: Vec<TimestampMs>,
    /// Height this miner attests is irreversible; carried forward across
    /// transitions that produce no new attestation.
    pub implied_irreversible_block_height: BlockHeight,
    /// Order derived from this miner's signature before tie-breaking.
    pub supposed_order_of_next_round: u32,
    /// Tie-broken order for the following round.
    pub final_order_of_next_round: u32,
}

impl MinerInRound {
    /// Create a fresh slot with no mining data.
    pub fn new(public_key: MinerPublicKey, order: u32, expected_mining_time: TimestampMs) -> Self {
        Self {
            public_key,
            order,
            is_extra_block_producer: false,
            expected_mining_time,
            out_value: None,
            signature: None,
            in_value: None,
            previous_in_value: None,
            encrypted_pieces: BTreeMap::new(),
            decrypted_pieces: BTreeMap::new(),
            produced_blocks: 0,
            missed_time_slots: 0,
            produced_tiny_blocks: 0,
            actual_mining_times: Vec::new(),
            implied_irreversible_block_height: 0,
            supposed_order_of_next_round: 0,
            final_order_of_next_round: 0,
        }
    }

    /// Whether this miner has produced its full block this round.
    pub fn has_mined(&self) -> bool {
        self.out_value.is_some()
    }

    /// The most recent real-world mining time, if any.
    pub fn latest_actual_mining_time(&self) -> Option<TimestampMs> {
        self.actual_mining_times.last().copied()
    }
}
