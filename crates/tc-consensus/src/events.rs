//! Published event payloads
//!
//! Events are published after a state transition commits; a sink failure is
//! logged, never unwound into the already-committed transition.

use crate::domain::ConsensusBehaviour;
use serde::{Deserialize, Serialize};
use shared_crypto::MinerPublicKey;
use shared_types::{BlockHeight, TimestampMs};

/// The confirmed irreversible height advanced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrreversibleBlockFoundEvent {
    /// Round in which the height was confirmed.
    pub round_number: u64,
    /// The new irreversible height.
    pub height: BlockHeight,
}

/// A round transition was accepted and applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningInformationUpdatedEvent {
    /// The proposing miner.
    pub public_key: MinerPublicKey,
    /// The applied behaviour.
    pub behaviour: ConsensusBehaviour,
    /// When the proposing block was mined.
    pub mining_time: TimestampMs,
}
