//! Consensus command returned to the block-production layer

use crate::config::ConsensusConfig;
use crate::domain::behaviour::ConsensusBehaviour;
use crate::domain::miner::MinerInRound;
use crate::domain::round::Round;
use serde::{Deserialize, Serialize};
use shared_types::TimestampMs;

/// A scheduling decision with the slot math already done, so callers never
/// re-derive deadlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusCommand {
    /// What to do.
    pub behaviour: ConsensusBehaviour,
    /// When to do it.
    pub arranged_mining_time: TimestampMs,
    /// Hard deadline; past this the command is stale and must be
    /// re-requested.
    pub mining_due_time: TimestampMs,
    /// How many blocks the command covers.
    pub limit_of_blocks: u32,
}

impl ConsensusCommand {
    /// Build the command for a decided behaviour.
    pub fn for_behaviour(
        behaviour: ConsensusBehaviour,
        round: &Round,
        miner: &MinerInRound,
        now: TimestampMs,
        config: &ConsensusConfig,
    ) -> Self {
        match behaviour {
            ConsensusBehaviour::UpdateValue => Self {
                behaviour,
                arranged_mining_time: now.max(miner.expected_mining_time),
                mining_due_time: round.slot_end_time(miner),
                limit_of_blocks: 1,
            },
            ConsensusBehaviour::TinyBlock => Self {
                behaviour,
                arranged_mining_time: now,
                mining_due_time: round.slot_end_time(miner),
                limit_of_blocks: config.tiny_block_limit.saturating_sub(miner.produced_tiny_blocks),
            },
            ConsensusBehaviour::NextRound | ConsensusBehaviour::NextTerm => {
                let arranged = now.max(round.extra_block_mining_time());
                Self {
                    behaviour,
                    arranged_mining_time: arranged,
                    mining_due_time: arranged + round.mining_interval_ms,
                    limit_of_blocks: 1,
                }
            }
            ConsensusBehaviour::Nothing => Self::nothing(round, now),
        }
    }

    /// The idle command: check back around the next round boundary.
    pub fn nothing(round: &Round, now: TimestampMs) -> Self {
        let next_round_guess = round.extra_block_mining_time() + round.mining_interval_ms;
        Self {
            behaviour: ConsensusBehaviour::Nothing,
            arranged_mining_time: next_round_guess.max(now),
            mining_due_time: next_round_guess.max(now) + round.total_milliseconds(),
            limit_of_blocks: 0,
        }
    }
}
