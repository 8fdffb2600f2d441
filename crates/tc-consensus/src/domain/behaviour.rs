//! Consensus behaviour scheduling
//!
//! Given the current round, a miner identity, and the wall clock, decide
//! what that miner should do next. Pure decision logic: no state is
//! mutated, and time itself is the cancellation mechanism: once a slot
//! deadline passes the scheduler simply stops returning produce states.

use crate::config::{ChainRole, ConsensusConfig};
use crate::domain::round::Round;
use serde::{Deserialize, Serialize};
use shared_crypto::MinerPublicKey;
use shared_types::TimestampMs;
use std::fmt;

/// What a miner should do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsensusBehaviour {
    /// Produce the full block for this slot, carrying the commit/reveal
    /// payload.
    UpdateValue,
    /// Produce a secondary block inside the same slot.
    TinyBlock,
    /// Terminate the round (extra block producer).
    NextRound,
    /// Terminate the term (extra block producer, main chain only).
    NextTerm,
    /// Not this miner's turn.
    Nothing,
}

impl ConsensusBehaviour {
    /// Whether this behaviour ends the current round.
    pub fn is_terminating(&self) -> bool {
        matches!(self, Self::NextRound | Self::NextTerm)
    }
}

impl fmt::Display for ConsensusBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UpdateValue => "UpdateValue",
            Self::TinyBlock => "TinyBlock",
            Self::NextRound => "NextRound",
            Self::NextTerm => "NextTerm",
            Self::Nothing => "Nothing",
        };
        write!(f, "{name}")
    }
}

/// Stateless behaviour decision logic.
pub struct BehaviourScheduler;

impl BehaviourScheduler {
    /// Decide what `pubkey` should do at time `now`.
    pub fn decide(
        round: &Round,
        pubkey: &MinerPublicKey,
        now: TimestampMs,
        blockchain_start_time: TimestampMs,
        config: &ConsensusConfig,
    ) -> ConsensusBehaviour {
        let Some(miner) = round.miners.get(pubkey) else {
            return ConsensusBehaviour::Nothing;
        };

        // Round one is special: until the first miner commits, later miners
        // prefer terminating the round over producing, so genesis timing can
        // stabilize without forks.
        if round.round_number == 1
            && miner.order != 1
            && miner.out_value.is_none()
            && round.first_miner().is_some_and(|first| first.out_value.is_none())
        {
            return ConsensusBehaviour::NextRound;
        }

        let slot_passed = match round.is_time_slot_passed(pubkey, now) {
            Ok(passed) => passed,
            Err(_) => return ConsensusBehaviour::Nothing,
        };

        if !slot_passed {
            if miner.out_value.is_none() {
                return ConsensusBehaviour::UpdateValue;
            }
            if miner.produced_tiny_blocks < config.tiny_block_limit {
                return ConsensusBehaviour::TinyBlock;
            }
        }

        if miner.is_extra_block_producer && now >= round.extra_block_mining_time() {
            return match config.chain_role {
                // Side chains have no elections, so a term never ends.
                ChainRole::SideChain => ConsensusBehaviour::NextRound,
                ChainRole::MainChain => {
                    if round.need_to_change_term(blockchain_start_time, config.period_seconds) {
                        ConsensusBehaviour::NextTerm
                    } else {
                        ConsensusBehaviour::NextRound
                    }
                }
            };
        }

        ConsensusBehaviour::Nothing
    }
}
