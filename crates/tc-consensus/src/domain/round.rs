//! Round entity and its pure computation methods
//!
//! A round is one full rotation of the miner set, one time slot per miner
//! plus a trailing extra-block slot for the designated terminator. All
//! consensus-affecting iteration over the miner map goes through the
//! `BTreeMap` key order or the explicit `order` field, never any ambient
//! map order.

use crate::domain::error::{ConsensusError, ConsensusResult};
use crate::domain::miner::MinerInRound;
use serde::{Deserialize, Serialize};
use shared_crypto::{hash_to_i64, xor_hashes, MinerPublicKey};
use shared_types::{BlockHeight, Hash, TimestampMs, MILLISECONDS_PER_SECOND, ZERO_HASH};
use std::collections::BTreeMap;

/// One consensus round.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// Monotonically increasing round counter, never reused.
    pub round_number: u64,
    /// Term this round belongs to.
    pub term_number: u64,
    /// Width of one mining slot in milliseconds.
    pub mining_interval_ms: u64,
    /// Miner slots, canonically ordered by public key.
    pub miners: BTreeMap<MinerPublicKey, MinerInRound>,
    /// Who terminated the previous round.
    pub extra_block_producer_of_previous_round: Option<MinerPublicKey>,
    /// Last irreversible block height; non-decreasing across every
    /// transition, including term changes.
    pub confirmed_irreversible_block_height: BlockHeight,
    /// Round in which the height above was confirmed; equally monotonic.
    pub confirmed_irreversible_block_round_number: u64,
}

impl Round {
    /// Number of miner slots.
    pub fn miner_count(&self) -> usize {
        self.miners.len()
    }

    /// 2/3 + 1 of the miner count: the agreement quorum for LIB and
    /// term-change decisions.
    pub fn miners_count_of_consent(&self) -> usize {
        self.miner_count() * 2 / 3 + 1
    }

    /// Miner slots sorted by their assigned order (ties by key order).
    pub fn miners_in_order(&self) -> Vec<&MinerInRound> {
        let mut miners: Vec<&MinerInRound> = self.miners.values().collect();
        miners.sort_by_key(|m| m.order);
        miners
    }

    /// Slot lookup by stable order index.
    pub fn miner_by_order(&self, order: u32) -> Option<&MinerInRound> {
        self.miners.values().find(|m| m.order == order)
    }

    /// The order-1 miner.
    pub fn first_miner(&self) -> Option<&MinerInRound> {
        self.miner_by_order(1)
    }

    /// The designated round terminator.
    pub fn extra_block_producer(&self) -> Option<&MinerInRound> {
        self.miners.values().find(|m| m.is_extra_block_producer)
    }

    /// Miners that produced their full block this round, in order.
    pub fn mined_miners(&self) -> Vec<&MinerInRound> {
        self.miners_in_order()
            .into_iter()
            .filter(|m| m.has_mined())
            .collect()
    }

    /// Start of the round: the order-1 miner's slot time.
    pub fn round_start_time(&self) -> TimestampMs {
        self.first_miner().map_or(0, |m| m.expected_mining_time)
    }

    /// When the extra-block slot begins: after every miner's slot.
    pub fn extra_block_mining_time(&self) -> TimestampMs {
        self.round_start_time() + self.mining_interval_ms * self.miner_count() as u64
    }

    /// Full round duration: one slot per miner plus the extra-block slot.
    pub fn total_milliseconds(&self) -> u64 {
        self.mining_interval_ms * (self.miner_count() as u64 + 1)
    }

    /// End of a miner's slot.
    pub fn slot_end_time(&self, miner: &MinerInRound) -> TimestampMs {
        miner.expected_mining_time + self.mining_interval_ms
    }

    /// Whether `at` falls at or past the end of the miner's slot.
    ///
    /// This is the single slot-end comparison in the codebase; the
    /// scheduler and the validators both route through it so a block at
    /// exactly the boundary is judged the same way everywhere.
    pub fn is_time_slot_passed(&self, pubkey: &MinerPublicKey, at: TimestampMs) -> ConsensusResult<bool> {
        let miner = self
            .miners
            .get(pubkey)
            .ok_or_else(|| ConsensusError::UnknownMiner(pubkey.to_string()))?;
        Ok(at >= self.slot_end_time(miner))
    }

    /// Mix a revealed value with every miner's current signature.
    ///
    /// `XOR(in_value, fold_XOR(signatures))`, folding in canonical key
    /// order. The last miner to reveal in a round can observe all other
    /// signatures before choosing its own contribution; that grinding
    /// window is an accepted residual risk of the scheme, not something
    /// this function tries to hide.
    pub fn calculate_signature(&self, in_value: &Hash) -> Hash {
        let mut folded = ZERO_HASH;
        for miner in self.miners.values() {
            if let Some(signature) = &miner.signature {
                folded = xor_hashes(&folded, signature);
            }
        }
        xor_hashes(in_value, &folded)
    }

    /// Deterministic round identifier.
    ///
    /// The sum of all expected mining times when every slot has one; the
    /// round number otherwise. In-round updates (UpdateValue/TinyBlock)
    /// never change it; round/term terminations always do.
    pub fn round_id(&self) -> i64 {
        if !self.miners.is_empty() && self.miners.values().all(|m| m.expected_mining_time > 0) {
            self.miners
                .values()
                .fold(0i64, |acc, m| acc.wrapping_add(m.expected_mining_time as i64))
        } else {
            self.round_number as i64
        }
    }

    /// Validate that expected mining times are evenly spaced by the mining
    /// interval, within the tolerance band, regardless of who mined.
    pub fn check_time_slots(&self, tolerance_ms: u64) -> ConsensusResult<()> {
        let miners = self.miners_in_order();
        for pair in miners.windows(2) {
            let earlier = pair[0].expected_mining_time;
            let later = pair[1].expected_mining_time;
            if later < earlier {
                return Err(ConsensusError::InvalidRoundData(format!(
                    "expected mining times out of order at slots {} and {}",
                    pair[0].order, pair[1].order
                )));
            }
            let spacing = later - earlier;
            let deviation = spacing.abs_diff(self.mining_interval_ms);
            if deviation > tolerance_ms {
                return Err(ConsensusError::InvalidRoundData(format!(
                    "slot spacing {spacing}ms deviates from interval {}ms at order {}",
                    self.mining_interval_ms, pair[1].order
                )));
            }
        }
        Ok(())
    }

    /// Whether one timestamp lies in a later term period than the given
    /// term has served.
    pub fn is_time_to_change_term(
        blockchain_start_time: TimestampMs,
        timestamp: TimestampMs,
        term_number: u64,
        period_seconds: u64,
    ) -> bool {
        if period_seconds == 0 {
            return false;
        }
        let elapsed_seconds = timestamp.saturating_sub(blockchain_start_time) / MILLISECONDS_PER_SECOND;
        elapsed_seconds / period_seconds + 1 > term_number
    }

    /// Term-change quorum: at least 2/3 + 1 miners must have produced a
    /// block past the term period boundary. Wall-clock alone never ends a
    /// term.
    pub fn need_to_change_term(
        &self,
        blockchain_start_time: TimestampMs,
        period_seconds: u64,
    ) -> bool {
        let agreeing = self
            .miners
            .values()
            .filter(|m| {
                m.actual_mining_times.iter().any(|&t| {
                    Self::is_time_to_change_term(
                        blockchain_start_time,
                        t,
                        self.term_number,
                        period_seconds,
                    )
                })
            })
            .count();
        agreeing >= self.miners_count_of_consent()
    }

    /// Derive a 1-based order from a signature hash.
    pub fn derive_order_from_signature(signature: &Hash, miner_count: usize) -> u32 {
        if miner_count == 0 {
            return 0;
        }
        (hash_to_i64(signature).unsigned_abs() % miner_count as u64 + 1) as u32
    }

    /// Resolve an order conflict: scan cyclically from the supposed order
    /// for the first position not already claimed.
    pub fn resolve_final_order(supposed: u32, taken: &[u32], miner_count: usize) -> u32 {
        if miner_count == 0 {
            return 0;
        }
        let supposed = supposed.clamp(1, miner_count as u32);
        let count = miner_count as u32;
        for offset in 0..count {
            let candidate = (supposed - 1 + offset) % count + 1;
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
        supposed
    }

    /// Order of the next round's extra block producer, derived from this
    /// round's aggregate signature data: the first in-order miner carrying
    /// a signature seeds the selection; with no signatures at all the
    /// first slot is used.
    pub fn next_extra_block_producer_order(&self) -> u32 {
        let count = self.miner_count();
        if count == 0 {
            return 0;
        }
        match self
            .miners_in_order()
            .into_iter()
            .find_map(|m| m.signature.as_ref())
        {
            Some(signature) => Self::derive_order_from_signature(signature, count),
            None => 1,
        }
    }
}
