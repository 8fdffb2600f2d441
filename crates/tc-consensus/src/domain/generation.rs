//! Round generation
//!
//! Builds the next round from the current one, and the first round of a new
//! term from an election result. Everything here is pure: two nodes calling
//! these functions with the same inputs produce byte-identical rounds.

use crate::domain::error::{ConsensusError, ConsensusResult};
use crate::domain::miner::MinerInRound;
use crate::domain::round::Round;
use shared_crypto::MinerPublicKey;
use shared_types::TimestampMs;
use std::collections::{BTreeMap, BTreeSet};

impl Round {
    /// Build the first round of a new term from an authoritative miner list.
    ///
    /// Every key has already passed curve-point validation at ingestion
    /// (`MinerPublicKey` cannot be built otherwise). Duplicates collapse;
    /// orders are assigned over the canonical key ordering, and the order-1
    /// miner terminates the round.
    pub fn generate_first_round_of_new_term(
        miner_keys: &[MinerPublicKey],
        mining_interval_ms: u64,
        start_time: TimestampMs,
        round_number: u64,
        term_number: u64,
    ) -> ConsensusResult<Round> {
        if miner_keys.is_empty() {
            return Err(ConsensusError::EmptyMinerList);
        }

        let distinct: BTreeSet<MinerPublicKey> = miner_keys.iter().copied().collect();
        let mut miners = BTreeMap::new();
        for (index, key) in distinct.iter().enumerate() {
            let order = index as u32 + 1;
            let expected = start_time + mining_interval_ms * index as u64;
            let mut slot = MinerInRound::new(*key, order, expected);
            slot.is_extra_block_producer = order == 1;
            miners.insert(*key, slot);
        }

        Ok(Round {
            round_number,
            term_number,
            mining_interval_ms,
            miners,
            extra_block_producer_of_previous_round: None,
            confirmed_irreversible_block_height: 0,
            confirmed_irreversible_block_round_number: 0,
        })
    }

    /// Generate the round that follows this one, with the same miner set.
    ///
    /// Miners that mined take their tie-broken `final_order_of_next_round`;
    /// miners that did not are charged a missed slot and fill the remaining
    /// orders in key order. LIB fields are carried forward untouched: this
    /// function never recomputes irreversibility, it only preserves the
    /// inputs the calculator needs next round.
    pub fn generate_next_round(&self, current_time: TimestampMs) -> ConsensusResult<Round> {
        let count = self.miner_count();
        if count == 0 {
            return Err(ConsensusError::EmptyMinerList);
        }

        let extra_block_producer_order = self.next_extra_block_producer_order();
        let next_start =
            current_time.max(self.extra_block_mining_time()) + self.mining_interval_ms;

        // Miners that mined claim their final orders first, ascending,
        // ties and out-of-range claims resolved deterministically.
        let mut mined: Vec<&MinerInRound> = self.miners.values().filter(|m| m.has_mined()).collect();
        mined.sort_by(|a, b| {
            a.final_order_of_next_round
                .cmp(&b.final_order_of_next_round)
                .then(a.public_key.cmp(&b.public_key))
        });

        let mut taken: Vec<u32> = Vec::with_capacity(count);
        let mut assigned: Vec<(MinerPublicKey, u32, bool)> = Vec::with_capacity(count);
        let mut deferred: Vec<(MinerPublicKey, bool)> = Vec::new();

        for miner in &mined {
            let claimed = miner.final_order_of_next_round;
            if claimed >= 1 && claimed <= count as u32 && !taken.contains(&claimed) {
                taken.push(claimed);
                assigned.push((miner.public_key, claimed, true));
            } else {
                deferred.push((miner.public_key, true));
            }
        }
        for (key, miner) in &self.miners {
            if !miner.has_mined() {
                deferred.push((*key, false));
            }
        }

        let mut free_orders = (1..=count as u32).filter(|o| !taken.contains(o));
        for (key, has_mined) in deferred {
            let order = free_orders
                .next()
                .ok_or_else(|| ConsensusError::InvalidRoundData("order slots exhausted".into()))?;
            assigned.push((key, order, has_mined));
        }

        let mut miners = BTreeMap::new();
        for (key, order, has_mined) in assigned {
            let current = &self.miners[&key];
            let expected = next_start + self.mining_interval_ms * (order as u64 - 1);
            let mut slot = MinerInRound::new(key, order, expected);
            slot.is_extra_block_producer = order == extra_block_producer_order;
            slot.missed_time_slots = current.missed_time_slots + u64::from(!has_mined);
            miners.insert(key, slot);
        }

        let mut next = Round {
            round_number: self.round_number + 1,
            term_number: self.term_number,
            mining_interval_ms: self.mining_interval_ms,
            miners,
            extra_block_producer_of_previous_round: self
                .extra_block_producer()
                .map(|m| m.public_key),
            confirmed_irreversible_block_height: 0,
            confirmed_irreversible_block_round_number: 0,
        };
        Round::carry_forward_lib_information(&mut next, self);
        Ok(next)
    }

    /// Copy LIB bookkeeping from `current` into `next`: the confirmed
    /// height/round pair, and every shared miner's implied height.
    ///
    /// Transitions that produce no new attestation (NextRound, NextTerm)
    /// must not reset these inputs to zero, or LIB stalls for a full cycle.
    pub fn carry_forward_lib_information(next: &mut Round, current: &Round) {
        next.confirmed_irreversible_block_height = current.confirmed_irreversible_block_height;
        next.confirmed_irreversible_block_round_number =
            current.confirmed_irreversible_block_round_number;
        for (key, slot) in next.miners.iter_mut() {
            if let Some(previous) = current.miners.get(key) {
                slot.implied_irreversible_block_height = previous.implied_irreversible_block_height;
            }
        }
    }
}
