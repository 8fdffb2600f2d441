//! Last-Irreversible-Block height derivation
//!
//! Miners attest an implied irreversible height when they mine a full
//! block; once 2/3 + 1 of the round agrees, the 2/3-quantile of their
//! attestations becomes the new LIB candidate. Low participation simply
//! yields no candidate; that is a normal outcome, not an error.

use crate::domain::round::Round;
use shared_types::BlockHeight;

/// Stateless LIB computation over round data.
pub struct LibCalculator;

impl LibCalculator {
    /// Candidate LIB height from the current round's attestations.
    ///
    /// Collects `implied_irreversible_block_height` from miners that
    /// actually mined, filtered to positive values. Returns `None` when
    /// fewer than `miners_count_of_consent` attestations exist.
    pub fn candidate_height(round: &Round) -> Option<BlockHeight> {
        let mut heights: Vec<BlockHeight> = round
            .miners_in_order()
            .into_iter()
            .filter(|m| m.has_mined())
            .map(|m| m.implied_irreversible_block_height)
            .filter(|&h| h > 0)
            .collect();

        let consent = round.miners_count_of_consent();
        if heights.len() < consent {
            return None;
        }

        // Descending: the consent-th largest height is attested as
        // irreversible by at least `consent` miners.
        heights.sort_unstable_by(|a, b| b.cmp(a));
        Some(heights[consent - 1])
    }

    /// Apply a candidate to the round if it strictly advances the stored
    /// height. Returns whether anything changed.
    pub fn advance(round: &mut Round, candidate: BlockHeight) -> bool {
        if candidate <= round.confirmed_irreversible_block_height {
            return false;
        }
        round.confirmed_irreversible_block_height = candidate;
        round.confirmed_irreversible_block_round_number = round.round_number;
        true
    }
}
