//! Miner-set invariance across NextRound
//!
//! Within a term the miner set is fixed: a NextRound proposal must carry
//! exactly the stored round's keys, no additions, no removals. Reordering
//! is fine. NextTerm is exempt here: its replacement set is cross-checked
//! against the election result by the state manager before anything is
//! stored.

use super::{HeaderValidationProvider, ValidationContext, ValidationResult};
use crate::domain::ConsensusBehaviour;

/// Rejects miner injection or removal inside a term.
pub struct MinerListValidationProvider;

impl HeaderValidationProvider for MinerListValidationProvider {
    fn name(&self) -> &'static str {
        "miner_list"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        if ctx.behaviour != ConsensusBehaviour::NextRound {
            return ValidationResult::ok();
        }

        // Both maps iterate in canonical key order, so set equality is a
        // single ordered comparison.
        if ctx
            .provided_round
            .miners
            .keys()
            .eq(ctx.base_round.miners.keys())
        {
            ValidationResult::ok()
        } else {
            ValidationResult::failed(format!(
                "next round miner list differs from round {} miner list",
                ctx.base_round.round_number
            ))
        }
    }
}
