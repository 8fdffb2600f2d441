//! Round/term numbering and freshness on termination

use super::{HeaderValidationProvider, ValidationContext, ValidationResult};
use crate::domain::ConsensusBehaviour;

/// A terminating proposal must advance the right counter by exactly one
/// and start the new round with no commitments.
pub struct RoundTerminationValidationProvider;

impl HeaderValidationProvider for RoundTerminationValidationProvider {
    fn name(&self) -> &'static str {
        "round_termination"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        if !ctx.behaviour.is_terminating() {
            return ValidationResult::ok();
        }

        let provided = ctx.provided_round;
        let base = ctx.base_round;

        if provided.round_number != base.round_number + 1 {
            return ValidationResult::failed(format!(
                "expected round number {}, got {}",
                base.round_number + 1,
                provided.round_number
            ));
        }
        match ctx.behaviour {
            ConsensusBehaviour::NextTerm => {
                if provided.term_number != base.term_number + 1 {
                    return ValidationResult::failed(format!(
                        "expected term number {}, got {}",
                        base.term_number + 1,
                        provided.term_number
                    ));
                }
            }
            _ => {
                if provided.term_number != base.term_number {
                    return ValidationResult::failed(format!(
                        "round termination must not change the term number ({} -> {})",
                        base.term_number, provided.term_number
                    ));
                }
            }
        }

        // A fresh round starts with no revealed secrets.
        for (key, slot) in &provided.miners {
            if slot.in_value.is_some() {
                return ValidationResult::failed(format!(
                    "new round carries an in value for miner {key}"
                ));
            }
        }

        // Exactly one miner terminates the next round.
        let producers = provided
            .miners
            .values()
            .filter(|m| m.is_extra_block_producer)
            .count();
        if producers != 1 {
            return ValidationResult::failed(format!(
                "new round designates {producers} extra block producers"
            ));
        }
        ValidationResult::ok()
    }
}
