//! Full-block (UpdateValue) payload checks
//!
//! The sender's slot must carry its commitment and signature, and every
//! revealed `previous_in_value` in the proposal (the sender's own and any
//! embedded for other miners) must match the commitment recorded in the
//! stored previous round. Accepting an unverified reveal for another miner
//! would corrupt that miner's future signatures and ordering.

use super::{check_revealed_values, HeaderValidationProvider, ValidationContext, ValidationResult};
use crate::domain::ConsensusBehaviour;

/// Validates the commit/reveal payload of a full block.
pub struct UpdateValueValidationProvider;

impl HeaderValidationProvider for UpdateValueValidationProvider {
    fn name(&self) -> &'static str {
        "update_value"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        if ctx.behaviour != ConsensusBehaviour::UpdateValue {
            return ValidationResult::ok();
        }

        let Some(slot) = ctx.provided_round.miners.get(ctx.sender) else {
            return ValidationResult::failed(format!(
                "sender {} is absent from the provided round",
                ctx.sender
            ));
        };
        if slot.out_value.is_none() {
            return ValidationResult::failed(format!(
                "miner {} published no out value",
                ctx.sender
            ));
        }
        if slot.signature.is_none() {
            return ValidationResult::failed(format!(
                "miner {} published no signature",
                ctx.sender
            ));
        }

        if let Err(message) = check_revealed_values(ctx.provided_round, ctx.previous_round) {
            return ValidationResult::failed(message);
        }
        ValidationResult::ok()
    }
}
