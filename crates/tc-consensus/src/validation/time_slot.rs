//! Round-id/behaviour coupling and slot timing
//!
//! A changed round id is only legitimate for terminating behaviours, and a
//! terminating behaviour must change it. In-round proposals are then held
//! to their slot: the actual mining time must fall inside the sender's
//! window, judged by the same slot-end comparison the scheduler uses.

use super::{HeaderValidationProvider, ValidationContext, ValidationResult};

/// Validates the round-id coupling and the sender's slot timing.
pub struct TimeSlotValidationProvider;

impl HeaderValidationProvider for TimeSlotValidationProvider {
    fn name(&self) -> &'static str {
        "time_slot"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        let ids_equal = ctx.provided_round.round_id() == ctx.base_round.round_id();

        if ctx.behaviour.is_terminating() {
            if ids_equal {
                return ValidationResult::failed(
                    "terminating behaviour must produce a new round id",
                );
            }
            // Spacing is checked against the stored interval; a proposal
            // cannot redefine the interval to make its own layout pass.
            if ctx.provided_round.mining_interval_ms != ctx.base_round.mining_interval_ms {
                return ValidationResult::failed(format!(
                    "mining interval changed from {}ms to {}ms",
                    ctx.base_round.mining_interval_ms, ctx.provided_round.mining_interval_ms
                ));
            }
            return match ctx
                .provided_round
                .check_time_slots(ctx.config.time_slot_tolerance_ms)
            {
                Ok(()) => ValidationResult::ok(),
                Err(e) => ValidationResult::failed(e.to_string()),
            };
        }

        if !ids_equal {
            return ValidationResult::failed(
                "round id changed without a terminating behaviour",
            );
        }

        let Some(base_slot) = ctx.base_round.miners.get(ctx.sender) else {
            return ValidationResult::failed(format!(
                "sender {} is absent from the stored round",
                ctx.sender
            ));
        };
        let Some(provided_slot) = ctx.provided_round.miners.get(ctx.sender) else {
            return ValidationResult::failed(format!(
                "sender {} is absent from the provided round",
                ctx.sender
            ));
        };
        let Some(actual) = provided_slot.latest_actual_mining_time() else {
            return ValidationResult::failed(format!(
                "miner {} supplied no actual mining time",
                ctx.sender
            ));
        };

        if actual < base_slot.expected_mining_time {
            return ValidationResult::failed(format!(
                "miner {} mined at {actual}, before its slot at {}",
                ctx.sender, base_slot.expected_mining_time
            ));
        }
        match ctx.base_round.is_time_slot_passed(ctx.sender, actual) {
            Ok(false) => ValidationResult::ok(),
            // Recoverable: the slot expired before the block executed; a
            // fresh consensus command resolves it.
            Ok(true) => ValidationResult::retrigger(format!(
                "time slot of miner {} had already passed at {actual}",
                ctx.sender
            )),
            Err(e) => ValidationResult::failed(e.to_string()),
        }
    }
}
