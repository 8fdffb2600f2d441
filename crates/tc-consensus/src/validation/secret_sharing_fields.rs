//! Commitment checks on side-channel reveal paths
//!
//! Revealed values can arrive outside an UpdateValue payload, embedded in
//! tiny-block data or a terminating proposal. Fields written through those
//! side channels get the exact same commitment check as the primary path;
//! originating from "trigger information" exempts nothing.

use super::{check_revealed_values, HeaderValidationProvider, ValidationContext, ValidationResult};
use crate::domain::ConsensusBehaviour;

/// Applies the commitment check to reveals on non-UpdateValue paths.
pub struct SecretSharingFieldsValidationProvider;

impl HeaderValidationProvider for SecretSharingFieldsValidationProvider {
    fn name(&self) -> &'static str {
        "secret_sharing_fields"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        // UpdateValue reveals are checked by the update_value provider.
        if ctx.behaviour == ConsensusBehaviour::UpdateValue {
            return ValidationResult::ok();
        }

        // A terminating proposal's reveals refer to the round being closed
        // (the stored base round); in-round proposals refer to the round
        // before it.
        let reference = if ctx.behaviour.is_terminating() {
            Some(ctx.base_round)
        } else {
            ctx.previous_round
        };

        match check_revealed_values(ctx.provided_round, reference) {
            Ok(()) => ValidationResult::ok(),
            Err(message) => ValidationResult::failed(message),
        }
    }
}
