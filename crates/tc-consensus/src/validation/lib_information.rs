//! LIB monotonicity
//!
//! The confirmed irreversible height and its confirming round number may
//! never move backward. Applied uniformly to every behaviour; a term
//! transition gets no exemption, or a malicious producer could reset LIB
//! through NextTerm.

use super::{HeaderValidationProvider, ValidationContext, ValidationResult};

/// Rejects any proposal that lowers the confirmed LIB bookkeeping.
pub struct LibInformationValidationProvider;

impl HeaderValidationProvider for LibInformationValidationProvider {
    fn name(&self) -> &'static str {
        "lib_information"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        let provided = ctx.provided_round;
        let base = ctx.base_round;

        if provided.confirmed_irreversible_block_height < base.confirmed_irreversible_block_height
        {
            return ValidationResult::failed(format!(
                "confirmed irreversible height regressed: {} < {}",
                provided.confirmed_irreversible_block_height,
                base.confirmed_irreversible_block_height
            ));
        }
        if provided.confirmed_irreversible_block_round_number
            < base.confirmed_irreversible_block_round_number
        {
            return ValidationResult::failed(format!(
                "confirmed irreversible round regressed: {} < {}",
                provided.confirmed_irreversible_block_round_number,
                base.confirmed_irreversible_block_round_number
            ));
        }
        ValidationResult::ok()
    }
}
