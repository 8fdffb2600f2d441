//! Sender must be a current miner

use super::{HeaderValidationProvider, ValidationContext, ValidationResult};

/// Rejects proposals from keys outside the stored round's miner list.
pub struct MiningPermissionValidationProvider;

impl HeaderValidationProvider for MiningPermissionValidationProvider {
    fn name(&self) -> &'static str {
        "mining_permission"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        if ctx.base_round.miners.contains_key(ctx.sender) {
            ValidationResult::ok()
        } else {
            ValidationResult::failed(format!(
                "sender {} has no mining permission in round {}",
                ctx.sender, ctx.base_round.round_number
            ))
        }
    }
}
