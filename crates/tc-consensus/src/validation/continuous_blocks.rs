//! Per-slot tiny-block cap

use super::{HeaderValidationProvider, ValidationContext, ValidationResult};
use crate::domain::ConsensusBehaviour;

/// A miner may not exceed the configured number of continuous blocks
/// inside one slot.
pub struct ContinuousBlocksValidationProvider;

impl HeaderValidationProvider for ContinuousBlocksValidationProvider {
    fn name(&self) -> &'static str {
        "continuous_blocks"
    }

    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        if !matches!(
            ctx.behaviour,
            ConsensusBehaviour::UpdateValue | ConsensusBehaviour::TinyBlock
        ) {
            return ValidationResult::ok();
        }

        let Some(slot) = ctx.provided_round.miners.get(ctx.sender) else {
            return ValidationResult::failed(format!(
                "sender {} is absent from the provided round",
                ctx.sender
            ));
        };
        if slot.produced_tiny_blocks > ctx.config.tiny_block_limit {
            return ValidationResult::failed(format!(
                "miner {} produced {} continuous blocks, cap is {}",
                ctx.sender, slot.produced_tiny_blocks, ctx.config.tiny_block_limit
            ));
        }
        ValidationResult::ok()
    }
}
