//! Round-transition validation pipeline
//!
//! An ordered set of independent checks run against every proposed round
//! transition before it is allowed to touch state. Each provider enforces
//! one invariant and reports success or failure with a message; the
//! pipeline short-circuits on the first failure. Failures reject the
//! proposing block on this node; they are never fatal.

pub mod continuous_blocks;
pub mod lib_information;
pub mod miner_list;
pub mod mining_permission;
pub mod round_termination;
pub mod secret_sharing_fields;
pub mod time_slot;
pub mod update_value;

pub use continuous_blocks::ContinuousBlocksValidationProvider;
pub use lib_information::LibInformationValidationProvider;
pub use miner_list::MinerListValidationProvider;
pub use mining_permission::MiningPermissionValidationProvider;
pub use round_termination::RoundTerminationValidationProvider;
pub use secret_sharing_fields::SecretSharingFieldsValidationProvider;
pub use time_slot::TimeSlotValidationProvider;
pub use update_value::UpdateValueValidationProvider;

use crate::config::ConsensusConfig;
use crate::domain::{commitment_matches, ConsensusBehaviour, Round};
use shared_crypto::MinerPublicKey;

/// Everything a validator may look at. The stored rounds are ground truth;
/// the provided round is the untrusted proposal.
pub struct ValidationContext<'a> {
    /// The currently stored round.
    pub base_round: &'a Round,
    /// The stored round before that, if any.
    pub previous_round: Option<&'a Round>,
    /// The proposed round from the incoming block header.
    pub provided_round: &'a Round,
    /// Declared transition behaviour.
    pub behaviour: ConsensusBehaviour,
    /// Proposer identity.
    pub sender: &'a MinerPublicKey,
    /// Consensus configuration.
    pub config: &'a ConsensusConfig,
}

/// Outcome of one provider or of the whole pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    /// Whether the proposal passed.
    pub success: bool,
    /// Failure description, empty on success.
    pub message: String,
    /// Recoverable rejection: the proposer should request a fresh command
    /// and retry, rather than treat the proposal as permanently bad.
    pub is_retrigger: bool,
}

impl ValidationResult {
    /// Passed.
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
            is_retrigger: false,
        }
    }

    /// Permanently rejected.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            is_retrigger: false,
        }
    }

    /// Rejected, but recoverable with a fresh command.
    pub fn retrigger(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            is_retrigger: true,
        }
    }
}

/// One invariant check.
pub trait HeaderValidationProvider: Send + Sync {
    /// Short name for logs and metrics labels.
    fn name(&self) -> &'static str;

    /// Run the check.
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult;
}

/// The ordered pipeline.
pub struct ValidationPipeline {
    providers: Vec<Box<dyn HeaderValidationProvider>>,
}

impl ValidationPipeline {
    /// The standard provider set, in evaluation order.
    pub fn standard() -> Self {
        Self {
            providers: vec![
                Box::new(MiningPermissionValidationProvider),
                Box::new(ContinuousBlocksValidationProvider),
                Box::new(TimeSlotValidationProvider),
                Box::new(UpdateValueValidationProvider),
                Box::new(RoundTerminationValidationProvider),
                Box::new(MinerListValidationProvider),
                Box::new(LibInformationValidationProvider),
                Box::new(SecretSharingFieldsValidationProvider),
            ],
        }
    }

    /// Run every provider in order, stopping at the first failure.
    pub fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationResult {
        for provider in &self.providers {
            let result = provider.validate(ctx);
            if !result.success {
                tracing::warn!(
                    provider = provider.name(),
                    behaviour = %ctx.behaviour,
                    sender = %ctx.sender,
                    message = %result.message,
                    "round transition rejected"
                );
                crate::metrics::record_proposal_rejected(provider.name());
                return result;
            }
        }
        ValidationResult::ok()
    }
}

/// Check every revealed `previous_in_value` in `provided` against the
/// commitments recorded in `reference`.
///
/// Applied to the proposer's own reveal and to reveals embedded for other
/// miners alike; a value for a miner that never committed in the reference
/// round cannot be checked and is left for the reveal path to ignore.
pub(crate) fn check_revealed_values(
    provided: &Round,
    reference: Option<&Round>,
) -> Result<(), String> {
    let Some(reference) = reference else {
        return Ok(());
    };
    for (key, slot) in &provided.miners {
        let Some(revealed) = &slot.previous_in_value else {
            continue;
        };
        let Some(reference_slot) = reference.miners.get(key) else {
            continue;
        };
        let Some(committed) = &reference_slot.out_value else {
            continue;
        };
        if !commitment_matches(revealed, committed) {
            return Err(format!(
                "previous in value of miner {key} does not match its commitment"
            ));
        }
    }
    Ok(())
}
