//! Configuration types for the consensus core

use serde::Deserialize;

/// Which chain this node participates in.
///
/// Side chains replicate the main chain's miner list and never run their own
/// elections, so their schedulers never emit a term-terminating behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum ChainRole {
    /// Main chain: full round + term lifecycle with elections.
    #[default]
    MainChain,
    /// Side chain: rounds only; terms never change.
    SideChain,
}

/// Runtime configuration for the consensus core
#[derive(Clone, Debug, Deserialize)]
pub struct ConsensusConfig {
    /// Chain role
    pub chain_role: ChainRole,

    /// Width of one mining time slot in milliseconds
    pub mining_interval_ms: u64,

    /// Term length in seconds (main chain only)
    pub period_seconds: u64,

    /// Maximum tiny blocks a miner may produce inside one slot
    pub tiny_block_limit: u32,

    /// Allowed deviation when checking expected-mining-time spacing.
    /// Round generation always produces exact spacing, so 0 is safe.
    pub time_slot_tolerance_ms: u64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            chain_role: ChainRole::MainChain,
            mining_interval_ms: 4_000,
            period_seconds: 604_800, // 7 days
            tiny_block_limit: 8,
            time_slot_tolerance_ms: 0,
        }
    }
}
