//! # tc-consensus
//!
//! Delegated-proof-of-stake consensus core for Tempo-Chain.
//!
//! ## Architecture
//!
//! Time is sliced into rounds (one slot per miner plus an extra-block slot)
//! and terms (epochs bounded by re-election). Per-round randomness comes
//! from a commit-reveal scheme hardened with Shamir threshold sharing, and
//! finality from a Last-Irreversible-Block height that 2/3 + 1 of the
//! miners attest to.
//!
//! ```text
//! [Block Production] ──GetConsensusCommand──→ [Scheduler]
//!        │                                        │
//!        │←──────── behaviour + slot times ───────┘
//!        │
//!        ├──GenerateExtraData──→ [RoundModel + SecretSharing]
//!        │
//!        └──block w/ header───→ [ValidationPipeline] ──→ [StateManager]
//!                                     (every node)          │
//!                                                           ├─ rounds store
//!                                                           └─ LIB calculator
//! ```
//!
//! ## Safety Model
//!
//! - Every proposed transition runs the full validation pipeline before it
//!   may touch state; the apply step is one atomic state swap.
//! - All consensus-affecting iteration is canonically ordered (`BTreeMap`
//!   by validated public key, or the explicit `order` field).
//! - Commitments are re-checked on every ingestion path: the proposer's
//!   own reveal, reveals embedded for other miners, and values rebuilt
//!   from Shamir shares.
//! - The same 2/3 threshold gates share collection and reconstruction; a
//!   single withholding miner can never block revelation.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tc_consensus::{ConsensusService, ConsensusConfig};
//! use tc_consensus::ports::ConsensusApi;
//!
//! let service = ConsensusService::new(election, event_sink, ConsensusConfig::default());
//! service.initialize_consensus(miner_keys, start_time).await?;
//!
//! let command = service.get_consensus_command(&my_key).await?;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod state;
pub mod validation;

// Re-export main types
pub use adapters::{InMemoryElectionGateway, InMemoryEventSink, ManualTimeSource};
pub use config::{ChainRole, ConsensusConfig};
pub use domain::{
    BehaviourScheduler, ConsensusBehaviour, ConsensusCommand, ConsensusError,
    ConsensusHeaderInformation, ConsensusResult, LibCalculator, MinerInRound, Round,
    TriggerInformation,
};
pub use events::{IrreversibleBlockFoundEvent, MiningInformationUpdatedEvent};
pub use ports::{ConsensusApi, ElectionGateway, EventSink, SystemTimeSource, TimeSource};
pub use service::ConsensusService;
pub use state::ConsensusState;
pub use validation::{ValidationPipeline, ValidationResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ConsensusConfig::default();
        assert_eq!(config.mining_interval_ms, 4_000);
        assert_eq!(config.chain_role, ChainRole::MainChain);
    }
}
