//! Driving ports (inbound API)

use crate::domain::{ConsensusCommand, ConsensusResult, Round, TriggerInformation};
use crate::validation::ValidationResult;
use async_trait::async_trait;
use shared_crypto::MinerPublicKey;
use shared_types::{BlockHeight, TimestampMs};

/// Primary consensus API.
///
/// Raw public keys arriving through any of these methods are validated
/// before a single byte of them is used for lookup, ordering, or address
/// derivation.
#[async_trait]
pub trait ConsensusApi: Send + Sync {
    /// Install the genesis round for a fresh chain.
    async fn initialize_consensus(
        &self,
        miner_key_bytes: Vec<Vec<u8>>,
        start_time: TimestampMs,
    ) -> ConsensusResult<()>;

    /// What should this miner do next, and when?
    async fn get_consensus_command(&self, pubkey_bytes: &[u8]) -> ConsensusResult<ConsensusCommand>;

    /// Build the serialized consensus header information for this miner's
    /// next block, from its local trigger data.
    async fn generate_consensus_extra_data(
        &self,
        trigger: &TriggerInformation,
    ) -> ConsensusResult<Vec<u8>>;

    /// Run the validation pipeline against a proposed transition without
    /// touching state. Malformed bytes come back as a failed result, not
    /// an error.
    async fn validate_before_execution(&self, header_bytes: &[u8]) -> ConsensusResult<ValidationResult>;

    /// Validate and apply a proposed transition atomically.
    async fn process_consensus_information(&self, header_bytes: &[u8]) -> ConsensusResult<()>;

    /// The currently stored round.
    async fn get_current_round(&self) -> ConsensusResult<Round>;

    /// A stored round by number.
    async fn get_round(&self, round_number: u64) -> ConsensusResult<Round>;

    /// The current confirmed irreversible height (0 before any).
    async fn get_current_lib_height(&self) -> BlockHeight;

    /// Side chains: accept a pushed main-chain miner list. Every key is
    /// re-validated on ingestion.
    async fn update_main_chain_miner_list(&self, miner_key_bytes: Vec<Vec<u8>>) -> ConsensusResult<()>;

    /// Side chains: the replicated main-chain miner list.
    async fn get_main_chain_current_miner_list(&self) -> Vec<MinerPublicKey>;
}
