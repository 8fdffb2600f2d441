//! Consensus state: the round store and lifecycle counters

use crate::domain::{ConsensusError, ConsensusResult, Round};
use shared_crypto::MinerPublicKey;
use shared_types::TimestampMs;
use std::collections::BTreeMap;

/// Everything a node persists for consensus.
///
/// Rounds are keyed by round number, monotonic and never reused; historical
/// rounds are retained for audit and LIB computation, never deleted. All
/// mutation goes through the service as one atomic state swap.
#[derive(Clone, Debug)]
pub struct ConsensusState {
    /// Every round seen, keyed by round number.
    pub rounds: BTreeMap<u64, Round>,
    /// The round currently being mined.
    pub current_round_number: u64,
    /// The current term.
    pub current_term_number: u64,
    /// When the chain started; set once at initialization.
    pub blockchain_start_time: Option<TimestampMs>,
    /// Side chains: the replicated main-chain miner list.
    pub main_chain_miner_list: Vec<MinerPublicKey>,
}

impl ConsensusState {
    pub fn new() -> Self {
        Self {
            rounds: BTreeMap::new(),
            current_round_number: 0,
            current_term_number: 0,
            blockchain_start_time: None,
            main_chain_miner_list: Vec::new(),
        }
    }

    /// Whether the genesis round has been installed.
    pub fn is_initialized(&self) -> bool {
        self.current_round_number > 0
    }

    /// The currently stored round.
    pub fn current_round(&self) -> ConsensusResult<&Round> {
        if !self.is_initialized() {
            return Err(ConsensusError::NotInitialized);
        }
        self.rounds
            .get(&self.current_round_number)
            .ok_or(ConsensusError::RoundNotFound(self.current_round_number))
    }

    /// The round before the current one, if stored.
    pub fn previous_round(&self) -> Option<&Round> {
        self.current_round_number
            .checked_sub(1)
            .and_then(|n| self.rounds.get(&n))
    }

    /// A round by number.
    pub fn round(&self, round_number: u64) -> ConsensusResult<&Round> {
        self.rounds
            .get(&round_number)
            .ok_or(ConsensusError::RoundNotFound(round_number))
    }
}

impl Default for ConsensusState {
    fn default() -> Self {
        Self::new()
    }
}
