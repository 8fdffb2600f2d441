//! Shared fixture: a consensus service wired to in-memory adapters with a
//! hand-driven clock.

use k256::elliptic_curve::sec1::ToEncodedPoint;
use shared_crypto::{sha256, MinerPublicKey};
use shared_types::Hash;
use std::collections::BTreeMap;
use std::sync::Arc;
use tc_consensus::{
    ConsensusApi, ConsensusBehaviour, ConsensusConfig, ConsensusService, InMemoryElectionGateway,
    InMemoryEventSink, ManualTimeSource, Round, TriggerInformation,
};

pub const INTERVAL: u64 = 4_000;
pub const START: u64 = 1_000;

/// Deterministic valid secp256k1 key.
pub fn test_key(seed: u8) -> MinerPublicKey {
    let mut scalar = [0u8; 32];
    scalar[31] = seed;
    let secret = k256::SecretKey::from_slice(&scalar).expect("nonzero scalar");
    MinerPublicKey::from_bytes(secret.public_key().to_encoded_point(true).as_bytes())
        .expect("generated key is valid")
}

/// A single-node consensus network under test.
pub struct TestNet {
    pub service: ConsensusService<InMemoryElectionGateway, InMemoryEventSink>,
    pub election: Arc<InMemoryElectionGateway>,
    pub sink: Arc<InMemoryEventSink>,
    pub clock: Arc<ManualTimeSource>,
    pub keys: Vec<MinerPublicKey>,
}

impl TestNet {
    pub async fn start(miner_count: u8) -> Self {
        Self::start_with_config(
            miner_count,
            ConsensusConfig {
                mining_interval_ms: INTERVAL,
                ..ConsensusConfig::default()
            },
        )
        .await
    }

    pub async fn start_with_config(miner_count: u8, config: ConsensusConfig) -> Self {
        let election = Arc::new(InMemoryElectionGateway::new());
        let sink = Arc::new(InMemoryEventSink::new());
        let clock = Arc::new(ManualTimeSource::new(START));
        let service = ConsensusService::new(election.clone(), sink.clone(), config)
            .with_time_source(clock.clone());

        let keys: Vec<MinerPublicKey> = (1..=miner_count).map(test_key).collect();
        let raw: Vec<Vec<u8>> = keys.iter().map(|k| k.to_vec()).collect();
        service
            .initialize_consensus(raw, START)
            .await
            .expect("initialization succeeds");
        Self {
            service,
            election,
            sink,
            clock,
            keys,
        }
    }

    pub async fn current_round(&self) -> Round {
        self.service.get_current_round().await.expect("round stored")
    }

    /// Miner keys of the current round, in slot order.
    pub async fn keys_in_order(&self) -> Vec<MinerPublicKey> {
        self.current_round()
            .await
            .miners_in_order()
            .iter()
            .map(|m| m.public_key)
            .collect()
    }

    /// Drive the clock into the miner's slot and mine its full block.
    pub async fn mine_update_value(
        &self,
        key: &MinerPublicKey,
        in_value: Hash,
        previous_in_value: Option<Hash>,
        implied_height: u64,
        decrypted_pieces: BTreeMap<Vec<u8>, Vec<u8>>,
    ) {
        let round = self.current_round().await;
        let slot = &round.miners[key];
        self.clock.set(slot.expected_mining_time + 10);

        let trigger = TriggerInformation {
            public_key_bytes: key.to_vec(),
            in_value: Some(in_value),
            previous_in_value,
            decrypted_pieces,
            current_block_height: implied_height,
        };
        let bytes = self
            .service
            .generate_consensus_extra_data(&trigger)
            .await
            .expect("extra data for update value");
        let validation = self
            .service
            .validate_before_execution(&bytes)
            .await
            .expect("validation runs");
        assert!(validation.success, "update value rejected: {}", validation.message);
        self.service
            .process_consensus_information(&bytes)
            .await
            .expect("update value applies");
    }

    /// Deterministic per-miner secret for a round.
    pub fn secret_for(key: &MinerPublicKey, round_number: u64) -> Hash {
        sha256(&[key.as_bytes().as_slice(), &round_number.to_le_bytes()].concat())
    }

    /// Let the extra block producer terminate the current round (or term).
    pub async fn terminate_round(&self) -> ConsensusBehaviour {
        let round = self.current_round().await;
        let producer = round
            .extra_block_producer()
            .expect("round has a terminator")
            .public_key;
        self.clock.set(round.extra_block_mining_time());

        let trigger = TriggerInformation::from_public_key(&producer);
        let bytes = self
            .service
            .generate_consensus_extra_data(&trigger)
            .await
            .expect("extra data for termination");
        let header = tc_consensus::ConsensusHeaderInformation::from_bytes(&bytes)
            .expect("own extra data parses");
        self.service
            .process_consensus_information(&bytes)
            .await
            .expect("termination applies");
        header.behaviour
    }
}
