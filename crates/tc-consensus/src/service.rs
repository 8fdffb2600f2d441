//! Consensus Service - state manager and orchestrator
//!
//! The single writer over consensus state. Every accepted round transition
//! is validated first, then applied to a staged copy of the state and
//! committed in one swap, so a failed apply leaves nothing behind. Collaborator
//! calls (election results, miner-count pushes) happen before the commit, so
//! their failure aborts the whole transition.

use crate::config::ConsensusConfig;
use crate::domain::{
    commitment_matches, BehaviourScheduler, ConsensusBehaviour, ConsensusCommand, ConsensusError,
    ConsensusHeaderInformation, ConsensusResult, LibCalculator, Round, TriggerInformation,
};
use crate::events::{IrreversibleBlockFoundEvent, MiningInformationUpdatedEvent};
use crate::ports::inbound::ConsensusApi;
use crate::ports::outbound::{ElectionGateway, EventSink, SystemTimeSource, TimeSource};
use crate::state::ConsensusState;
use crate::validation::{ValidationContext, ValidationPipeline, ValidationResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::{encode_secret, secret_sharing_threshold, sha256, MinerPublicKey};
use shared_types::{BlockHeight, Hash, TimestampMs};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Consensus Service
///
/// Generic over its outbound ports, like every other service in this
/// workspace; tests wire the in-memory adapters.
pub struct ConsensusService<E, K>
where
    E: ElectionGateway,
    K: EventSink,
{
    election: Arc<E>,
    event_sink: Arc<K>,
    state: RwLock<ConsensusState>,
    config: ConsensusConfig,
    time_source: Arc<dyn TimeSource>,
    pipeline: ValidationPipeline,
}

/// What an applied UpdateValue changed beyond the round data itself.
struct UpdateValueOutcome {
    lib_advanced: Option<(u64, BlockHeight)>,
    secrets_revealed: u64,
}

impl<E, K> ConsensusService<E, K>
where
    E: ElectionGateway,
    K: EventSink,
{
    /// Create a new ConsensusService
    pub fn new(election: Arc<E>, event_sink: Arc<K>, config: ConsensusConfig) -> Self {
        Self {
            election,
            event_sink,
            state: RwLock::new(ConsensusState::new()),
            config,
            time_source: Arc::new(SystemTimeSource),
            pipeline: ValidationPipeline::standard(),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Arc<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Run the pipeline against a parsed header using stored state as
    /// ground truth.
    fn validate_header(&self, header: &ConsensusHeaderInformation) -> ConsensusResult<ValidationResult> {
        if header.behaviour == ConsensusBehaviour::Nothing {
            return Ok(ValidationResult::failed(
                "a Nothing behaviour carries no transition to validate",
            ));
        }
        let state = self.state.read();
        let base_round = state.current_round()?;
        let ctx = ValidationContext {
            base_round,
            previous_round: state.previous_round(),
            provided_round: &header.round,
            behaviour: header.behaviour,
            sender: &header.sender_public_key,
            config: &self.config,
        };
        Ok(self.pipeline.validate(&ctx))
    }

    /// Build the first round of the next term from the election result.
    async fn build_next_term_round(&self, current: &Round, now: TimestampMs) -> ConsensusResult<Round> {
        let current_keys: Vec<MinerPublicKey> = current.miners.keys().copied().collect();
        let raw_winners = self
            .election
            .get_victories(&current_keys)
            .await
            .map_err(ConsensusError::ElectionGatewayError)?;
        let mut winners = Vec::with_capacity(raw_winners.len());
        for bytes in &raw_winners {
            winners.push(MinerPublicKey::from_bytes(bytes)?);
        }

        let start = now.max(current.extra_block_mining_time()) + self.config.mining_interval_ms;
        let mut next = Round::generate_first_round_of_new_term(
            &winners,
            self.config.mining_interval_ms,
            start,
            current.round_number + 1,
            current.term_number + 1,
        )?;
        next.extra_block_producer_of_previous_round =
            current.extra_block_producer().map(|m| m.public_key);
        Round::carry_forward_lib_information(&mut next, current);
        Ok(next)
    }

    /// Cross-check a proposed next-term miner set against the election
    /// collaborator. The proposal's own list is never trusted.
    async fn verify_next_term_miner_list(
        &self,
        staging: &ConsensusState,
        header: &ConsensusHeaderInformation,
    ) -> ConsensusResult<()> {
        let base_round = staging.current_round()?;
        let current_keys: Vec<MinerPublicKey> = base_round.miners.keys().copied().collect();
        let raw_winners = self
            .election
            .get_victories(&current_keys)
            .await
            .map_err(ConsensusError::ElectionGatewayError)?;

        let mut expected = BTreeSet::new();
        for bytes in &raw_winners {
            expected.insert(MinerPublicKey::from_bytes(bytes)?);
        }
        let provided: BTreeSet<MinerPublicKey> = header.round.miners.keys().copied().collect();
        if expected != provided {
            return Err(ConsensusError::NextTermMinerListMismatch);
        }
        Ok(())
    }
}

#[async_trait]
impl<E, K> ConsensusApi for ConsensusService<E, K>
where
    E: ElectionGateway,
    K: EventSink,
{
    async fn initialize_consensus(
        &self,
        miner_key_bytes: Vec<Vec<u8>>,
        start_time: TimestampMs,
    ) -> ConsensusResult<()> {
        let mut keys = Vec::with_capacity(miner_key_bytes.len());
        for bytes in &miner_key_bytes {
            keys.push(MinerPublicKey::from_bytes(bytes)?);
        }
        if self.state.read().is_initialized() {
            return Err(ConsensusError::InvalidRoundData(
                "consensus is already initialized".into(),
            ));
        }
        let round =
            Round::generate_first_round_of_new_term(&keys, self.config.mining_interval_ms, start_time, 1, 1)?;

        self.election
            .update_miners_count(round.miner_count())
            .await
            .map_err(ConsensusError::ElectionGatewayError)?;

        let mut staging = ConsensusState::new();
        staging.blockchain_start_time = Some(start_time);
        staging.current_round_number = 1;
        staging.current_term_number = 1;
        staging.rounds.insert(1, round);
        *self.state.write() = staging;

        tracing::info!(miners = keys.len(), start_time, "consensus initialized");
        Ok(())
    }

    async fn get_consensus_command(&self, pubkey_bytes: &[u8]) -> ConsensusResult<ConsensusCommand> {
        let key = MinerPublicKey::from_bytes(pubkey_bytes)?;
        let now = self.time_source.now_ms();

        let state = self.state.read();
        let round = state.current_round()?;
        let start = state.blockchain_start_time.unwrap_or(0);
        let behaviour = BehaviourScheduler::decide(round, &key, now, start, &self.config);

        let command = match round.miners.get(&key) {
            None => ConsensusCommand::nothing(round, now),
            Some(miner) => ConsensusCommand::for_behaviour(behaviour, round, miner, now, &self.config),
        };
        tracing::debug!(miner = %key, behaviour = %command.behaviour, "consensus command issued");
        Ok(command)
    }

    async fn generate_consensus_extra_data(
        &self,
        trigger: &TriggerInformation,
    ) -> ConsensusResult<Vec<u8>> {
        let key = MinerPublicKey::from_bytes(&trigger.public_key_bytes)?;
        let now = self.time_source.now_ms();

        let (current, previous, start) = {
            let state = self.state.read();
            (
                state.current_round()?.clone(),
                state.previous_round().cloned(),
                state.blockchain_start_time.unwrap_or(0),
            )
        };
        let behaviour = BehaviourScheduler::decide(&current, &key, now, start, &self.config);

        let round = match behaviour {
            ConsensusBehaviour::Nothing => return Err(ConsensusError::NothingScheduled),
            ConsensusBehaviour::UpdateValue => {
                build_update_value_round(&current, previous.as_ref(), &key, trigger, now)?
            }
            ConsensusBehaviour::TinyBlock => build_tiny_block_round(&current, &key, now)?,
            ConsensusBehaviour::NextRound => current.generate_next_round(now)?,
            ConsensusBehaviour::NextTerm => self.build_next_term_round(&current, now).await?,
        };

        ConsensusHeaderInformation {
            sender_public_key: key,
            round,
            behaviour,
        }
        .to_bytes()
    }

    async fn validate_before_execution(&self, header_bytes: &[u8]) -> ConsensusResult<ValidationResult> {
        let header = match ConsensusHeaderInformation::from_bytes(header_bytes) {
            Ok(header) => header,
            // Malformed external data rejects the block; it must never
            // unwind node processing.
            Err(e) => return Ok(ValidationResult::failed(e.to_string())),
        };
        self.validate_header(&header)
    }

    async fn process_consensus_information(&self, header_bytes: &[u8]) -> ConsensusResult<()> {
        let header = ConsensusHeaderInformation::from_bytes(header_bytes)?;
        let validation = self.validate_header(&header)?;
        if !validation.success {
            return Err(ConsensusError::ValidationFailed {
                message: validation.message,
            });
        }

        let mut staging = self.state.read().clone();
        let now = self.time_source.now_ms();
        let mut lib_event = None;

        match header.behaviour {
            ConsensusBehaviour::UpdateValue => {
                let outcome = apply_update_value(&mut staging, &header)?;
                if outcome.secrets_revealed > 0 {
                    crate::metrics::record_secret_reveals(outcome.secrets_revealed);
                }
                if let Some((round_number, height)) = outcome.lib_advanced {
                    lib_event = Some(IrreversibleBlockFoundEvent {
                        round_number,
                        height,
                    });
                }
            }
            ConsensusBehaviour::TinyBlock => apply_tiny_block(&mut staging, &header)?,
            ConsensusBehaviour::NextRound => apply_round_termination(&mut staging, &header),
            ConsensusBehaviour::NextTerm => {
                self.verify_next_term_miner_list(&staging, &header).await?;
                apply_round_termination(&mut staging, &header);
                self.election
                    .update_miners_count(header.round.miner_count())
                    .await
                    .map_err(ConsensusError::ElectionGatewayError)?;
            }
            ConsensusBehaviour::Nothing => {
                return Err(ConsensusError::InvalidRoundData(
                    "a Nothing behaviour cannot be processed".into(),
                ))
            }
        }

        // The single state-set commit: everything above mutated a staged
        // copy only.
        *self.state.write() = staging;
        crate::metrics::record_proposal_accepted(&header.behaviour.to_string());
        tracing::debug!(
            sender = %header.sender_public_key,
            behaviour = %header.behaviour,
            round = header.round.round_number,
            "round transition applied"
        );

        if let Some(event) = lib_event {
            crate::metrics::record_lib_height(event.height);
            tracing::info!(height = event.height, round = event.round_number, "irreversible block found");
            if let Err(e) = self.event_sink.publish_irreversible_block_found(event).await {
                tracing::warn!(error = %e, "failed to publish irreversible block event");
            }
        }
        let update = MiningInformationUpdatedEvent {
            public_key: header.sender_public_key,
            behaviour: header.behaviour,
            mining_time: now,
        };
        if let Err(e) = self.event_sink.publish_mining_information_updated(update).await {
            tracing::warn!(error = %e, "failed to publish mining information event");
        }
        Ok(())
    }

    async fn get_current_round(&self) -> ConsensusResult<Round> {
        self.state.read().current_round().cloned()
    }

    async fn get_round(&self, round_number: u64) -> ConsensusResult<Round> {
        self.state.read().round(round_number).cloned()
    }

    async fn get_current_lib_height(&self) -> BlockHeight {
        self.state
            .read()
            .current_round()
            .map(|r| r.confirmed_irreversible_block_height)
            .unwrap_or(0)
    }

    async fn update_main_chain_miner_list(&self, miner_key_bytes: Vec<Vec<u8>>) -> ConsensusResult<()> {
        let mut keys = Vec::with_capacity(miner_key_bytes.len());
        for bytes in &miner_key_bytes {
            keys.push(MinerPublicKey::from_bytes(bytes)?);
        }
        self.state.write().main_chain_miner_list = keys;
        Ok(())
    }

    async fn get_main_chain_current_miner_list(&self) -> Vec<MinerPublicKey> {
        self.state.read().main_chain_miner_list.clone()
    }
}

// === APPLY STEPS (pure functions over staged state) ===

/// Build the proposal round for a full block: commitment, mixed signature,
/// reveal, next-round ordering, and Shamir pieces of the fresh secret.
fn build_update_value_round(
    current: &Round,
    previous: Option<&Round>,
    key: &MinerPublicKey,
    trigger: &TriggerInformation,
    now: TimestampMs,
) -> ConsensusResult<Round> {
    let in_value = trigger
        .in_value
        .ok_or_else(|| ConsensusError::MissingTriggerData("in_value".into()))?;
    let mut round = current.clone();
    let count = round.miner_count();

    // The signature mixes the revealed secret with the previous round's
    // signatures; with nothing to reveal yet, the fresh secret seeds it.
    let reveal_source = trigger.previous_in_value.unwrap_or(in_value);
    let signature = match previous {
        Some(previous_round) => previous_round.calculate_signature(&reveal_source),
        None => sha256(&in_value),
    };

    let taken: Vec<u32> = round
        .miners
        .values()
        .filter(|m| m.public_key != *key)
        .map(|m| m.final_order_of_next_round)
        .filter(|&o| o > 0)
        .collect();
    let recipients: Vec<(MinerPublicKey, u32)> = round
        .miners
        .values()
        .filter(|m| m.public_key != *key)
        .map(|m| (m.public_key, m.order))
        .collect();

    let threshold = secret_sharing_threshold(count);
    let shares = if count >= 2 && threshold >= 1 {
        Some(
            encode_secret(&in_value, count, threshold)
                .map_err(|e| ConsensusError::InvalidRoundData(format!("secret sharing failed: {e}")))?,
        )
    } else {
        None
    };

    {
        let slot = round
            .miners
            .get_mut(key)
            .ok_or_else(|| ConsensusError::UnknownMiner(key.to_string()))?;
        slot.out_value = Some(sha256(&in_value));
        slot.signature = Some(signature);
        slot.previous_in_value = trigger.previous_in_value;
        slot.actual_mining_times.push(now);
        slot.implied_irreversible_block_height = trigger.current_block_height;

        let supposed = Round::derive_order_from_signature(&signature, count);
        slot.supposed_order_of_next_round = supposed;
        slot.final_order_of_next_round = Round::resolve_final_order(supposed, &taken, count);

        if let Some(shares) = &shares {
            for (recipient, order) in &recipients {
                slot.encrypted_pieces
                    .insert(*recipient, shares[*order as usize - 1].clone());
            }
        }
    }

    // Pieces this node decrypted of other miners' secrets travel on the
    // producing miner's slot, keyed by this sender.
    for (raw_key, piece) in &trigger.decrypted_pieces {
        let producer = MinerPublicKey::from_bytes(raw_key)?;
        if let Some(slot) = round.miners.get_mut(&producer) {
            slot.decrypted_pieces.insert(*key, piece.clone());
        }
    }
    Ok(round)
}

/// Build the proposal round for a tiny block.
fn build_tiny_block_round(
    current: &Round,
    key: &MinerPublicKey,
    now: TimestampMs,
) -> ConsensusResult<Round> {
    let mut round = current.clone();
    let slot = round
        .miners
        .get_mut(key)
        .ok_or_else(|| ConsensusError::UnknownMiner(key.to_string()))?;
    slot.produced_tiny_blocks += 1;
    slot.actual_mining_times.push(now);
    Ok(round)
}

/// Apply a validated full block to the staged state.
fn apply_update_value(
    staging: &mut ConsensusState,
    header: &ConsensusHeaderInformation,
) -> ConsensusResult<UpdateValueOutcome> {
    let current_number = staging.current_round_number;
    let sender = header.sender_public_key;
    let provided_sender = header
        .round
        .miners
        .get(&sender)
        .ok_or_else(|| ConsensusError::UnknownMiner(sender.to_string()))?
        .clone();

    // Reveals and share contributions embedded in the proposal. Commitment
    // validity was enforced by the pipeline before we got here.
    let reveals: Vec<(MinerPublicKey, Hash)> = header
        .round
        .miners
        .iter()
        .filter_map(|(k, s)| s.previous_in_value.map(|v| (*k, v)))
        .collect();
    let contributions: Vec<(MinerPublicKey, Vec<u8>)> = header
        .round
        .miners
        .iter()
        .filter_map(|(k, s)| s.decrypted_pieces.get(&sender).map(|p| (*k, p.clone())))
        .collect();

    {
        let current = staging
            .rounds
            .get_mut(&current_number)
            .ok_or(ConsensusError::RoundNotFound(current_number))?;
        let count = current.miner_count();
        let taken: Vec<u32> = current
            .miners
            .values()
            .filter(|m| m.public_key != sender)
            .map(|m| m.final_order_of_next_round)
            .filter(|&o| o > 0)
            .collect();

        let slot = current
            .miners
            .get_mut(&sender)
            .ok_or_else(|| ConsensusError::UnknownMiner(sender.to_string()))?;
        slot.out_value = provided_sender.out_value;
        slot.signature = provided_sender.signature;
        slot.actual_mining_times = provided_sender.actual_mining_times.clone();
        slot.implied_irreversible_block_height = provided_sender.implied_irreversible_block_height;
        slot.produced_blocks += 1;
        slot.encrypted_pieces = provided_sender.encrypted_pieces.clone();
        if let Some(signature) = &provided_sender.signature {
            let supposed = Round::derive_order_from_signature(signature, count);
            slot.supposed_order_of_next_round = supposed;
            slot.final_order_of_next_round = Round::resolve_final_order(supposed, &taken, count);
        }

        // First writer wins: a legitimately revealed value is never
        // overwritten.
        for (miner, value) in &reveals {
            if let Some(slot) = current.miners.get_mut(miner) {
                if slot.previous_in_value.is_none() {
                    slot.previous_in_value = Some(*value);
                }
            }
        }
    }

    // Back-fill the revealed secrets into the round they belong to, and
    // bank the contributed shares on the producing miners' records there.
    if let Some(previous_number) = current_number.checked_sub(1) {
        if let Some(previous) = staging.rounds.get_mut(&previous_number) {
            for (miner, value) in &reveals {
                if let Some(slot) = previous.miners.get_mut(miner) {
                    if slot.in_value.is_none() {
                        slot.in_value = Some(*value);
                    }
                }
            }
            for (producer, piece) in &contributions {
                if let Some(slot) = previous.miners.get_mut(producer) {
                    slot.decrypted_pieces.insert(sender, piece.clone());
                }
            }
        }
    }

    let secrets_revealed = reveal_shared_in_values(staging, current_number, &sender);

    let current = staging
        .rounds
        .get_mut(&current_number)
        .ok_or(ConsensusError::RoundNotFound(current_number))?;
    let lib_advanced = LibCalculator::candidate_height(current)
        .filter(|&candidate| LibCalculator::advance(current, candidate))
        .map(|candidate| (current_number, candidate));

    Ok(UpdateValueOutcome {
        lib_advanced,
        secrets_revealed,
    })
}

/// Attempt threshold reconstruction of every unrevealed secret.
///
/// Both gates (enough pieces distributed, enough pieces decrypted) use
/// the same 2/3 threshold, and reconstruction takes exactly that many
/// shares. A miner that never reaches the threshold is silently skipped;
/// a reconstructed value is only trusted after it passes the same
/// commitment check as a directly revealed one.
fn reveal_shared_in_values(
    staging: &mut ConsensusState,
    current_number: u64,
    publisher: &MinerPublicKey,
) -> u64 {
    let Some(previous_number) = current_number.checked_sub(1) else {
        return 0;
    };
    let Some(previous) = staging.rounds.get(&previous_number).cloned() else {
        return 0;
    };
    let Some(current) = staging.rounds.get(&current_number) else {
        return 0;
    };

    let threshold = secret_sharing_threshold(current.miner_count());
    if threshold == 0 {
        return 0;
    }

    let mut accepted: Vec<(MinerPublicKey, Hash)> = Vec::new();
    for (key, slot) in &current.miners {
        if key == publisher || slot.previous_in_value.is_some() {
            continue;
        }
        let Some(previous_slot) = previous.miners.get(key) else {
            continue;
        };
        if previous_slot.encrypted_pieces.len() < threshold
            || previous_slot.decrypted_pieces.len() < threshold
        {
            continue;
        }

        let mut shares = Vec::with_capacity(threshold);
        let mut positions = Vec::with_capacity(threshold);
        for (contributor, piece) in &previous_slot.decrypted_pieces {
            let Some(contributor_slot) = previous.miners.get(contributor) else {
                continue;
            };
            shares.push(piece.clone());
            positions.push(contributor_slot.order as u64);
            if shares.len() == threshold {
                break;
            }
        }
        if shares.len() < threshold {
            continue;
        }

        let value = match shared_crypto::decode_secret(&shares, &positions, threshold) {
            Ok(bytes) if bytes.len() == 32 => {
                let mut value = [0u8; 32];
                value.copy_from_slice(&bytes);
                value
            }
            Ok(_) => {
                tracing::warn!(miner = %key, "reconstructed secret has wrong length");
                continue;
            }
            Err(e) => {
                tracing::warn!(miner = %key, error = %e, "secret reconstruction failed");
                continue;
            }
        };

        // Side-channel values get the same cryptographic check as any
        // direct reveal.
        match &previous_slot.out_value {
            Some(committed) if commitment_matches(&value, committed) => {
                accepted.push((*key, value));
            }
            _ => {
                tracing::warn!(miner = %key, "reconstructed secret fails commitment check");
            }
        }
    }

    let revealed = accepted.len() as u64;
    if revealed > 0 {
        if let Some(current) = staging.rounds.get_mut(&current_number) {
            for (key, value) in &accepted {
                if let Some(slot) = current.miners.get_mut(key) {
                    if slot.previous_in_value.is_none() {
                        slot.previous_in_value = Some(*value);
                    }
                }
            }
        }
        if let Some(previous) = staging.rounds.get_mut(&previous_number) {
            for (key, value) in &accepted {
                if let Some(slot) = previous.miners.get_mut(key) {
                    if slot.in_value.is_none() {
                        slot.in_value = Some(*value);
                    }
                }
            }
        }
        tracing::info!(count = revealed, round = current_number, "secrets recovered from shares");
    }
    revealed
}

/// Apply a validated tiny block.
fn apply_tiny_block(
    staging: &mut ConsensusState,
    header: &ConsensusHeaderInformation,
) -> ConsensusResult<()> {
    let current_number = staging.current_round_number;
    let sender = header.sender_public_key;
    let provided_sender = header
        .round
        .miners
        .get(&sender)
        .ok_or_else(|| ConsensusError::UnknownMiner(sender.to_string()))?;

    let current = staging
        .rounds
        .get_mut(&current_number)
        .ok_or(ConsensusError::RoundNotFound(current_number))?;
    let slot = current
        .miners
        .get_mut(&sender)
        .ok_or_else(|| ConsensusError::UnknownMiner(sender.to_string()))?;
    slot.produced_tiny_blocks += 1;
    slot.produced_blocks += 1;
    slot.actual_mining_times = provided_sender.actual_mining_times.clone();
    Ok(())
}

/// Apply a validated NextRound/NextTerm: store the new round and advance
/// the counters. Historical rounds stay in the store.
fn apply_round_termination(staging: &mut ConsensusState, header: &ConsensusHeaderInformation) {
    let next = header.round.clone();
    staging.current_round_number = next.round_number;
    staging.current_term_number = next.term_number;
    staging.rounds.insert(next.round_number, next);
}
