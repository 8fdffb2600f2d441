//! In-memory election gateway and event sink

use crate::events::{IrreversibleBlockFoundEvent, MiningInformationUpdatedEvent};
use crate::ports::outbound::{ElectionGateway, EventSink, TimeSource};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::MinerPublicKey;
use shared_types::TimestampMs;

/// A hand-driven clock.
pub struct ManualTimeSource {
    now: RwLock<TimestampMs>,
}

impl ManualTimeSource {
    pub fn new(now: TimestampMs) -> Self {
        Self { now: RwLock::new(now) }
    }

    /// Move the clock.
    pub fn set(&self, now: TimestampMs) {
        *self.now.write() = now;
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> TimestampMs {
        *self.now.read()
    }
}

/// In-memory election gateway.
///
/// Returns a configured victory list, or re-elects the current miners when
/// none is set. Records every pushed miner count.
pub struct InMemoryElectionGateway {
    victories: RwLock<Option<Vec<MinerPublicKey>>>,
    pushed_counts: RwLock<Vec<usize>>,
}

impl InMemoryElectionGateway {
    pub fn new() -> Self {
        Self {
            victories: RwLock::new(None),
            pushed_counts: RwLock::new(Vec::new()),
        }
    }

    /// Set the next election result.
    pub fn set_victories(&self, miners: Vec<MinerPublicKey>) {
        *self.victories.write() = Some(miners);
    }

    /// Miner counts consensus has pushed so far.
    pub fn pushed_counts(&self) -> Vec<usize> {
        self.pushed_counts.read().clone()
    }
}

impl Default for InMemoryElectionGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ElectionGateway for InMemoryElectionGateway {
    async fn get_victories(
        &self,
        current_miners: &[MinerPublicKey],
    ) -> Result<Vec<Vec<u8>>, String> {
        let winners = match self.victories.read().as_ref() {
            Some(miners) => miners.clone(),
            None => current_miners.to_vec(),
        };
        Ok(winners.iter().map(|k| k.to_vec()).collect())
    }

    async fn update_miners_count(&self, count: usize) -> Result<(), String> {
        self.pushed_counts.write().push(count);
        Ok(())
    }
}

/// In-memory event sink recording every published event.
pub struct InMemoryEventSink {
    irreversible: RwLock<Vec<IrreversibleBlockFoundEvent>>,
    mining_updates: RwLock<Vec<MiningInformationUpdatedEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self {
            irreversible: RwLock::new(Vec::new()),
            mining_updates: RwLock::new(Vec::new()),
        }
    }

    pub fn irreversible_events(&self) -> Vec<IrreversibleBlockFoundEvent> {
        self.irreversible.read().clone()
    }

    pub fn mining_updates(&self) -> Vec<MiningInformationUpdatedEvent> {
        self.mining_updates.read().clone()
    }
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn publish_irreversible_block_found(
        &self,
        event: IrreversibleBlockFoundEvent,
    ) -> Result<(), String> {
        self.irreversible.write().push(event);
        Ok(())
    }

    async fn publish_mining_information_updated(
        &self,
        event: MiningInformationUpdatedEvent,
    ) -> Result<(), String> {
        self.mining_updates.write().push(event);
        Ok(())
    }
}
