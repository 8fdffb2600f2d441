//! Driven ports (outbound dependencies)

use crate::events::{IrreversibleBlockFoundEvent, MiningInformationUpdatedEvent};
use async_trait::async_trait;
use shared_crypto::MinerPublicKey;
use shared_types::TimestampMs;

/// Election/membership collaborator.
///
/// Calls are synchronous from the state machine's point of view: a term
/// transition blocks on them, and a failure aborts the whole transition
/// before anything commits.
#[async_trait]
pub trait ElectionGateway: Send + Sync {
    /// Authoritative next-term miner set, as raw key bytes. Consensus
    /// validates every key and cross-checks the proposed set against this
    /// exactly, rather than trusting a self-reported list.
    async fn get_victories(
        &self,
        current_miners: &[MinerPublicKey],
    ) -> Result<Vec<Vec<u8>>, String>;

    /// Pushed when the term size changes.
    async fn update_miners_count(&self, count: usize) -> Result<(), String>;
}

/// Event bus for committed transitions.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// LIB advanced.
    async fn publish_irreversible_block_found(
        &self,
        event: IrreversibleBlockFoundEvent,
    ) -> Result<(), String>;

    /// A transition was applied.
    async fn publish_mining_information_updated(
        &self,
        event: MiningInformationUpdatedEvent,
    ) -> Result<(), String>;
}

/// Time source for scheduling decisions.
///
/// Decisions are recomputed from the clock on every call; nothing here is
/// cached.
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in milliseconds.
    fn now_ms(&self) -> TimestampMs;
}

/// Default time source using system time.
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> TimestampMs {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
