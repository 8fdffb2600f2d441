//! Adapters: in-memory implementations of the outbound ports
//!
//! Test and demo doubles; production deployments wire real gateways.

pub mod in_memory;

pub use in_memory::{InMemoryElectionGateway, InMemoryEventSink, ManualTimeSource};
