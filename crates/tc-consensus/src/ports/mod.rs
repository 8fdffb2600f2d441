//! Ports: the seams between the consensus core and its collaborators
//!
//! Inbound ports are the API the block production/validation infrastructure
//! drives; outbound ports are what consensus itself depends on (election
//! results, the wall clock, the event bus).

pub mod inbound;
pub mod outbound;

pub use inbound::ConsensusApi;
pub use outbound::{ElectionGateway, EventSink, SystemTimeSource, TimeSource};
