//! Port traits: what the Executor exposes (`inbound`) and what it requires
//! from the host process (`outbound`).

pub mod inbound;
pub mod outbound;
