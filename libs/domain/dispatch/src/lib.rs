//! Assignment coordinator: broadcast, first-acceptance-wins accept,
//! decline, expiry sweep, and reassignment (spec §4.I).

pub mod coordinator;

pub use coordinator::{accept, broadcast, decline, reassign_cancel_current, sweep_expired, AcceptOutcome, DEFAULT_RESPONSE_MIN};
