//! Job lifecycle state machine and SLA snapshot/deadline tracking
//! (spec §4.G-H).

pub mod sla_timers;
pub mod state_machine;
pub mod transitions;

pub use state_machine::{transition, TransitionOutcome};
