//! Dynamic pricing engine: emergency multiplier stack, commission band
//! resolution, and the definitive pricing event recorded at job creation
//! (spec §4.B).

pub mod commission;
pub mod engine;
pub mod holidays;
pub mod multipliers;

pub use engine::{definitive_event, quote, QuoteRequest, DEFAULT_MULTIPLIER_CEILING};
