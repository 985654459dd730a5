//! Provider scoring ledger: per-level bands, the penalty matrix, and the
//! weekly recovery pass (spec §4.J).

pub mod bands;
pub mod ledger;

pub use bands::{band_for, penalty_points, ScoreBand};
pub use ledger::{adjust, penalize, recover, LedgerOutcome};
