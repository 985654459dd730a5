//! Geo distance, hard-qualification gate, ranking, and the matching
//! pipeline that glues them together (spec §4.C-F).

pub mod geo;
pub mod pipeline;
pub mod qualifier;
pub mod ranking;

pub use pipeline::{find_matching_providers, CandidateInput, DEFAULT_MAX_RESULTS};
pub use qualifier::{qualify, CandidateRecords, QualifiedCandidate};
pub use ranking::{rank, RankedCandidate};
