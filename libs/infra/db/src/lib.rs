//! libSQL persistence adapter: connection bootstrap, schema, row mapping,
//! and one repository per aggregate.

pub mod client;
pub mod errors;
mod mapping;
pub mod repositories;
mod schema;

pub use client::DbClient;
pub use errors::DbError;
pub use repositories::{
    AssignmentRepository, JobRepository, PenaltyRepository, PricingRepository, ProviderRepository,
    RatingRepository, SlaProfileRepository, TaskRepository,
};
