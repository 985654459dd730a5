//! Background daemons and cross-cutting services that sit between the
//! handler layer and the repositories: the event bus, the location
//! ingestion throttle, and the sweeper tasks named in §5.

pub mod event_bus;
pub mod location;
pub mod scoring;
pub mod sweepers;
