//! HTTP and WebSocket adapters: the narrow actor-authenticated service
//! surface (spec §6) plus the real-time fan-out socket (spec §4.K).

pub mod error;
pub mod operations;
pub mod stream;
