//! Trait interfaces for the external collaborators the core consumes but
//! does not own: identity verification, weather conditions, outbound
//! notifications, payment capture, and background-check vendors (spec §6).
//!
//! The core only ever depends on these traits. Concrete adapters (HTTP
//! clients, vendor SDKs) live outside this workspace; the in-memory doubles
//! here exist so the rest of the crate can be built and tested without them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod doubles;

/// Verifies a bearer credential and resolves it to an actor identity.
/// The core never inspects signatures itself; it asks this collaborator.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, CollaboratorError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject_id: Uuid,
    pub role: String,
}

/// Reports current conditions at a coordinate so the pricing engine can
/// decide whether the extreme-weather multiplier applies (spec §4.B step 3).
#[async_trait]
pub trait WeatherOracle: Send + Sync {
    async fn conditions(&self, lat: f64, lng: f64) -> Result<WeatherConditions, CollaboratorError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherConditions {
    pub is_extreme: bool,
    pub description: String,
}

/// Sends a customer- or provider-facing notification. Fire-and-forget from
/// the core's perspective; delivery failures never block a state transition.
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send(&self, notification: OutboundNotification) -> Result<(), CollaboratorError>;
}

#[derive(Debug, Clone)]
pub struct OutboundNotification {
    pub recipient_id: Uuid,
    pub channel: NotificationChannel,
    pub template: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationChannel {
    Push,
    Sms,
    Email,
}

/// Captures or releases funds for a job. The core records the result but
/// never talks to a payment network directly.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn capture(&self, job_id: Uuid, amount_cents: i64) -> Result<PaymentReceipt, CollaboratorError>;
    async fn refund(&self, job_id: Uuid, amount_cents: i64) -> Result<PaymentReceipt, CollaboratorError>;
}

#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub reference: String,
    pub captured_at: DateTime<Utc>,
    pub amount_cents: i64,
}

/// Runs or polls a background-check screening for a provider application.
#[async_trait]
pub trait BackgroundCheckVendor: Send + Sync {
    async fn initiate(&self, provider_id: Uuid) -> Result<String, CollaboratorError>;
    async fn poll(&self, vendor_reference: &str) -> Result<BackgroundCheckResult, CollaboratorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundCheckResult {
    Pending,
    Clear,
    Flagged,
}

/// The narrow error surface every collaborator call can fail with. The core
/// maps `Timeout` onto `CoreError::ExternalTimeout` at the call site.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollaboratorError {
    #[error("collaborator timed out")]
    Timeout,
    #[error("collaborator rejected the request: {0}")]
    Rejected(String),
    #[error("collaborator is unreachable: {0}")]
    Unreachable(String),
}
