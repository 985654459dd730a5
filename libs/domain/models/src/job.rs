//! The job aggregate root (spec §3, §4.G).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sla::SlaSnapshot;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    PendingMatch,
    Matched,
    PendingApproval,
    PendingPriceAgreement,
    Scheduled,
    ProviderAccepted,
    ProviderEnRoute,
    InProgress,
    Completed,
    CancelledByCustomer,
    CancelledByProvider,
    CancelledBySystem,
    Disputed,
    Refunded,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed
                | JobStatus::CancelledByCustomer
                | JobStatus::CancelledByProvider
                | JobStatus::CancelledBySystem
                | JobStatus::Refunded
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Standard,
    Priority,
    Urgent,
    Emergency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Customer,
    Provider,
    System,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

/// A customer note drawn from a closed set, never free text (spec §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CustomerNote {
    HasPets,
    GateCodeRequired,
    FragileItems,
    PreferSameProvider,
    AccessibilityNeeded,
    ParkingLimited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub reference: String,
    pub customer_id: Uuid,
    pub task_id: Uuid,
    pub status: JobStatus,
    pub priority: Priority,
    pub is_emergency: bool,
    pub service_lat: f64,
    pub service_lng: f64,
    pub service_address: ServiceAddress,
    pub requested_date: Option<NaiveDate>,
    pub requested_time_start: Option<NaiveTime>,
    pub requested_time_end: Option<NaiveTime>,
    pub flexible_schedule: bool,
    pub sla_snapshot: SlaSnapshot,
    pub quoted_price_cents: i64,
    pub commission_rate: rust_decimal::Decimal,
    pub commission_cents: i64,
    pub provider_payout_cents: i64,
    pub currency: String,
    pub customer_notes: Vec<CustomerNote>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl Job {
    /// Spec §3 invariant: commission + payout must equal the final price,
    /// with no rounding leakage.
    pub fn payout_balances(&self) -> bool {
        self.commission_cents + self.provider_payout_cents == self.quoted_price_cents
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub job_id: Uuid,
    pub stars: u8,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}
