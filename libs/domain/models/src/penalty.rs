//! Append-only scoring-ledger audit rows (spec §3, §4.J).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyType {
    ResponseTimeout,
    Cancellation,
    NoShow,
    BadReview,
    SlaBreach,
    /// Non-negative admin adjustment; positive deltas are recoveries.
    AdminAdjustment,
    /// Weekly normalization recovery (§4.J "Recovery").
    Recovery,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub penalty_type: PenaltyType,
    /// Positive for deductions, negative for recoveries/credits, matching the
    /// ledger's "points_deducted" field sign convention used throughout §4.J.
    pub points_deducted: i32,
    pub applied_at: DateTime<Utc>,
    pub job_id: Option<Uuid>,
    pub reason: Option<String>,
}
