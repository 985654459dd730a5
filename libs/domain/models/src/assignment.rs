//! The job-to-provider assignment edge (spec §3, §4.I).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Offered,
    Accepted,
    Declined,
    Expired,
    Cancelled,
}

impl AssignmentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AssignmentStatus::Offered)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub job_id: Uuid,
    pub provider_id: Uuid,
    pub status: AssignmentStatus,
    pub offered_at: DateTime<Utc>,
    pub offer_expires_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub sla_response_deadline: DateTime<Utc>,
    pub sla_arrival_deadline: Option<DateTime<Utc>>,
    pub sla_completion_deadline: Option<DateTime<Utc>>,
    pub sla_response_met: Option<bool>,
    pub sla_arrival_met: Option<bool>,
    pub sla_completion_met: Option<bool>,
    pub en_route_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub started_work_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub match_score: f64,
}
