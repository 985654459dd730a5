//! Provider profile and its supporting verification records (spec §3).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::Level;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Onboarding,
    PendingReview,
    Active,
    Suspended,
    Inactive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundCheckStatus {
    NotSubmitted,
    Pending,
    Cleared,
    Flagged,
    Expired,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundCheck {
    pub status: BackgroundCheckStatus,
    pub date: Option<NaiveDate>,
    pub expiry: Option<NaiveDate>,
}

impl BackgroundCheck {
    pub fn is_cleared_on(&self, today: NaiveDate) -> bool {
        self.status == BackgroundCheckStatus::Cleared
            && self.expiry.map_or(true, |expiry| expiry > today)
    }
}

/// Authoritative provider profile. `internal_score` is mutated only by the
/// scoring ledger (spec §3 invariants, §4.J).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub level: Level,
    pub status: ProviderStatus,
    pub background_check: BackgroundCheck,
    pub internal_score: f64,
    pub service_radius_km: f64,
    pub home_lat: Option<f64>,
    pub home_lng: Option<f64>,
    pub max_concurrent_jobs: i32,
    pub available_for_emergency: bool,
    pub is_online: bool,
}

impl ProviderProfile {
    pub fn has_home_coordinates(&self) -> bool {
        self.home_lat.is_some() && self.home_lng.is_some()
    }

    /// Level-dependent acceptable statuses for matching (§4.D.1): L3+ requires
    /// `active`, L1/L2 additionally accept `onboarding`/`pending_review` (MVP).
    pub fn is_eligible_status_for(&self, required: Level) -> bool {
        match self.status {
            ProviderStatus::Suspended | ProviderStatus::Inactive => false,
            ProviderStatus::Active => true,
            ProviderStatus::Onboarding | ProviderStatus::PendingReview => required < Level::L3,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    License,
    Certification,
    Permit,
    Training,
    BackgroundCheck,
    Portfolio,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    PendingReview,
    Verified,
    Rejected,
    Expired,
    Revoked,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub credential_type: CredentialType,
    pub name: String,
    pub status: CredentialStatus,
    pub issued_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub jurisdiction: Option<String>,
}

impl Credential {
    pub fn is_valid_license_on(&self, today: NaiveDate) -> bool {
        self.credential_type == CredentialType::License
            && self.status == CredentialStatus::Verified
            && self.expiry_date.map_or(true, |expiry| expiry > today)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceStatus {
    PendingReview,
    Verified,
    Expired,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsurancePolicy {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub policy_type: String,
    pub coverage_cents: i64,
    pub effective_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub status: InsuranceStatus,
}

/// $2M floor required for Level-4 insurance (§4.D.8b).
pub const LEVEL_4_MIN_COVERAGE_CENTS: i64 = 200_000_000;

impl InsurancePolicy {
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.status == InsuranceStatus::Verified
            && self.effective_date <= today
            && today < self.expiry_date
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnCallShiftStatus {
    Scheduled,
    Active,
    Completed,
    Cancelled,
    NoShow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnCallShift {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub shift_start: DateTime<Utc>,
    pub shift_end: DateTime<Utc>,
    pub region_type: String,
    pub region_value: String,
    pub status: OnCallShiftStatus,
}

impl OnCallShift {
    pub fn covers(&self, now: DateTime<Utc>) -> bool {
        self.status == OnCallShiftStatus::Active && self.shift_start <= now && now < self.shift_end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskQualification {
    pub provider_id: Uuid,
    pub task_id: Uuid,
    pub qualified: bool,
    pub qualified_at: Option<DateTime<Utc>>,
    pub auto_granted: bool,
}
