//! SLA profile catalog and the immutable per-job snapshot (spec §3, §4.A, §4.H).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::task::Level;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegionType {
    Country,
    Province,
    City,
    PostalPrefix,
    CustomZone,
}

impl RegionType {
    /// Specificity rank used by SLA resolution tie-breaking (§4.A, iii):
    /// postal_prefix > city > province > country.
    pub fn specificity(self) -> u8 {
        match self {
            RegionType::PostalPrefix => 4,
            RegionType::City => 3,
            RegionType::Province => 2,
            RegionType::Country => 1,
            RegionType::CustomZone => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaProfile {
    pub id: Uuid,
    pub level: Level,
    pub region_type: RegionType,
    pub region_value: String,
    pub country: String,
    pub task_id: Option<Uuid>,
    pub response_time_min: i32,
    pub arrival_time_min: Option<i32>,
    pub completion_time_min: Option<i32>,
    pub penalty_enabled: bool,
    pub penalty_per_min_cents: Option<i64>,
    pub penalty_cap_cents: Option<i64>,
    pub effective_from: NaiveDate,
    pub effective_until: Option<NaiveDate>,
    pub priority_order: i32,
    pub active: bool,
}

impl SlaProfile {
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.active
            && self.effective_from <= date
            && self.effective_until.map_or(true, |until| date <= until)
    }
}

/// Immutable copy of deadline fields captured into a job at creation time
/// (spec §3 invariants, §4.H). Never re-derived from the live catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlaSnapshot {
    pub profile_id: Option<Uuid>,
    pub response_time_min: Option<i32>,
    pub arrival_time_min: Option<i32>,
    pub completion_time_min: Option<i32>,
    pub penalty_per_min_cents: Option<i64>,
    pub penalty_cap_cents: Option<i64>,
    pub captured_at: DateTime<Utc>,
}

/// Picks the best-matching SLA profile out of the level/country/task
/// candidates the repository already filtered (spec §4.A "SLA resolution").
/// Ranked by: task-specific beats level-wide, then higher `priority_order`,
/// then the most specific `region_type`. `custom_zone` profiles are skipped —
/// zone membership isn't resolvable from the address alone.
pub fn find_sla<'a>(
    candidates: &'a [SlaProfile],
    task_id: Uuid,
    city: &str,
    province: &str,
    postal_code: &str,
    today: NaiveDate,
) -> Option<&'a SlaProfile> {
    candidates
        .iter()
        .filter(|p| p.is_effective_on(today) && region_matches(p, city, province, postal_code))
        .max_by_key(|p| (task_matches(p, task_id), p.priority_order, p.region_type.specificity()))
}

fn task_matches(profile: &SlaProfile, task_id: Uuid) -> u8 {
    u8::from(profile.task_id == Some(task_id))
}

fn region_matches(profile: &SlaProfile, city: &str, province: &str, postal_code: &str) -> bool {
    match profile.region_type {
        RegionType::Country => true,
        RegionType::Province => profile.region_value.eq_ignore_ascii_case(province),
        RegionType::City => profile.region_value.eq_ignore_ascii_case(city),
        RegionType::PostalPrefix => postal_code
            .to_ascii_uppercase()
            .starts_with(&profile.region_value.to_ascii_uppercase()),
        RegionType::CustomZone => false,
    }
}

impl SlaSnapshot {
    /// The "no SLA profile matched" degraded snapshot: job proceeds, deadline
    /// fields are absent, matching still functions (§4.A).
    pub fn degraded(captured_at: DateTime<Utc>) -> Self {
        Self {
            profile_id: None,
            response_time_min: None,
            arrival_time_min: None,
            completion_time_min: None,
            penalty_per_min_cents: None,
            penalty_cap_cents: None,
            captured_at,
        }
    }

    pub fn from_profile(profile: &SlaProfile, captured_at: DateTime<Utc>) -> Self {
        Self {
            profile_id: Some(profile.id),
            response_time_min: Some(profile.response_time_min),
            arrival_time_min: profile.arrival_time_min,
            completion_time_min: profile.completion_time_min,
            penalty_per_min_cents: profile.penalty_per_min_cents,
            penalty_cap_cents: profile.penalty_cap_cents,
            captured_at,
        }
    }
}
