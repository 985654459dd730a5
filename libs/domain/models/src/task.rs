//! Closed service-task catalog (spec §3, §4.A).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider tier required to accept a task. L4 is on-call emergency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    L1 = 1,
    L2 = 2,
    L3 = 3,
    L4 = 4,
}

impl Level {
    pub fn numeric(self) -> u8 {
        self as u8
    }

    pub fn from_numeric(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::L1),
            2 => Some(Self::L2),
            3 => Some(Self::L3),
            4 => Some(Self::L4),
            _ => None,
        }
    }
}

/// A task from the closed catalog. Immutable within a job's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub category_id: Uuid,
    pub slug: String,
    pub name: String,
    pub required_level: Level,
    pub regulated: bool,
    pub license_required: bool,
    pub hazardous: bool,
    pub structural: bool,
    pub emergency_eligible: bool,
    pub base_price_min_cents: Option<i64>,
    pub base_price_max_cents: Option<i64>,
    pub estimated_duration_min: Option<i32>,
    pub escalation_keywords: Vec<String>,
    pub active: bool,
}

impl Task {
    pub fn has_base_pricing(&self) -> bool {
        self.base_price_min_cents.is_some() && self.base_price_max_cents.is_some()
    }
}
