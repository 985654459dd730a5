//! Pricing value types shared between the pricing engine and persistence
//! (spec §3 "Pricing event", §4.B).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierDetail {
    pub rule_name: String,
    pub rule_type: String,
    pub multiplier: Decimal,
    pub reason: String,
}

/// A price estimate returned before a job exists (§4.B step 1-7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub base_min_cents: i64,
    pub base_max_cents: i64,
    pub dynamic_multiplier: Decimal,
    pub multiplier_details: Vec<MultiplierDetail>,
    pub final_min_cents: i64,
    pub final_max_cents: i64,
    pub commission_rate_min: Decimal,
    pub commission_rate_max: Decimal,
    pub commission_rate_default: Decimal,
    pub payout_min_cents: i64,
    pub payout_max_cents: i64,
    pub currency: String,
}

/// Append-only audit row written once a job exists. No mutation after insert
/// (spec §3 invariants).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingEvent {
    pub id: Uuid,
    pub job_id: Uuid,
    pub event_type: String,
    pub base_price_cents: i64,
    pub multiplier_applied: Decimal,
    pub adjustments_cents: i64,
    pub final_price_cents: i64,
    pub rules_applied: Vec<MultiplierDetail>,
    pub commission_rate: Decimal,
    pub commission_cents: i64,
    pub provider_payout_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// A configured surge rule loaded from the relational store (§4.B step 3,
/// "configured surge rules").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PricingRuleType {
    DemandSurge,
    LevelPremium,
    DistanceAdjustment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: Uuid,
    pub name: String,
    pub rule_type: PricingRuleType,
    pub task_id: Option<Uuid>,
    pub level: Option<crate::task::Level>,
    pub country: Option<String>,
    pub multiplier_max: Decimal,
    pub description: Option<String>,
    pub active: bool,
}

/// Effective commission band for a (level, country) pair (§4.B step 6).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CommissionSchedule {
    pub level: crate::task::Level,
    pub country: String,
    pub min: Decimal,
    pub max: Decimal,
    pub default: Decimal,
}
