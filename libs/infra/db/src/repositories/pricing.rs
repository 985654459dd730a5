//! Pricing configuration reads and append-only pricing-event writes.

use dispatch_domain_models::{CommissionSchedule, Level, PricingEvent, PricingRule, PricingRuleType};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::mapping::parse_decimal;

mod queries {
    /// §4.B step 3: a configured surge rule only applies when its scope
    /// (task/level/country) matches the request — a `NULL` column means
    /// "any", not "match nothing".
    pub const ACTIVE_RULES_FOR_TASK: &str = r#"
        SELECT * FROM pricing_rules
        WHERE active = 1
          AND (task_id = ? OR task_id IS NULL)
          AND (level = ? OR level IS NULL)
          AND (country = ? OR country IS NULL)
    "#;

    pub const COMMISSION_SCHEDULE: &str =
        "SELECT * FROM commission_schedules WHERE level = ? AND country = ?";

    pub const INSERT_EVENT: &str = r#"
        INSERT INTO pricing_events (
            id, job_id, event_type, base_price_cents, multiplier_applied,
            adjustments_cents, final_price_cents, rules_applied,
            commission_rate, commission_cents, provider_payout_cents, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    "#;
}

pub struct PricingRepository {
    conn: Connection,
}

impl PricingRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self))]
    pub async fn active_rules_for_task(
        &self,
        task_id: Uuid,
        level: Level,
        country: &str,
    ) -> Result<Vec<PricingRule>, DbError> {
        let mut rows = self
            .conn
            .query(
                queries::ACTIVE_RULES_FOR_TASK,
                params![task_id.to_string(), level.numeric() as i64, country.to_string()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let task_id: Option<String> = row.get(3)?;
            let level: Option<i64> = row.get(4)?;
            out.push(PricingRule {
                id: Uuid::parse_str(&row.get::<String>(0)?)
                    .map_err(|e| DbError::Mapping(e.to_string()))?,
                name: row.get(1)?,
                rule_type: serde_json::from_str::<PricingRuleType>(&row.get::<String>(2)?)
                    .map_err(|e| DbError::Mapping(e.to_string()))?,
                task_id: task_id
                    .map(|s| Uuid::parse_str(&s))
                    .transpose()
                    .map_err(|e| DbError::Mapping(e.to_string()))?,
                level: level.and_then(|n| Level::from_numeric(n as u8)),
                country: row.get(5)?,
                multiplier_max: parse_decimal("multiplier_max", &row.get::<String>(6)?)?,
                description: row.get(7)?,
                active: row.get::<i64>(8)? != 0,
            });
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn commission_schedule(
        &self,
        level: Level,
        country: &str,
    ) -> Result<Option<CommissionSchedule>, DbError> {
        let mut rows = self
            .conn
            .query(
                queries::COMMISSION_SCHEDULE,
                params![level.numeric() as i64, country.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(CommissionSchedule {
                level,
                country: row.get(1)?,
                min: parse_decimal("min_rate", &row.get::<String>(2)?)?,
                max: parse_decimal("max_rate", &row.get::<String>(3)?)?,
                default: parse_decimal("default_rate", &row.get::<String>(4)?)?,
            })),
            None => Ok(None),
        }
    }

    /// Append-only per spec §3: there is no update or delete path for this
    /// table, intentionally.
    #[instrument(skip(self, event))]
    pub async fn insert_event(&self, event: &PricingEvent) -> Result<(), DbError> {
        let rules_json = serde_json::to_string(&event.rules_applied)
            .map_err(|e| DbError::Mapping(e.to_string()))?;
        self.conn
            .execute(
                queries::INSERT_EVENT,
                params![
                    event.id.to_string(),
                    event.job_id.to_string(),
                    event.event_type.clone(),
                    event.base_price_cents,
                    event.multiplier_applied.to_string(),
                    event.adjustments_cents,
                    event.final_price_cents,
                    rules_json,
                    event.commission_rate.to_string(),
                    event.commission_cents,
                    event.provider_payout_cents,
                    event.created_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }
}
