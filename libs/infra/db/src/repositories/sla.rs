//! SLA catalog reads (spec §3, §4.A). Write paths (provisioning new profiles)
//! are out of scope for this service — the catalog is maintained by an
//! out-of-band admin tool, as §4.A describes it as "read-mostly reference
//! data".

use dispatch_domain_models::{Level, RegionType, SlaProfile};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::mapping::{parse_opt_date, parse_uuid};

mod queries {
    /// §4.A step 1: "filter active profiles... matching level, matching
    /// country" — task/region/effective-date ranking happens in
    /// `dispatch_domain_models::find_sla` once candidates are in memory.
    pub const CANDIDATES: &str = r#"
        SELECT * FROM sla_profiles
        WHERE active = 1 AND level = ? AND country = ? AND (task_id = ? OR task_id IS NULL)
    "#;
}

pub struct SlaProfileRepository {
    conn: Connection,
}

impl SlaProfileRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self))]
    pub async fn candidates(
        &self,
        level: Level,
        country: &str,
        task_id: Uuid,
    ) -> Result<Vec<SlaProfile>, DbError> {
        let mut rows = self
            .conn
            .query(
                queries::CANDIDATES,
                params![level.numeric() as i64, country.to_string(), task_id.to_string()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            let task_id: Option<String> = row.get(5)?;
            out.push(SlaProfile {
                id: parse_uuid("id", &row.get::<String>(0)?)?,
                level: Level::from_numeric(row.get::<i64>(1)? as u8)
                    .ok_or_else(|| DbError::Mapping("invalid level".into()))?,
                region_type: serde_json::from_str::<RegionType>(&row.get::<String>(2)?)
                    .map_err(|e| DbError::Mapping(e.to_string()))?,
                region_value: row.get(3)?,
                country: row.get(4)?,
                task_id: task_id.map(|s| parse_uuid("task_id", &s)).transpose()?,
                response_time_min: row.get::<i64>(6)? as i32,
                arrival_time_min: row.get::<Option<i64>>(7)?.map(|n| n as i32),
                completion_time_min: row.get::<Option<i64>>(8)?.map(|n| n as i32),
                penalty_enabled: row.get::<i64>(9)? != 0,
                penalty_per_min_cents: row.get(10)?,
                penalty_cap_cents: row.get(11)?,
                effective_from: parse_opt_date("effective_from", row.get::<Option<String>>(12)?)?
                    .ok_or_else(|| DbError::Mapping("effective_from missing".into()))?,
                effective_until: parse_opt_date("effective_until", row.get::<Option<String>>(13)?)?,
                priority_order: row.get::<i64>(14)? as i32,
                active: row.get::<i64>(15)? != 0,
            });
        }
        Ok(out)
    }
}
