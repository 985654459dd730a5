//! Append-only scoring-ledger audit trail (spec §4.J).

use dispatch_domain_models::{PenaltyRecord, PenaltyType};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::mapping::{parse_dt, parse_uuid};

mod queries {
    pub const INSERT: &str = r#"
        INSERT INTO penalty_records (id, provider_id, penalty_type, points_deducted, applied_at, job_id, reason)
        VALUES (?, ?, ?, ?, ?, ?, ?)
    "#;

    pub const MOST_RECENT_FOR_PROVIDER: &str =
        "SELECT * FROM penalty_records WHERE provider_id = ? ORDER BY applied_at DESC LIMIT 1";
}

pub struct PenaltyRepository {
    conn: Connection,
}

impl PenaltyRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, record))]
    pub async fn insert(&self, record: &PenaltyRecord) -> Result<(), DbError> {
        self.conn
            .execute(
                queries::INSERT,
                params![
                    record.id.to_string(),
                    record.provider_id.to_string(),
                    serde_json::to_string(&record.penalty_type).unwrap(),
                    record.points_deducted,
                    record.applied_at.to_rfc3339(),
                    record.job_id.map(|id| id.to_string()),
                    record.reason.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn most_recent_for(&self, provider_id: Uuid) -> Result<Option<PenaltyRecord>, DbError> {
        let mut rows = self
            .conn
            .query(queries::MOST_RECENT_FOR_PROVIDER, params![provider_id.to_string()])
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let job_id: Option<String> = row.get(5)?;
        Ok(Some(PenaltyRecord {
            id: parse_uuid("id", &row.get::<String>(0)?)?,
            provider_id: parse_uuid("provider_id", &row.get::<String>(1)?)?,
            penalty_type: serde_json::from_str::<PenaltyType>(&row.get::<String>(2)?)
                .map_err(|e| DbError::Mapping(e.to_string()))?,
            points_deducted: row.get(3)?,
            applied_at: parse_dt("applied_at", &row.get::<String>(4)?)?,
            job_id: job_id
                .map(|s| parse_uuid("job_id", &s))
                .transpose()?,
            reason: row.get(6)?,
        }))
    }
}
