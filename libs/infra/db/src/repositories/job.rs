//! Job aggregate persistence.

use chrono::Utc;
use dispatch_domain_models::{Job, JobStatus};
use libsql::{params, Connection};
use tracing::instrument;

use crate::errors::DbError;
use crate::mapping::{job_from_row, serialize_job_json_columns};

mod queries {
    pub const INSERT: &str = r#"
        INSERT INTO jobs (
            id, reference, customer_id, task_id, status, priority, is_emergency,
            service_lat, service_lng, service_address, requested_date,
            requested_time_start, requested_time_end, flexible_schedule,
            sla_snapshot, quoted_price_cents, commission_rate, commission_cents,
            provider_payout_cents, currency, customer_notes, started_at,
            completed_at, cancelled_at, cancellation_reason, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    "#;

    pub const GET_BY_ID: &str = "SELECT * FROM jobs WHERE id = ?";

    pub const LIST_ACTIVE_FOR_CUSTOMER: &str = r#"
        SELECT * FROM jobs
        WHERE customer_id = ?
          AND status NOT IN (?, ?, ?, ?, ?)
        ORDER BY created_at DESC
        LIMIT ?
    "#;

    pub const UPDATE_STATUS: &str = r#"
        UPDATE jobs SET
            status = ?, started_at = ?, completed_at = ?, cancelled_at = ?,
            cancellation_reason = ?, updated_at = ?
        WHERE id = ?
    "#;
}

pub struct JobRepository {
    conn: Connection,
}

impl JobRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, job))]
    pub async fn insert(&self, job: &Job) -> Result<(), DbError> {
        let cols = serialize_job_json_columns(job)?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                queries::INSERT,
                params![
                    job.id.to_string(),
                    job.reference.clone(),
                    job.customer_id.to_string(),
                    job.task_id.to_string(),
                    serde_json::to_string(&job.status).unwrap(),
                    serde_json::to_string(&job.priority).unwrap(),
                    job.is_emergency as i64,
                    job.service_lat,
                    job.service_lng,
                    cols.service_address,
                    job.requested_date.map(|d| d.to_string()),
                    job.requested_time_start.map(|t| t.to_string()),
                    job.requested_time_end.map(|t| t.to_string()),
                    job.flexible_schedule as i64,
                    cols.sla_snapshot,
                    job.quoted_price_cents,
                    job.commission_rate.to_string(),
                    job.commission_cents,
                    job.provider_payout_cents,
                    job.currency.clone(),
                    cols.customer_notes,
                    job.started_at.map(|t| t.to_rfc3339()),
                    job.completed_at.map(|t| t.to_rfc3339()),
                    job.cancelled_at.map(|t| t.to_rfc3339()),
                    job.cancellation_reason.clone(),
                    now.clone(),
                    now,
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: uuid::Uuid) -> Result<Job, DbError> {
        let mut rows = self
            .conn
            .query(queries::GET_BY_ID, params![id.to_string()])
            .await?;
        let row = rows.next().await?.ok_or(DbError::JobNotFound)?;
        job_from_row(&row)
    }

    #[instrument(skip(self, job))]
    pub async fn save_transition(&self, job: &Job) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                queries::UPDATE_STATUS,
                params![
                    serde_json::to_string(&job.status).unwrap(),
                    job.started_at.map(|t| t.to_rfc3339()),
                    job.completed_at.map(|t| t.to_rfc3339()),
                    job.cancelled_at.map(|t| t.to_rfc3339()),
                    job.cancellation_reason.clone(),
                    Utc::now().to_rfc3339(),
                    job.id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::JobNotFound);
        }
        Ok(())
    }

    /// All of this customer's jobs not yet in a terminal status (spec §6
    /// `list_active_jobs`), most recent first, bounded by `limit`.
    #[instrument(skip(self))]
    pub async fn list_active_for_customer(&self, customer_id: uuid::Uuid, limit: u32) -> Result<Vec<Job>, DbError> {
        let mut rows = self
            .conn
            .query(
                queries::LIST_ACTIVE_FOR_CUSTOMER,
                params![
                    customer_id.to_string(),
                    serde_json::to_string(&JobStatus::Completed).unwrap(),
                    serde_json::to_string(&JobStatus::CancelledByCustomer).unwrap(),
                    serde_json::to_string(&JobStatus::CancelledByProvider).unwrap(),
                    serde_json::to_string(&JobStatus::CancelledBySystem).unwrap(),
                    serde_json::to_string(&JobStatus::Refunded).unwrap(),
                    limit as i64,
                ],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(job_from_row(&row)?);
        }
        Ok(out)
    }

    /// Only succeeds while the job is still in `from`; used to detect a
    /// concurrent writer that already moved the job elsewhere.
    #[instrument(skip(self))]
    pub async fn compare_and_set_status(
        &self,
        id: uuid::Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<bool, DbError> {
        let affected = self
            .conn
            .execute(
                "UPDATE jobs SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
                params![
                    serde_json::to_string(&to).unwrap(),
                    Utc::now().to_rfc3339(),
                    id.to_string(),
                    serde_json::to_string(&from).unwrap(),
                ],
            )
            .await?;
        Ok(affected > 0)
    }
}
