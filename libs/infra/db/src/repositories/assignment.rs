//! Assignment persistence, including the conditional update that backs
//! first-acceptance-wins at the database layer.

use chrono::Utc;
use dispatch_domain_models::{Assignment, AssignmentStatus};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::mapping::assignment_from_row;

mod queries {
    pub const INSERT: &str = r#"
        INSERT INTO assignments (
            id, job_id, provider_id, status, offered_at, offer_expires_at,
            responded_at, decline_reason, sla_response_deadline,
            sla_arrival_deadline, sla_completion_deadline, sla_response_met,
            sla_arrival_met, sla_completion_met, en_route_at, arrived_at,
            started_work_at, completed_at, match_score
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    "#;

    pub const LIST_FOR_JOB: &str = "SELECT * FROM assignments WHERE job_id = ?";

    pub const GET_BY_ID: &str = "SELECT * FROM assignments WHERE id = ?";

    pub const LIST_OFFERED_FOR_PROVIDER: &str = r#"
        SELECT * FROM assignments WHERE provider_id = ? AND status = ?
        ORDER BY offered_at DESC
    "#;

    /// Accepted assignments not yet completed — the pool the SLA-warning
    /// scanner polls for arrival/completion deadlines coming due.
    pub const LIST_ACTIVE_WITH_DEADLINES: &str = r#"
        SELECT * FROM assignments WHERE status = ? AND completed_at IS NULL
    "#;

    /// Only one writer's `status = 'offered'` guard can match; every other
    /// concurrent caller sees zero rows affected.
    pub const COMPARE_AND_SET_STATUS: &str = r#"
        UPDATE assignments SET status = ?, responded_at = ?, decline_reason = ?
        WHERE id = ? AND status = ?
    "#;

    /// `RETURNING *` hands back the rows that actually flipped so the
    /// sweeper can penalize the providers who missed their response window.
    pub const EXPIRE_OVERDUE_OFFERS: &str = r#"
        UPDATE assignments SET status = ?
        WHERE status = ? AND offer_expires_at < ?
        RETURNING *
    "#;

    /// Unconditional write for transitions the caller already resolved
    /// in-memory (cancellation, reassignment) rather than a race the
    /// database needs to arbitrate.
    pub const SET_STATUS: &str = r#"
        UPDATE assignments SET status = ?, responded_at = ?, decline_reason = ?
        WHERE id = ?
    "#;

    /// §4.H: the completion deadline is only derived once the provider is
    /// en route, not at acceptance.
    pub const RECORD_EN_ROUTE: &str =
        "UPDATE assignments SET en_route_at = ?, sla_completion_deadline = ? WHERE id = ?";

    pub const RECORD_ARRIVAL: &str = "UPDATE assignments SET arrived_at = ?, sla_arrival_met = ? WHERE id = ?";

    pub const RECORD_STARTED: &str = "UPDATE assignments SET started_work_at = ? WHERE id = ?";

    pub const RECORD_COMPLETED: &str = "UPDATE assignments SET completed_at = ?, sla_completion_met = ? WHERE id = ?";
}

pub struct AssignmentRepository {
    conn: Connection,
}

impl AssignmentRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, assignment))]
    pub async fn insert(&self, assignment: &Assignment) -> Result<(), DbError> {
        self.conn
            .execute(
                queries::INSERT,
                params![
                    assignment.id.to_string(),
                    assignment.job_id.to_string(),
                    assignment.provider_id.to_string(),
                    serde_json::to_string(&assignment.status).unwrap(),
                    assignment.offered_at.to_rfc3339(),
                    assignment.offer_expires_at.to_rfc3339(),
                    assignment.responded_at.map(|t| t.to_rfc3339()),
                    assignment.decline_reason.clone(),
                    assignment.sla_response_deadline.to_rfc3339(),
                    assignment.sla_arrival_deadline.map(|t| t.to_rfc3339()),
                    assignment.sla_completion_deadline.map(|t| t.to_rfc3339()),
                    assignment.sla_response_met.map(|b| b as i64),
                    assignment.sla_arrival_met.map(|b| b as i64),
                    assignment.sla_completion_met.map(|b| b as i64),
                    assignment.en_route_at.map(|t| t.to_rfc3339()),
                    assignment.arrived_at.map(|t| t.to_rfc3339()),
                    assignment.started_work_at.map(|t| t.to_rfc3339()),
                    assignment.completed_at.map(|t| t.to_rfc3339()),
                    assignment.match_score,
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<Assignment>, DbError> {
        let mut rows = self
            .conn
            .query(queries::LIST_FOR_JOB, params![job_id.to_string()])
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(assignment_from_row(&row)?);
        }
        Ok(out)
    }

    /// All offers currently awaiting this provider's response (spec §6
    /// `list_pending_offers`).
    #[instrument(skip(self))]
    pub async fn list_offered_for_provider(&self, provider_id: Uuid) -> Result<Vec<Assignment>, DbError> {
        let mut rows = self
            .conn
            .query(
                queries::LIST_OFFERED_FOR_PROVIDER,
                params![provider_id.to_string(), serde_json::to_string(&AssignmentStatus::Offered).unwrap()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(assignment_from_row(&row)?);
        }
        Ok(out)
    }

    /// See `queries::LIST_ACTIVE_WITH_DEADLINES` — backs the SLA-warning
    /// scanner (spec §4.H/§5).
    #[instrument(skip(self))]
    pub async fn list_active_with_deadlines(&self) -> Result<Vec<Assignment>, DbError> {
        let mut rows = self
            .conn
            .query(
                queries::LIST_ACTIVE_WITH_DEADLINES,
                params![serde_json::to_string(&AssignmentStatus::Accepted).unwrap()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(assignment_from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Assignment, DbError> {
        let mut rows = self
            .conn
            .query(queries::GET_BY_ID, params![id.to_string()])
            .await?;
        let row = rows.next().await?.ok_or(DbError::AssignmentNotFound)?;
        assignment_from_row(&row)
    }

    /// Succeeds only if the assignment was still `offered`; returns `false`
    /// when a concurrent accept/decline/expiry already claimed it.
    #[instrument(skip(self))]
    pub async fn compare_and_set_status(
        &self,
        id: Uuid,
        to: AssignmentStatus,
        decline_reason: Option<String>,
    ) -> Result<bool, DbError> {
        let affected = self
            .conn
            .execute(
                queries::COMPARE_AND_SET_STATUS,
                params![
                    serde_json::to_string(&to).unwrap(),
                    Utc::now().to_rfc3339(),
                    decline_reason,
                    id.to_string(),
                    serde_json::to_string(&AssignmentStatus::Offered).unwrap(),
                ],
            )
            .await?;
        Ok(affected > 0)
    }

    /// Writes a status already decided outside a first-acceptance-wins race
    /// (customer cancellation, admin reassignment) unconditionally.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: Uuid,
        status: AssignmentStatus,
        reason: Option<String>,
    ) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                queries::SET_STATUS,
                params![
                    serde_json::to_string(&status).unwrap(),
                    Utc::now().to_rfc3339(),
                    reason,
                    id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::AssignmentNotFound);
        }
        Ok(())
    }

    /// Stamps `en_route_at` and, when the snapshot carries a completion
    /// window, derives `sla_completion_deadline` from it (§4.H).
    #[instrument(skip(self))]
    pub async fn record_en_route(
        &self,
        id: Uuid,
        en_route_at: chrono::DateTime<Utc>,
        sla_completion_deadline: Option<chrono::DateTime<Utc>>,
    ) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                queries::RECORD_EN_ROUTE,
                params![
                    en_route_at.to_rfc3339(),
                    sla_completion_deadline.map(|t| t.to_rfc3339()),
                    id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::AssignmentNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn record_arrival(
        &self,
        id: Uuid,
        arrived_at: chrono::DateTime<Utc>,
        sla_arrival_met: Option<bool>,
    ) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                queries::RECORD_ARRIVAL,
                params![arrived_at.to_rfc3339(), sla_arrival_met.map(|b| b as i64), id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::AssignmentNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn record_started(&self, id: Uuid, started_work_at: chrono::DateTime<Utc>) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(queries::RECORD_STARTED, params![started_work_at.to_rfc3339(), id.to_string()])
            .await?;
        if affected == 0 {
            return Err(DbError::AssignmentNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn record_completed(
        &self,
        id: Uuid,
        completed_at: chrono::DateTime<Utc>,
        sla_completion_met: Option<bool>,
    ) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                queries::RECORD_COMPLETED,
                params![completed_at.to_rfc3339(), sla_completion_met.map(|b| b as i64), id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::AssignmentNotFound);
        }
        Ok(())
    }

    /// Returns the assignments that were flipped, so the caller can
    /// penalize the providers who let the offer lapse (spec §4.J
    /// `response_timeout`).
    #[instrument(skip(self))]
    pub async fn expire_overdue_offers(&self) -> Result<Vec<Assignment>, DbError> {
        let mut rows = self
            .conn
            .query(
                queries::EXPIRE_OVERDUE_OFFERS,
                params![
                    serde_json::to_string(&AssignmentStatus::Expired).unwrap(),
                    serde_json::to_string(&AssignmentStatus::Offered).unwrap(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(assignment_from_row(&row)?);
        }
        Ok(out)
    }
}
