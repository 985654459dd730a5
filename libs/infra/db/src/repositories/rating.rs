//! Rating capture for `rate_job` (spec §6). Append-only: a job is rated
//! once, by the customer, after completion.

use dispatch_domain_models::Rating;
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::mapping::rating_from_row;

mod queries {
    pub const INSERT: &str = r#"
        INSERT INTO ratings (id, job_id, stars, feedback, created_at)
        VALUES (?, ?, ?, ?, ?)
    "#;

    pub const FOR_JOB: &str = "SELECT * FROM ratings WHERE job_id = ?";
}

pub struct RatingRepository {
    conn: Connection,
}

impl RatingRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, rating))]
    pub async fn insert(&self, rating: &Rating) -> Result<(), DbError> {
        self.conn
            .execute(
                queries::INSERT,
                params![
                    rating.id.to_string(),
                    rating.job_id.to_string(),
                    rating.stars as i64,
                    rating.feedback.clone(),
                    rating.created_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn for_job(&self, job_id: Uuid) -> Result<Option<Rating>, DbError> {
        let mut rows = self
            .conn
            .query(queries::FOR_JOB, params![job_id.to_string()])
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(rating_from_row(&row)?)),
            None => Ok(None),
        }
    }
}
