//! Closed service-task catalog reads. The catalog is seeded out of band
//! (admin tooling, migrations); this repository only ever reads it.

use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::mapping::task_from_row;

mod queries {
    pub const GET_BY_ID: &str = "SELECT * FROM tasks WHERE id = ?";
    pub const GET_BY_SLUG: &str = "SELECT * FROM tasks WHERE slug = ?";
}

pub struct TaskRepository {
    conn: Connection,
}

impl TaskRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<dispatch_domain_models::Task, DbError> {
        let mut rows = self
            .conn
            .query(queries::GET_BY_ID, params![id.to_string()])
            .await?;
        let row = rows.next().await?.ok_or(DbError::TaskNotFound)?;
        task_from_row(&row)
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<dispatch_domain_models::Task, DbError> {
        let mut rows = self
            .conn
            .query(queries::GET_BY_SLUG, params![slug.to_string()])
            .await?;
        let row = rows.next().await?.ok_or(DbError::TaskNotFound)?;
        task_from_row(&row)
    }
}
