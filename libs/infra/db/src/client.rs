//! Connection bootstrap: detects a remote, local-file, or in-memory URL and
//! brings the schema up before handing out connections.

use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{info, instrument};

use crate::errors::DbError;
use crate::schema::apply_schema;

#[derive(Clone)]
pub struct DbClient {
    database: Arc<Database>,
    /// Keeps an in-memory database alive; SQLite drops `:memory:` data the
    /// moment its last connection closes.
    _memory_anchor: Option<Arc<Connection>>,
}

impl DbClient {
    #[instrument(skip(auth_token))]
    pub async fn connect(url: &str, auth_token: Option<String>) -> Result<Self, DbError> {
        if url.is_empty() {
            return Err(DbError::Configuration("DATABASE_URL is unset".into()));
        }

        let is_remote = url.starts_with("libsql://") || url.starts_with("https://");
        let is_memory = url.contains(":memory:") || url.contains("mode=memory");

        info!(url, is_remote, is_memory, "connecting to database");

        let database = if is_remote {
            let token = auth_token
                .ok_or_else(|| DbError::Configuration("remote URL given without an auth token".into()))?;
            Builder::new_remote(url.to_string(), token).build().await
        } else {
            Builder::new_local(url).build().await
        }
        .map_err(|e| DbError::Connection(e.to_string()))?;

        let database = Arc::new(database);

        let anchor = if is_memory {
            let conn = database
                .connect()
                .map_err(|e| DbError::Connection(e.to_string()))?;
            apply_schema(&conn)
                .await
                .map_err(|e| DbError::Connection(e.to_string()))?;
            Some(Arc::new(conn))
        } else {
            let conn = database
                .connect()
                .map_err(|e| DbError::Connection(e.to_string()))?;
            apply_schema(&conn)
                .await
                .map_err(|e| DbError::Connection(e.to_string()))?;
            None
        };

        Ok(Self {
            database,
            _memory_anchor: anchor,
        })
    }

    pub fn get_connection(&self) -> Result<Connection, DbError> {
        self.database
            .connect()
            .map_err(|e| DbError::Connection(e.to_string()))
    }
}
