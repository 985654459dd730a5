//! Persistence error taxonomy, isolated from the domain's [`CoreError`] so
//! the domain crates never learn of libSQL.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("missing or invalid database configuration: {0}")]
    Configuration(String),

    #[error(transparent)]
    Query(#[from] libsql::Error),

    #[error("could not map row to domain type: {0}")]
    Mapping(String),

    #[error("transaction could not be committed")]
    TransactionFailed,

    #[error("job not found")]
    JobNotFound,

    #[error("assignment not found")]
    AssignmentNotFound,

    #[error("provider not found")]
    ProviderNotFound,

    #[error("task not found")]
    TaskNotFound,

    #[error("credential not found")]
    CredentialNotFound,
}
