//! Provider profile and verification-record persistence.

use chrono::Utc;
use dispatch_domain_models::{
    Credential, CredentialStatus, InsurancePolicy, OnCallShift, ProviderProfile, ProviderStatus,
};
use libsql::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use crate::errors::DbError;
use crate::mapping::{credential_from_row, insurance_from_row, on_call_shift_from_row, provider_from_row};

mod queries {
    pub const GET_BY_ID: &str = "SELECT * FROM provider_profiles WHERE id = ?";
    pub const LIST_ALL: &str = "SELECT * FROM provider_profiles";
    pub const CREDENTIALS_FOR_PROVIDER: &str = "SELECT * FROM credentials WHERE provider_id = ?";
    pub const INSURANCE_FOR_PROVIDER: &str = "SELECT * FROM insurance_policies WHERE provider_id = ?";
    pub const ON_CALL_FOR_PROVIDER: &str = "SELECT * FROM on_call_shifts WHERE provider_id = ?";
    pub const IS_TASK_QUALIFIED: &str =
        "SELECT qualified FROM task_qualifications WHERE provider_id = ? AND task_id = ?";
    pub const UPDATE_SCORE: &str =
        "UPDATE provider_profiles SET internal_score = ?, status = ?, updated_at = ? WHERE id = ?";
    pub const SET_ONLINE: &str = "UPDATE provider_profiles SET is_online = ?, updated_at = ? WHERE id = ?";
    /// Records that this provider has asked to be considered for `task_id`
    /// without granting qualification — an admin still has to approve the
    /// backing credential before `qualify()` will pass them.
    pub const REQUEST_TASK_QUALIFICATION: &str = r#"
        INSERT INTO task_qualifications (provider_id, task_id, qualified, auto_granted)
        VALUES (?, ?, 0, 0)
        ON CONFLICT (provider_id, task_id) DO NOTHING
    "#;

    pub const INSERT_CREDENTIAL: &str = r#"
        INSERT INTO credentials (id, provider_id, credential_type, name, status, issued_date, expiry_date, jurisdiction)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
    "#;
    pub const SET_CREDENTIAL_STATUS: &str = "UPDATE credentials SET status = ? WHERE id = ?";
}

pub struct ProviderRepository {
    conn: Connection,
}

impl ProviderRepository {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ProviderProfile, DbError> {
        let mut rows = self
            .conn
            .query(queries::GET_BY_ID, params![id.to_string()])
            .await?;
        let row = rows.next().await?.ok_or(DbError::ProviderNotFound)?;
        provider_from_row(&row)
    }

    /// Every provider row; callers filter by status in Rust since the
    /// column stores a JSON-encoded enum rather than a bare SQL literal.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<ProviderProfile>, DbError> {
        let mut rows = self.conn.query(queries::LIST_ALL, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(provider_from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn credentials_for(&self, provider_id: Uuid) -> Result<Vec<Credential>, DbError> {
        let mut rows = self
            .conn
            .query(queries::CREDENTIALS_FOR_PROVIDER, params![provider_id.to_string()])
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(credential_from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn insurance_for(&self, provider_id: Uuid) -> Result<Vec<InsurancePolicy>, DbError> {
        let mut rows = self
            .conn
            .query(queries::INSURANCE_FOR_PROVIDER, params![provider_id.to_string()])
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(insurance_from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn on_call_shifts_for(&self, provider_id: Uuid) -> Result<Vec<OnCallShift>, DbError> {
        let mut rows = self
            .conn
            .query(queries::ON_CALL_FOR_PROVIDER, params![provider_id.to_string()])
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(on_call_shift_from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn is_task_qualified(&self, provider_id: Uuid, task_id: Uuid) -> Result<bool, DbError> {
        let mut rows = self
            .conn
            .query(
                queries::IS_TASK_QUALIFIED,
                params![provider_id.to_string(), task_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? != 0),
            None => Ok(false),
        }
    }

    /// Persists the outcome of a scoring ledger operation (spec §4.J): the
    /// new score and, when the ledger clamped to the floor, the suspension.
    #[instrument(skip(self))]
    pub async fn update_score(
        &self,
        provider_id: Uuid,
        new_score: f64,
        status: ProviderStatus,
    ) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                queries::UPDATE_SCORE,
                params![
                    new_score,
                    serde_json::to_string(&status).unwrap(),
                    Utc::now().to_rfc3339(),
                    provider_id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::ProviderNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_online(&self, provider_id: Uuid, online: bool) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                queries::SET_ONLINE,
                params![online as i64, Utc::now().to_rfc3339(), provider_id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::ProviderNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn request_task_qualification(&self, provider_id: Uuid, task_id: Uuid) -> Result<(), DbError> {
        self.conn
            .execute(
                queries::REQUEST_TASK_QUALIFICATION,
                params![provider_id.to_string(), task_id.to_string()],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self, credential))]
    pub async fn insert_credential(&self, credential: &Credential) -> Result<(), DbError> {
        self.conn
            .execute(
                queries::INSERT_CREDENTIAL,
                params![
                    credential.id.to_string(),
                    credential.provider_id.to_string(),
                    serde_json::to_string(&credential.credential_type).unwrap(),
                    credential.name.clone(),
                    serde_json::to_string(&credential.status).unwrap(),
                    credential.issued_date.map(|d| d.to_string()),
                    credential.expiry_date.map(|d| d.to_string()),
                    credential.jurisdiction.clone(),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_credential_status(&self, credential_id: Uuid, status: CredentialStatus) -> Result<(), DbError> {
        let affected = self
            .conn
            .execute(
                queries::SET_CREDENTIAL_STATUS,
                params![serde_json::to_string(&status).unwrap(), credential_id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(DbError::CredentialNotFound);
        }
        Ok(())
    }
}
