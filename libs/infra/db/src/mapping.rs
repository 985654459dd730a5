//! Row <-> domain type conversions shared by the repositories. Centralized
//! here since every repository hits the same "SQLite only has TEXT/INTEGER/
//! REAL" wall for enums, UUIDs, timestamps, and decimals.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dispatch_domain_models::{
    Assignment, AssignmentStatus, BackgroundCheck, BackgroundCheckStatus, Credential,
    CredentialStatus, CredentialType, CustomerNote, InsurancePolicy, InsuranceStatus, Job,
    JobStatus, Level, OnCallShift, OnCallShiftStatus, Priority, ProviderProfile, ProviderStatus,
    Rating, ServiceAddress, SlaSnapshot, Task,
};
use libsql::Row;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::DbError;

fn map_err(field: &str, err: impl std::fmt::Display) -> DbError {
    DbError::Mapping(format!("column `{field}`: {err}"))
}

pub fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| map_err(field, e))
}

pub fn parse_dt(field: &str, raw: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| map_err(field, e))
}

pub fn parse_opt_dt(field: &str, raw: Option<String>) -> Result<Option<DateTime<Utc>>, DbError> {
    raw.map(|s| parse_dt(field, &s)).transpose()
}

pub fn parse_opt_date(field: &str, raw: Option<String>) -> Result<Option<NaiveDate>, DbError> {
    raw.map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| map_err(field, e)))
        .transpose()
}

pub fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, DbError> {
    Decimal::from_str(raw).map_err(|e| map_err(field, e))
}

pub(crate) struct JobJsonColumns {
    pub service_address: String,
    pub sla_snapshot: String,
    pub customer_notes: String,
}

pub(crate) fn serialize_job_json_columns(job: &Job) -> Result<JobJsonColumns, DbError> {
    Ok(JobJsonColumns {
        service_address: serde_json::to_string(&job.service_address)
            .map_err(|e| map_err("service_address", e))?,
        sla_snapshot: serde_json::to_string(&job.sla_snapshot)
            .map_err(|e| map_err("sla_snapshot", e))?,
        customer_notes: serde_json::to_string(&job.customer_notes)
            .map_err(|e| map_err("customer_notes", e))?,
    })
}

/// Maps a `SELECT *` row from `jobs` back into a [`Job`]. Column order
/// mirrors the `CREATE TABLE` statement in `schema.rs` exactly.
pub fn job_from_row(row: &Row) -> Result<Job, DbError> {
    let service_address: String = row.get(9).map_err(|e| map_err("service_address", e))?;
    let sla_snapshot: String = row.get(14).map_err(|e| map_err("sla_snapshot", e))?;
    let customer_notes: String = row.get(20).map_err(|e| map_err("customer_notes", e))?;

    let requested_date: Option<String> = row.get(10).map_err(|e| map_err("requested_date", e))?;
    let requested_time_start: Option<String> =
        row.get(11).map_err(|e| map_err("requested_time_start", e))?;
    let requested_time_end: Option<String> =
        row.get(12).map_err(|e| map_err("requested_time_end", e))?;

    Ok(Job {
        id: parse_uuid("id", &row.get::<String>(0).map_err(|e| map_err("id", e))?)?,
        reference: row.get(1).map_err(|e| map_err("reference", e))?,
        customer_id: parse_uuid(
            "customer_id",
            &row.get::<String>(2).map_err(|e| map_err("customer_id", e))?,
        )?,
        task_id: parse_uuid("task_id", &row.get::<String>(3).map_err(|e| map_err("task_id", e))?)?,
        status: serde_json::from_str::<JobStatus>(&row.get::<String>(4).map_err(|e| map_err("status", e))?)
            .map_err(|e| map_err("status", e))?,
        priority: serde_json::from_str::<Priority>(
            &row.get::<String>(5).map_err(|e| map_err("priority", e))?,
        )
        .map_err(|e| map_err("priority", e))?,
        is_emergency: row.get::<i64>(6).map_err(|e| map_err("is_emergency", e))? != 0,
        service_lat: row.get(7).map_err(|e| map_err("service_lat", e))?,
        service_lng: row.get(8).map_err(|e| map_err("service_lng", e))?,
        service_address: serde_json::from_str::<ServiceAddress>(&service_address)
            .map_err(|e| map_err("service_address", e))?,
        requested_date: requested_date
            .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| map_err("requested_date", e))?,
        requested_time_start: requested_time_start
            .map(|s| NaiveTime::parse_from_str(&s, "%H:%M:%S%.f"))
            .transpose()
            .map_err(|e| map_err("requested_time_start", e))?,
        requested_time_end: requested_time_end
            .map(|s| NaiveTime::parse_from_str(&s, "%H:%M:%S%.f"))
            .transpose()
            .map_err(|e| map_err("requested_time_end", e))?,
        flexible_schedule: row.get::<i64>(13).map_err(|e| map_err("flexible_schedule", e))? != 0,
        sla_snapshot: serde_json::from_str::<SlaSnapshot>(&sla_snapshot)
            .map_err(|e| map_err("sla_snapshot", e))?,
        quoted_price_cents: row.get(15).map_err(|e| map_err("quoted_price_cents", e))?,
        commission_rate: parse_decimal(
            "commission_rate",
            &row.get::<String>(16).map_err(|e| map_err("commission_rate", e))?,
        )?,
        commission_cents: row.get(17).map_err(|e| map_err("commission_cents", e))?,
        provider_payout_cents: row.get(18).map_err(|e| map_err("provider_payout_cents", e))?,
        currency: row.get(19).map_err(|e| map_err("currency", e))?,
        customer_notes: serde_json::from_str::<Vec<CustomerNote>>(&customer_notes)
            .map_err(|e| map_err("customer_notes", e))?,
        started_at: parse_opt_dt("started_at", row.get(21).map_err(|e| map_err("started_at", e))?)?,
        completed_at: parse_opt_dt(
            "completed_at",
            row.get(22).map_err(|e| map_err("completed_at", e))?,
        )?,
        cancelled_at: parse_opt_dt(
            "cancelled_at",
            row.get(23).map_err(|e| map_err("cancelled_at", e))?,
        )?,
        cancellation_reason: row
            .get(24)
            .map_err(|e| map_err("cancellation_reason", e))?,
    })
}

/// Maps a `SELECT *` row from `assignments`, column order mirroring its
/// `CREATE TABLE` statement.
pub fn assignment_from_row(row: &Row) -> Result<Assignment, DbError> {
    let opt_bool = |idx: i32, field: &'static str| -> Result<Option<bool>, DbError> {
        let v: Option<i64> = row.get(idx).map_err(|e| map_err(field, e))?;
        Ok(v.map(|n| n != 0))
    };

    Ok(Assignment {
        id: parse_uuid("id", &row.get::<String>(0).map_err(|e| map_err("id", e))?)?,
        job_id: parse_uuid("job_id", &row.get::<String>(1).map_err(|e| map_err("job_id", e))?)?,
        provider_id: parse_uuid(
            "provider_id",
            &row.get::<String>(2).map_err(|e| map_err("provider_id", e))?,
        )?,
        status: serde_json::from_str::<AssignmentStatus>(
            &row.get::<String>(3).map_err(|e| map_err("status", e))?,
        )
        .map_err(|e| map_err("status", e))?,
        offered_at: parse_dt("offered_at", &row.get::<String>(4).map_err(|e| map_err("offered_at", e))?)?,
        offer_expires_at: parse_dt(
            "offer_expires_at",
            &row.get::<String>(5).map_err(|e| map_err("offer_expires_at", e))?,
        )?,
        responded_at: parse_opt_dt("responded_at", row.get(6).map_err(|e| map_err("responded_at", e))?)?,
        decline_reason: row.get(7).map_err(|e| map_err("decline_reason", e))?,
        sla_response_deadline: parse_dt(
            "sla_response_deadline",
            &row
                .get::<String>(8)
                .map_err(|e| map_err("sla_response_deadline", e))?,
        )?,
        sla_arrival_deadline: parse_opt_dt(
            "sla_arrival_deadline",
            row.get(9).map_err(|e| map_err("sla_arrival_deadline", e))?,
        )?,
        sla_completion_deadline: parse_opt_dt(
            "sla_completion_deadline",
            row.get(10).map_err(|e| map_err("sla_completion_deadline", e))?,
        )?,
        sla_response_met: opt_bool(11, "sla_response_met")?,
        sla_arrival_met: opt_bool(12, "sla_arrival_met")?,
        sla_completion_met: opt_bool(13, "sla_completion_met")?,
        en_route_at: parse_opt_dt("en_route_at", row.get(14).map_err(|e| map_err("en_route_at", e))?)?,
        arrived_at: parse_opt_dt("arrived_at", row.get(15).map_err(|e| map_err("arrived_at", e))?)?,
        started_work_at: parse_opt_dt(
            "started_work_at",
            row.get(16).map_err(|e| map_err("started_work_at", e))?,
        )?,
        completed_at: parse_opt_dt("completed_at", row.get(17).map_err(|e| map_err("completed_at", e))?)?,
        match_score: row.get(18).map_err(|e| map_err("match_score", e))?,
    })
}

fn parse_level(field: &str, raw: i64) -> Result<Level, DbError> {
    Level::from_numeric(raw as u8).ok_or_else(|| map_err(field, format!("unknown level {raw}")))
}

/// Maps a `SELECT *` row from `provider_profiles`.
pub fn provider_from_row(row: &Row) -> Result<ProviderProfile, DbError> {
    let bg_status: String = row
        .get(4)
        .map_err(|e| map_err("background_check_status", e))?;
    let bg_date: Option<String> = row
        .get(5)
        .map_err(|e| map_err("background_check_date", e))?;
    let bg_expiry: Option<String> = row
        .get(6)
        .map_err(|e| map_err("background_check_expiry", e))?;

    Ok(ProviderProfile {
        id: parse_uuid("id", &row.get::<String>(0).map_err(|e| map_err("id", e))?)?,
        user_id: parse_uuid("user_id", &row.get::<String>(1).map_err(|e| map_err("user_id", e))?)?,
        level: parse_level("level", row.get(2).map_err(|e| map_err("level", e))?)?,
        status: serde_json::from_str::<ProviderStatus>(
            &row.get::<String>(3).map_err(|e| map_err("status", e))?,
        )
        .map_err(|e| map_err("status", e))?,
        background_check: BackgroundCheck {
            status: serde_json::from_str::<BackgroundCheckStatus>(&bg_status)
                .map_err(|e| map_err("background_check_status", e))?,
            date: bg_date
                .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
                .transpose()
                .map_err(|e| map_err("background_check_date", e))?,
            expiry: bg_expiry
                .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
                .transpose()
                .map_err(|e| map_err("background_check_expiry", e))?,
        },
        internal_score: row.get(7).map_err(|e| map_err("internal_score", e))?,
        service_radius_km: row.get(8).map_err(|e| map_err("service_radius_km", e))?,
        home_lat: row.get(9).map_err(|e| map_err("home_lat", e))?,
        home_lng: row.get(10).map_err(|e| map_err("home_lng", e))?,
        max_concurrent_jobs: row
            .get(11)
            .map_err(|e| map_err("max_concurrent_jobs", e))?,
        available_for_emergency: row
            .get::<i64>(12)
            .map_err(|e| map_err("available_for_emergency", e))?
            != 0,
        is_online: row.get::<i64>(13).map_err(|e| map_err("is_online", e))? != 0,
    })
}

/// Maps a `SELECT *` row from `credentials`.
pub fn credential_from_row(row: &Row) -> Result<Credential, DbError> {
    Ok(Credential {
        id: parse_uuid("id", &row.get::<String>(0).map_err(|e| map_err("id", e))?)?,
        provider_id: parse_uuid(
            "provider_id",
            &row.get::<String>(1).map_err(|e| map_err("provider_id", e))?,
        )?,
        credential_type: serde_json::from_str::<CredentialType>(
            &row.get::<String>(2).map_err(|e| map_err("credential_type", e))?,
        )
        .map_err(|e| map_err("credential_type", e))?,
        name: row.get(3).map_err(|e| map_err("name", e))?,
        status: serde_json::from_str::<CredentialStatus>(
            &row.get::<String>(4).map_err(|e| map_err("status", e))?,
        )
        .map_err(|e| map_err("status", e))?,
        issued_date: row
            .get::<Option<String>>(5)
            .map_err(|e| map_err("issued_date", e))?
            .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| map_err("issued_date", e))?,
        expiry_date: row
            .get::<Option<String>>(6)
            .map_err(|e| map_err("expiry_date", e))?
            .map(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| map_err("expiry_date", e))?,
        jurisdiction: row.get(7).map_err(|e| map_err("jurisdiction", e))?,
    })
}

/// Maps a `SELECT *` row from `insurance_policies`.
pub fn insurance_from_row(row: &Row) -> Result<InsurancePolicy, DbError> {
    Ok(InsurancePolicy {
        id: parse_uuid("id", &row.get::<String>(0).map_err(|e| map_err("id", e))?)?,
        provider_id: parse_uuid(
            "provider_id",
            &row.get::<String>(1).map_err(|e| map_err("provider_id", e))?,
        )?,
        policy_type: row.get(2).map_err(|e| map_err("policy_type", e))?,
        coverage_cents: row.get(3).map_err(|e| map_err("coverage_cents", e))?,
        effective_date: NaiveDate::parse_from_str(
            &row.get::<String>(4).map_err(|e| map_err("effective_date", e))?,
            "%Y-%m-%d",
        )
        .map_err(|e| map_err("effective_date", e))?,
        expiry_date: NaiveDate::parse_from_str(
            &row.get::<String>(5).map_err(|e| map_err("expiry_date", e))?,
            "%Y-%m-%d",
        )
        .map_err(|e| map_err("expiry_date", e))?,
        status: serde_json::from_str::<InsuranceStatus>(
            &row.get::<String>(6).map_err(|e| map_err("status", e))?,
        )
        .map_err(|e| map_err("status", e))?,
    })
}

/// Maps a `SELECT *` row from `on_call_shifts`.
pub fn on_call_shift_from_row(row: &Row) -> Result<OnCallShift, DbError> {
    Ok(OnCallShift {
        id: parse_uuid("id", &row.get::<String>(0).map_err(|e| map_err("id", e))?)?,
        provider_id: parse_uuid(
            "provider_id",
            &row.get::<String>(1).map_err(|e| map_err("provider_id", e))?,
        )?,
        shift_start: parse_dt(
            "shift_start",
            &row.get::<String>(2).map_err(|e| map_err("shift_start", e))?,
        )?,
        shift_end: parse_dt(
            "shift_end",
            &row.get::<String>(3).map_err(|e| map_err("shift_end", e))?,
        )?,
        region_type: row.get(4).map_err(|e| map_err("region_type", e))?,
        region_value: row.get(5).map_err(|e| map_err("region_value", e))?,
        status: serde_json::from_str::<OnCallShiftStatus>(
            &row.get::<String>(6).map_err(|e| map_err("status", e))?,
        )
        .map_err(|e| map_err("status", e))?,
    })
}

/// Maps a `SELECT *` row from `tasks`.
pub fn task_from_row(row: &Row) -> Result<Task, DbError> {
    let escalation_keywords: String = row.get(13).map_err(|e| map_err("escalation_keywords", e))?;

    Ok(Task {
        id: parse_uuid("id", &row.get::<String>(0).map_err(|e| map_err("id", e))?)?,
        category_id: parse_uuid(
            "category_id",
            &row.get::<String>(1).map_err(|e| map_err("category_id", e))?,
        )?,
        slug: row.get(2).map_err(|e| map_err("slug", e))?,
        name: row.get(3).map_err(|e| map_err("name", e))?,
        required_level: Level::from_numeric(row.get::<i64>(4).map_err(|e| map_err("required_level", e))? as u8)
            .ok_or_else(|| map_err("required_level", "out of range"))?,
        regulated: row.get::<i64>(5).map_err(|e| map_err("regulated", e))? != 0,
        license_required: row.get::<i64>(6).map_err(|e| map_err("license_required", e))? != 0,
        hazardous: row.get::<i64>(7).map_err(|e| map_err("hazardous", e))? != 0,
        structural: row.get::<i64>(8).map_err(|e| map_err("structural", e))? != 0,
        emergency_eligible: row.get::<i64>(9).map_err(|e| map_err("emergency_eligible", e))? != 0,
        base_price_min_cents: row.get(10).map_err(|e| map_err("base_price_min_cents", e))?,
        base_price_max_cents: row.get(11).map_err(|e| map_err("base_price_max_cents", e))?,
        estimated_duration_min: row.get(12).map_err(|e| map_err("estimated_duration_min", e))?,
        escalation_keywords: serde_json::from_str(&escalation_keywords)
            .map_err(|e| map_err("escalation_keywords", e))?,
        active: row.get::<i64>(14).map_err(|e| map_err("active", e))? != 0,
    })
}

/// Maps a `SELECT *` row from `ratings`.
pub fn rating_from_row(row: &Row) -> Result<Rating, DbError> {
    Ok(Rating {
        id: parse_uuid("id", &row.get::<String>(0).map_err(|e| map_err("id", e))?)?,
        job_id: parse_uuid("job_id", &row.get::<String>(1).map_err(|e| map_err("job_id", e))?)?,
        stars: row.get::<i64>(2).map_err(|e| map_err("stars", e))? as u8,
        feedback: row.get(3).map_err(|e| map_err("feedback", e))?,
        created_at: parse_dt("created_at", &row.get::<String>(4).map_err(|e| map_err("created_at", e))?)?,
    })
}
