//! Schema bootstrap: idempotent `CREATE TABLE IF NOT EXISTS` statements run
//! on every connect. There is no separate migration tool; this is the
//! teacher's pattern of levelling the schema in place on each boot.

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::debug;

const TABLES: &[(&str, &str)] = &[
    ("tasks", r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            category_id TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            required_level INTEGER NOT NULL,
            regulated INTEGER NOT NULL DEFAULT 0,
            license_required INTEGER NOT NULL DEFAULT 0,
            hazardous INTEGER NOT NULL DEFAULT 0,
            structural INTEGER NOT NULL DEFAULT 0,
            emergency_eligible INTEGER NOT NULL DEFAULT 0,
            base_price_min_cents INTEGER,
            base_price_max_cents INTEGER,
            estimated_duration_min INTEGER,
            escalation_keywords TEXT NOT NULL DEFAULT '[]',
            active INTEGER NOT NULL DEFAULT 1
        );
    "#),
    ("sla_profiles", r#"
        CREATE TABLE IF NOT EXISTS sla_profiles (
            id TEXT PRIMARY KEY,
            level INTEGER NOT NULL,
            region_type TEXT NOT NULL,
            region_value TEXT NOT NULL,
            country TEXT NOT NULL,
            task_id TEXT REFERENCES tasks(id) ON DELETE CASCADE,
            response_time_min INTEGER NOT NULL,
            arrival_time_min INTEGER,
            completion_time_min INTEGER,
            penalty_enabled INTEGER NOT NULL DEFAULT 0,
            penalty_per_min_cents INTEGER,
            penalty_cap_cents INTEGER,
            effective_from TEXT NOT NULL,
            effective_until TEXT,
            priority_order INTEGER NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1
        );
    "#),
    ("provider_profiles", r#"
        CREATE TABLE IF NOT EXISTS provider_profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE,
            level INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'onboarding',
            background_check_status TEXT NOT NULL DEFAULT 'not_submitted',
            background_check_date TEXT,
            background_check_expiry TEXT,
            internal_score REAL NOT NULL,
            service_radius_km REAL NOT NULL,
            home_lat REAL,
            home_lng REAL,
            max_concurrent_jobs INTEGER NOT NULL DEFAULT 1,
            available_for_emergency INTEGER NOT NULL DEFAULT 0,
            is_online INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL
        );
    "#),
    ("credentials", r#"
        CREATE TABLE IF NOT EXISTS credentials (
            id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL REFERENCES provider_profiles(id) ON DELETE CASCADE,
            credential_type TEXT NOT NULL,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending_review',
            issued_date TEXT,
            expiry_date TEXT,
            jurisdiction TEXT
        );
    "#),
    ("insurance_policies", r#"
        CREATE TABLE IF NOT EXISTS insurance_policies (
            id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL REFERENCES provider_profiles(id) ON DELETE CASCADE,
            policy_type TEXT NOT NULL,
            coverage_cents INTEGER NOT NULL,
            effective_date TEXT NOT NULL,
            expiry_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending_review'
        );
    "#),
    ("on_call_shifts", r#"
        CREATE TABLE IF NOT EXISTS on_call_shifts (
            id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL REFERENCES provider_profiles(id) ON DELETE CASCADE,
            shift_start TEXT NOT NULL,
            shift_end TEXT NOT NULL,
            region_type TEXT NOT NULL,
            region_value TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled'
        );
    "#),
    ("task_qualifications", r#"
        CREATE TABLE IF NOT EXISTS task_qualifications (
            provider_id TEXT NOT NULL REFERENCES provider_profiles(id) ON DELETE CASCADE,
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            qualified INTEGER NOT NULL DEFAULT 0,
            qualified_at TEXT,
            auto_granted INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (provider_id, task_id)
        );
    "#),
    ("jobs", r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            reference TEXT NOT NULL UNIQUE,
            customer_id TEXT NOT NULL,
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE RESTRICT,
            status TEXT NOT NULL DEFAULT 'draft',
            priority TEXT NOT NULL DEFAULT 'standard',
            is_emergency INTEGER NOT NULL DEFAULT 0,
            service_lat REAL NOT NULL,
            service_lng REAL NOT NULL,
            service_address TEXT NOT NULL,
            requested_date TEXT,
            requested_time_start TEXT,
            requested_time_end TEXT,
            flexible_schedule INTEGER NOT NULL DEFAULT 0,
            sla_snapshot TEXT NOT NULL,
            quoted_price_cents INTEGER NOT NULL,
            commission_rate TEXT NOT NULL,
            commission_cents INTEGER NOT NULL,
            provider_payout_cents INTEGER NOT NULL,
            currency TEXT NOT NULL DEFAULT 'USD',
            customer_notes TEXT NOT NULL DEFAULT '[]',
            started_at TEXT,
            completed_at TEXT,
            cancelled_at TEXT,
            cancellation_reason TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#),
    ("assignments", r#"
        CREATE TABLE IF NOT EXISTS assignments (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
            provider_id TEXT NOT NULL REFERENCES provider_profiles(id) ON DELETE RESTRICT,
            status TEXT NOT NULL DEFAULT 'offered',
            offered_at TEXT NOT NULL,
            offer_expires_at TEXT NOT NULL,
            responded_at TEXT,
            decline_reason TEXT,
            sla_response_deadline TEXT NOT NULL,
            sla_arrival_deadline TEXT,
            sla_completion_deadline TEXT,
            sla_response_met INTEGER,
            sla_arrival_met INTEGER,
            sla_completion_met INTEGER,
            en_route_at TEXT,
            arrived_at TEXT,
            started_work_at TEXT,
            completed_at TEXT,
            match_score REAL NOT NULL
        );
    "#),
    ("pricing_rules", r#"
        CREATE TABLE IF NOT EXISTS pricing_rules (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            rule_type TEXT NOT NULL,
            task_id TEXT REFERENCES tasks(id) ON DELETE CASCADE,
            level INTEGER,
            country TEXT,
            multiplier_max TEXT NOT NULL,
            description TEXT,
            active INTEGER NOT NULL DEFAULT 1
        );
    "#),
    ("commission_schedules", r#"
        CREATE TABLE IF NOT EXISTS commission_schedules (
            level INTEGER NOT NULL,
            country TEXT NOT NULL,
            min_rate TEXT NOT NULL,
            max_rate TEXT NOT NULL,
            default_rate TEXT NOT NULL,
            PRIMARY KEY (level, country)
        );
    "#),
    ("pricing_events", r#"
        CREATE TABLE IF NOT EXISTS pricing_events (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL REFERENCES jobs(id) ON DELETE RESTRICT,
            event_type TEXT NOT NULL,
            base_price_cents INTEGER NOT NULL,
            multiplier_applied TEXT NOT NULL,
            adjustments_cents INTEGER NOT NULL,
            final_price_cents INTEGER NOT NULL,
            rules_applied TEXT NOT NULL DEFAULT '[]',
            commission_rate TEXT NOT NULL,
            commission_cents INTEGER NOT NULL,
            provider_payout_cents INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );
    "#),
    ("penalty_records", r#"
        CREATE TABLE IF NOT EXISTS penalty_records (
            id TEXT PRIMARY KEY,
            provider_id TEXT NOT NULL REFERENCES provider_profiles(id) ON DELETE RESTRICT,
            penalty_type TEXT NOT NULL,
            points_deducted INTEGER NOT NULL,
            applied_at TEXT NOT NULL,
            job_id TEXT,
            reason TEXT
        );
    "#),
    ("ratings", r#"
        CREATE TABLE IF NOT EXISTS ratings (
            id TEXT PRIMARY KEY,
            job_id TEXT NOT NULL REFERENCES jobs(id) ON DELETE RESTRICT,
            stars INTEGER NOT NULL,
            feedback TEXT,
            created_at TEXT NOT NULL
        );
    "#),
];

const INDEXES: &[(&str, &str)] = &[
    ("idx_jobs_status", "CREATE INDEX IF NOT EXISTS idx_jobs_status ON jobs(status);"),
    ("idx_assignments_job", "CREATE INDEX IF NOT EXISTS idx_assignments_job ON assignments(job_id);"),
    ("idx_assignments_provider_status", "CREATE INDEX IF NOT EXISTS idx_assignments_provider_status ON assignments(provider_id, status);"),
    ("idx_sla_profiles_lookup", "CREATE INDEX IF NOT EXISTS idx_sla_profiles_lookup ON sla_profiles(level, region_type, region_value, country);"),
    ("idx_penalty_records_provider", "CREATE INDEX IF NOT EXISTS idx_penalty_records_provider ON penalty_records(provider_id, applied_at);"),
    ("idx_ratings_job", "CREATE INDEX IF NOT EXISTS idx_ratings_job ON ratings(job_id);"),
];

pub async fn apply_schema(conn: &Connection) -> Result<()> {
    for (name, sql) in TABLES {
        debug!(table = name, "applying table");
        conn.execute(sql, ())
            .await
            .with_context(|| format!("creating table {name}"))?;
    }
    for (name, sql) in INDEXES {
        debug!(index = name, "applying index");
        conn.execute(sql, ())
            .await
            .with_context(|| format!("creating index {name}"))?;
    }
    Ok(())
}
