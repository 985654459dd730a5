//! Shared harness for the scenario tests in this directory: an in-process
//! router wired exactly like `main.rs`, backed by a fresh tempfile-backed
//! libsql database per test, plus the raw-SQL seeding a real deployment
//! would do through an admin tool or an onboarding flow we don't expose.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, Utc};
use dispatch_domain_models::{
    BackgroundCheck, BackgroundCheckStatus, Credential, CredentialStatus, CredentialType,
    InsurancePolicy, InsuranceStatus, Level, OnCallShift, OnCallShiftStatus, PricingRule,
    PricingRuleType, ProviderProfile, ProviderStatus, Task,
};
use dispatch_gateway::prelude::*;
use dispatch_gateway::routes::build_router;
use dispatch_infra_collaborators::doubles::{
    AutoApprovePaymentProcessor, AutoClearBackgroundCheckVendor, InsecureTestAuthProvider,
    RecordingNotificationTransport, StubWeatherOracle,
};
use dispatch_infra_collaborators::WeatherOracle;
use dispatch_infra_db::DbClient;
use libsql::params;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Home/service coordinates reused from the matching crate's own qualifier
/// fixtures: about 5.9km apart, well inside a 25km service radius.
pub const PROVIDER_HOME_LAT: f64 = 43.70;
pub const PROVIDER_HOME_LNG: f64 = -79.40;
pub const SERVICE_LAT: f64 = 43.65;
pub const SERVICE_LNG: f64 = -79.38;

pub struct TestApp {
    pub state: AppState,
    router: Router,
    _tempdir: tempfile::TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_weather(Arc::new(StubWeatherOracle::calm())).await
    }

    pub async fn spawn_with_weather(weather_oracle: Arc<dyn WeatherOracle>) -> Self {
        let tempdir = tempfile::tempdir().expect("create tempdir for test database");
        let db_path = tempdir.path().join("dispatch.db");
        let db = DbClient::connect(db_path.to_str().unwrap(), None)
            .await
            .expect("connect to tempfile-backed database");

        let config = Config {
            database_url: db_path.to_string_lossy().into_owned(),
            database_auth_token: None,
            bind_address: "127.0.0.1:0".parse().unwrap(),
            auth_signing_key: "test-signing-key".into(),
            cors_allowed_origins: vec![],
            default_page_size: 20,
            max_page_size: 100,
            dynamic_multiplier_ceiling: dispatch_domain_pricing::DEFAULT_MULTIPLIER_CEILING,
            sla_warning_threshold_min: 5,
            offer_expiry_sweep_interval_secs: 15,
        };

        let collaborators = Collaborators {
            auth_provider: Arc::new(InsecureTestAuthProvider),
            weather_oracle,
            notification_transport: Arc::new(RecordingNotificationTransport::default()),
            payment_processor: Arc::new(AutoApprovePaymentProcessor),
            background_check_vendor: Arc::new(AutoClearBackgroundCheckVendor),
        };

        let state = AppState::new(config, db, collaborators).expect("wire application state");
        let router = build_router(state.clone());

        Self {
            state,
            router,
            _tempdir: tempdir,
        }
    }

    pub fn token(subject_id: Uuid, role: &str) -> String {
        format!("{subject_id}:{role}")
    }

    /// Drives the router exactly as an HTTP client would, via `oneshot`.
    /// Returns the status code and, if present, the parsed JSON body.
    pub async fn call(&self, method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request_body = match &body {
            Some(value) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(value).unwrap())
            }
            None => Body::empty(),
        };
        let request = builder.body(request_body).unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn seed_task(&self, task: &Task) {
        let conn = self.state.db.get_connection().unwrap();
        conn.execute(
            r#"
            INSERT INTO tasks (
                id, category_id, slug, name, required_level, regulated, license_required,
                hazardous, structural, emergency_eligible, base_price_min_cents,
                base_price_max_cents, estimated_duration_min, escalation_keywords, active
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                task.id.to_string(),
                task.category_id.to_string(),
                task.slug.clone(),
                task.name.clone(),
                task.required_level.numeric() as i64,
                task.regulated as i64,
                task.license_required as i64,
                task.hazardous as i64,
                task.structural as i64,
                task.emergency_eligible as i64,
                task.base_price_min_cents,
                task.base_price_max_cents,
                task.estimated_duration_min,
                serde_json::to_string(&task.escalation_keywords).unwrap(),
                task.active as i64,
            ],
        )
        .await
        .unwrap();
    }

    pub async fn seed_provider(&self, profile: &ProviderProfile) {
        let conn = self.state.db.get_connection().unwrap();
        conn.execute(
            r#"
            INSERT INTO provider_profiles (
                id, user_id, level, status, background_check_status, background_check_date,
                background_check_expiry, internal_score, service_radius_km, home_lat, home_lng,
                max_concurrent_jobs, available_for_emergency, is_online, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                profile.id.to_string(),
                profile.user_id.to_string(),
                profile.level.numeric() as i64,
                serde_json::to_string(&profile.status).unwrap(),
                serde_json::to_string(&profile.background_check.status).unwrap(),
                profile.background_check.date.map(|d| d.to_string()),
                profile.background_check.expiry.map(|d| d.to_string()),
                profile.internal_score,
                profile.service_radius_km,
                profile.home_lat,
                profile.home_lng,
                profile.max_concurrent_jobs as i64,
                profile.available_for_emergency as i64,
                profile.is_online as i64,
                Utc::now().to_rfc3339(),
            ],
        )
        .await
        .unwrap();
    }

    /// `request_task_qualification` always inserts `qualified = 0`; seeding an
    /// already-approved qualification needs the explicit column write a real
    /// admin-approval flow would have produced.
    pub async fn seed_task_qualification(&self, provider_id: Uuid, task_id: Uuid, qualified: bool) {
        let conn = self.state.db.get_connection().unwrap();
        conn.execute(
            r#"
            INSERT INTO task_qualifications (provider_id, task_id, qualified, qualified_at, auto_granted)
            VALUES (?, ?, ?, ?, 0)
            "#,
            params![
                provider_id.to_string(),
                task_id.to_string(),
                qualified as i64,
                qualified.then(|| Utc::now().to_rfc3339()),
            ],
        )
        .await
        .unwrap();
    }

    pub async fn seed_insurance(&self, policy: &InsurancePolicy) {
        let conn = self.state.db.get_connection().unwrap();
        conn.execute(
            r#"
            INSERT INTO insurance_policies (
                id, provider_id, policy_type, coverage_cents, effective_date, expiry_date, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                policy.id.to_string(),
                policy.provider_id.to_string(),
                policy.policy_type.clone(),
                policy.coverage_cents,
                policy.effective_date.to_string(),
                policy.expiry_date.to_string(),
                serde_json::to_string(&policy.status).unwrap(),
            ],
        )
        .await
        .unwrap();
    }

    pub async fn seed_on_call_shift(&self, shift: &OnCallShift) {
        let conn = self.state.db.get_connection().unwrap();
        conn.execute(
            r#"
            INSERT INTO on_call_shifts (
                id, provider_id, shift_start, shift_end, region_type, region_value, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                shift.id.to_string(),
                shift.provider_id.to_string(),
                shift.shift_start.to_rfc3339(),
                shift.shift_end.to_rfc3339(),
                shift.region_type.clone(),
                shift.region_value.clone(),
                serde_json::to_string(&shift.status).unwrap(),
            ],
        )
        .await
        .unwrap();
    }

    pub async fn seed_pricing_rule(&self, rule: &PricingRule) {
        let conn = self.state.db.get_connection().unwrap();
        conn.execute(
            r#"
            INSERT INTO pricing_rules (id, name, rule_type, task_id, level, country, multiplier_max, description, active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                rule.id.to_string(),
                rule.name.clone(),
                serde_json::to_string(&rule.rule_type).unwrap(),
                rule.task_id.map(|id| id.to_string()),
                rule.level.map(|l| l.numeric() as i64),
                rule.country.clone(),
                rule.multiplier_max.to_string(),
                rule.description.clone(),
                rule.active as i64,
            ],
        )
        .await
        .unwrap();
    }

    pub async fn set_offer_expires_at(&self, assignment_id: Uuid, when: chrono::DateTime<Utc>) {
        let conn = self.state.db.get_connection().unwrap();
        conn.execute(
            "UPDATE assignments SET offer_expires_at = ? WHERE id = ?",
            params![when.to_rfc3339(), assignment_id.to_string()],
        )
        .await
        .unwrap();
    }

    pub async fn set_arrival_deadline(&self, assignment_id: Uuid, when: chrono::DateTime<Utc>) {
        let conn = self.state.db.get_connection().unwrap();
        conn.execute(
            "UPDATE assignments SET sla_arrival_deadline = ? WHERE id = ?",
            params![when.to_rfc3339(), assignment_id.to_string()],
        )
        .await
        .unwrap();
    }
}

/// A task matching the teacher's own pricing-engine fixture shape: emergency
/// eligible, with a closed base price range.
pub fn fixture_task(required_level: Level, base_min_cents: i64, base_max_cents: i64) -> Task {
    Task {
        id: Uuid::new_v4(),
        category_id: Uuid::new_v4(),
        slug: format!("fixture-{}", Uuid::new_v4()),
        name: "Fixture task".into(),
        required_level,
        regulated: false,
        license_required: required_level >= Level::L3,
        hazardous: false,
        structural: false,
        emergency_eligible: true,
        base_price_min_cents: Some(base_min_cents),
        base_price_max_cents: Some(base_max_cents),
        estimated_duration_min: Some(60),
        escalation_keywords: vec![],
        active: true,
    }
}

/// A provider profile matching the matching crate's own `base_profile`
/// fixture: home coordinates 5.9km from `SERVICE_LAT`/`SERVICE_LNG`, well
/// inside a 25km radius, cleared and fully qualified for its level.
pub fn fixture_provider(level: Level) -> ProviderProfile {
    ProviderProfile {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        level,
        status: ProviderStatus::Active,
        background_check: BackgroundCheck {
            status: BackgroundCheckStatus::Cleared,
            date: Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            expiry: None,
        },
        internal_score: dispatch_domain_scoring::band_for(level).base,
        service_radius_km: 25.0,
        home_lat: Some(PROVIDER_HOME_LAT),
        home_lng: Some(PROVIDER_HOME_LNG),
        max_concurrent_jobs: 1,
        available_for_emergency: true,
        is_online: true,
    }
}

pub fn fixture_license(provider_id: Uuid, expiry: Option<NaiveDate>) -> Credential {
    Credential {
        id: Uuid::new_v4(),
        provider_id,
        credential_type: CredentialType::License,
        name: "fixture license".into(),
        status: CredentialStatus::Verified,
        issued_date: Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
        expiry_date: expiry,
        jurisdiction: Some("ON".into()),
    }
}

pub fn fixture_insurance(provider_id: Uuid, effective: NaiveDate, expiry: NaiveDate) -> InsurancePolicy {
    InsurancePolicy {
        id: Uuid::new_v4(),
        provider_id,
        policy_type: "general_liability".into(),
        coverage_cents: dispatch_domain_models::LEVEL_4_MIN_COVERAGE_CENTS,
        effective_date: effective,
        expiry_date: expiry,
        status: InsuranceStatus::Verified,
    }
}

pub fn fixture_on_call_shift(provider_id: Uuid, now: chrono::DateTime<Utc>) -> OnCallShift {
    OnCallShift {
        id: Uuid::new_v4(),
        provider_id,
        shift_start: now - chrono::Duration::hours(1),
        shift_end: now + chrono::Duration::hours(11),
        region_type: "country".into(),
        region_value: "CA".into(),
        status: OnCallShiftStatus::Active,
    }
}

pub fn fixture_configured_surge_rule(task_id: Uuid, multiplier: Decimal) -> PricingRule {
    PricingRule {
        id: Uuid::new_v4(),
        name: format!("surge-{multiplier}"),
        rule_type: PricingRuleType::DemandSurge,
        task_id: Some(task_id),
        level: None,
        country: None,
        multiplier_max: multiplier,
        description: None,
        active: true,
    }
}

pub fn customer_address() -> dispatch_domain_models::ServiceAddress {
    dispatch_domain_models::ServiceAddress {
        line1: "100 Fixture St".into(),
        line2: None,
        city: "Toronto".into(),
        region: "ON".into(),
        postal_code: "M5V2T6".into(),
        country: "CA".into(),
    }
}
