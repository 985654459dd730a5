//! Deterministic in-memory doubles for each collaborator trait. Used by
//! domain-crate unit tests and by the gateway when no live adapter is wired
//! in (local development, CI).

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    AuthProvider, BackgroundCheckResult, BackgroundCheckVendor, CollaboratorError,
    NotificationTransport, OutboundNotification, PaymentProcessor, PaymentReceipt,
    VerifiedIdentity, WeatherConditions, WeatherOracle,
};

/// Always reports calm weather unless armed with a canned response.
pub struct StubWeatherOracle {
    forced: Mutex<Option<WeatherConditions>>,
}

impl StubWeatherOracle {
    pub fn calm() -> Self {
        Self {
            forced: Mutex::new(None),
        }
    }

    pub fn forcing(conditions: WeatherConditions) -> Self {
        Self {
            forced: Mutex::new(Some(conditions)),
        }
    }
}

#[async_trait]
impl WeatherOracle for StubWeatherOracle {
    async fn conditions(&self, _lat: f64, _lng: f64) -> Result<WeatherConditions, CollaboratorError> {
        Ok(self.forced.lock().unwrap().clone().unwrap_or(WeatherConditions {
            is_extreme: false,
            description: "clear".into(),
        }))
    }
}

/// Treats the bearer token as an opaque `subject_id:role` pair. Never use
/// outside tests; it performs no real verification.
pub struct InsecureTestAuthProvider;

#[async_trait]
impl AuthProvider for InsecureTestAuthProvider {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, CollaboratorError> {
        let (id, role) = token
            .split_once(':')
            .ok_or_else(|| CollaboratorError::Rejected("malformed test token".into()))?;
        let subject_id = Uuid::parse_str(id)
            .map_err(|_| CollaboratorError::Rejected("malformed subject id".into()))?;
        Ok(VerifiedIdentity {
            subject_id,
            role: role.to_string(),
        })
    }
}

/// Records every notification it is asked to send instead of delivering it.
#[derive(Default)]
pub struct RecordingNotificationTransport {
    pub sent: Mutex<Vec<OutboundNotification>>,
}

#[async_trait]
impl NotificationTransport for RecordingNotificationTransport {
    async fn send(&self, notification: OutboundNotification) -> Result<(), CollaboratorError> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Captures and refunds are always approved at face value.
pub struct AutoApprovePaymentProcessor;

#[async_trait]
impl PaymentProcessor for AutoApprovePaymentProcessor {
    async fn capture(&self, _job_id: Uuid, amount_cents: i64) -> Result<PaymentReceipt, CollaboratorError> {
        Ok(PaymentReceipt {
            reference: Uuid::new_v4().to_string(),
            captured_at: Utc::now(),
            amount_cents,
        })
    }

    async fn refund(&self, _job_id: Uuid, amount_cents: i64) -> Result<PaymentReceipt, CollaboratorError> {
        Ok(PaymentReceipt {
            reference: Uuid::new_v4().to_string(),
            captured_at: Utc::now(),
            amount_cents,
        })
    }
}

/// Clears every applicant immediately.
pub struct AutoClearBackgroundCheckVendor;

#[async_trait]
impl BackgroundCheckVendor for AutoClearBackgroundCheckVendor {
    async fn initiate(&self, _provider_id: Uuid) -> Result<String, CollaboratorError> {
        Ok(Uuid::new_v4().to_string())
    }

    async fn poll(&self, _vendor_reference: &str) -> Result<BackgroundCheckResult, CollaboratorError> {
        Ok(BackgroundCheckResult::Clear)
    }
}
