//! Shared application state: the database client, one repository per
//! aggregate, the event bus, the collaborator interfaces, and a liveness
//! gate for inbound requests.

use std::sync::{Arc, RwLock};

use dispatch_infra_collaborators::{
    AuthProvider, BackgroundCheckVendor, NotificationTransport, PaymentProcessor, WeatherOracle,
};
use dispatch_infra_db::{
    AssignmentRepository, DbClient, JobRepository, PenaltyRepository, PricingRepository,
    ProviderRepository, RatingRepository, SlaProfileRepository, TaskRepository,
};
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::services::event_bus::EventBus;

/// Liveness gate consulted by middleware ahead of every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemMode {
    Operational,
    Maintenance(String),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DbClient,
    pub event_bus: Arc<EventBus>,
    pub jobs: Arc<JobRepository>,
    pub assignments: Arc<AssignmentRepository>,
    pub providers: Arc<ProviderRepository>,
    pub pricing: Arc<PricingRepository>,
    pub sla_profiles: Arc<SlaProfileRepository>,
    pub penalties: Arc<PenaltyRepository>,
    pub tasks: Arc<TaskRepository>,
    pub ratings: Arc<RatingRepository>,
    pub auth_provider: Arc<dyn AuthProvider>,
    pub weather_oracle: Arc<dyn WeatherOracle>,
    pub notification_transport: Arc<dyn NotificationTransport>,
    pub payment_processor: Arc<dyn PaymentProcessor>,
    pub background_check_vendor: Arc<dyn BackgroundCheckVendor>,
    mode: Arc<RwLock<SystemMode>>,
}

/// Bundles the collaborator trait objects so [`AppState::new`] doesn't take
/// five separate `Arc<dyn ...>` parameters.
pub struct Collaborators {
    pub auth_provider: Arc<dyn AuthProvider>,
    pub weather_oracle: Arc<dyn WeatherOracle>,
    pub notification_transport: Arc<dyn NotificationTransport>,
    pub payment_processor: Arc<dyn PaymentProcessor>,
    pub background_check_vendor: Arc<dyn BackgroundCheckVendor>,
}

impl AppState {
    #[instrument(skip(config, db, collaborators))]
    pub fn new(config: Config, db: DbClient, collaborators: Collaborators) -> Result<Self, dispatch_infra_db::DbError> {
        debug!("wiring application state");

        let jobs = Arc::new(JobRepository::new(db.get_connection()?));
        let assignments = Arc::new(AssignmentRepository::new(db.get_connection()?));
        let providers = Arc::new(ProviderRepository::new(db.get_connection()?));
        let pricing = Arc::new(PricingRepository::new(db.get_connection()?));
        let sla_profiles = Arc::new(SlaProfileRepository::new(db.get_connection()?));
        let penalties = Arc::new(PenaltyRepository::new(db.get_connection()?));
        let tasks = Arc::new(TaskRepository::new(db.get_connection()?));
        let ratings = Arc::new(RatingRepository::new(db.get_connection()?));

        Ok(Self {
            config: Arc::new(config),
            db,
            event_bus: Arc::new(EventBus::new()),
            jobs,
            assignments,
            providers,
            pricing,
            sla_profiles,
            penalties,
            tasks,
            ratings,
            auth_provider: collaborators.auth_provider,
            weather_oracle: collaborators.weather_oracle,
            notification_transport: collaborators.notification_transport,
            payment_processor: collaborators.payment_processor,
            background_check_vendor: collaborators.background_check_vendor,
            mode: Arc::new(RwLock::new(SystemMode::Operational)),
        })
    }

    #[instrument(skip(self))]
    pub fn set_mode(&self, mode: SystemMode) {
        match self.mode.write() {
            Ok(mut guard) => {
                info!(?mode, "system mode changed");
                *guard = mode;
            }
            Err(_) => error!("system mode lock poisoned"),
        }
    }

    #[instrument(skip(self), level = "debug")]
    pub fn is_operational(&self) -> Result<(), String> {
        let guard = self
            .mode
            .read()
            .map_err(|e| format!("system mode lock poisoned: {e}"))?;
        match &*guard {
            SystemMode::Operational => Ok(()),
            SystemMode::Maintenance(reason) => {
                warn!(reason, "rejecting request: maintenance mode active");
                Err(reason.clone())
            }
        }
    }
}
