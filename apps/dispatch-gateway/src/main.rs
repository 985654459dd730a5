//! Process entry point: loads configuration, connects the database, wires
//! collaborator adapters, spawns the background sweepers, and serves the
//! HTTP/WebSocket router.

use std::sync::Arc;

use dispatch_gateway::prelude::*;
use dispatch_gateway::routes::build_router;
use dispatch_gateway::services::sweepers;
use dispatch_infra_collaborators::doubles::{
    AutoApprovePaymentProcessor, AutoClearBackgroundCheckVendor, InsecureTestAuthProvider,
    RecordingNotificationTransport, StubWeatherOracle,
};
use dispatch_infra_db::DbClient;
use tracing::{error, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    dispatch_shared_telemetry::init_tracing("dispatch_gateway");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        let config = Config::from_env().unwrap_or_else(|e| {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        });
        let bind_address = config.bind_address;

        info!(%bind_address, "starting dispatch gateway");

        let db = DbClient::connect(&config.database_url, config.database_auth_token.clone())
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "database connection failed");
                std::process::exit(1);
            });

        // No live collaborator adapters live in this workspace (spec §6); the
        // in-memory doubles stand in until they're wired from outside it.
        let collaborators = Collaborators {
            auth_provider: Arc::new(InsecureTestAuthProvider),
            weather_oracle: Arc::new(StubWeatherOracle::calm()),
            notification_transport: Arc::new(RecordingNotificationTransport::default()),
            payment_processor: Arc::new(AutoApprovePaymentProcessor),
            background_check_vendor: Arc::new(AutoClearBackgroundCheckVendor),
        };

        let state = AppState::new(config.clone(), db, collaborators).unwrap_or_else(|e| {
            error!(error = %e, "failed to wire application state");
            std::process::exit(1);
        });

        tokio::spawn(sweepers::run_offer_expiry_sweeper(
            state.clone(),
            config.offer_expiry_sweep_interval_secs,
        ));
        tokio::spawn(sweepers::run_weekly_score_recovery(state.clone()));
        tokio::spawn(sweepers::run_credential_expiry_scan(state.clone()));
        tokio::spawn(sweepers::run_sla_warning_scanner(
            state.clone(),
            config.sla_warning_threshold_min,
        ));

        let router = build_router(state);
        let listener = tokio::net::TcpListener::bind(bind_address).await.unwrap_or_else(|e| {
            error!(error = %e, %bind_address, "failed to bind");
            std::process::exit(1);
        });

        info!(%bind_address, "dispatch gateway listening");
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "server exited with an error");
        }
    });

    Ok(())
}
