//! §8 scenario 6: an L3+ provider whose license has lapsed is suspended by
//! the credential-expiry scan even though nothing else about their record
//! changed — mirrors the verification-service expiry sweep in the original
//! system this was modeled on.

mod support;

use chrono::NaiveDate;
use dispatch_domain_models::{Level, ProviderStatus};

use support::{fixture_insurance, fixture_license, fixture_provider, TestApp};

#[tokio::test]
async fn lapsed_license_suspends_an_active_provider() {
    let app = TestApp::spawn().await;

    let provider = fixture_provider(Level::L3);
    app.seed_provider(&provider).await;

    let lapsed_license = fixture_license(provider.id, Some(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()));
    app.state.providers.insert_credential(&lapsed_license).await.unwrap();

    let insurance = fixture_insurance(
        provider.id,
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
    );
    app.seed_insurance(&insurance).await;

    dispatch_gateway::services::sweepers::sweep_credential_expiry(&app.state).await.unwrap();

    let updated = app.state.providers.get(provider.id).await.unwrap();
    assert_eq!(updated.status, ProviderStatus::Suspended);
    // The score itself is untouched — this is a qualification lapse, not a
    // scored infraction.
    assert_eq!(updated.internal_score, provider.internal_score);
}

#[tokio::test]
async fn valid_credentials_leave_an_active_provider_untouched() {
    let app = TestApp::spawn().await;

    let provider = fixture_provider(Level::L3);
    app.seed_provider(&provider).await;

    let license = fixture_license(provider.id, Some(NaiveDate::from_ymd_opt(2099, 1, 1).unwrap()));
    app.state.providers.insert_credential(&license).await.unwrap();

    let insurance = fixture_insurance(provider.id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), NaiveDate::from_ymd_opt(2099, 1, 1).unwrap());
    app.seed_insurance(&insurance).await;

    dispatch_gateway::services::sweepers::sweep_credential_expiry(&app.state).await.unwrap();

    let updated = app.state.providers.get(provider.id).await.unwrap();
    assert_eq!(updated.status, ProviderStatus::Active);
}
