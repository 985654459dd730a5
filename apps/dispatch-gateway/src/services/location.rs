//! Provider location ingestion (spec §4.K "Location stream"). The
//! geospatial sorted-set and detail-hash side of that section lives on the
//! cache/pub-sub collaborator named in §6, which is outside this core's
//! scope; this service owns the one piece the core is responsible for: the
//! per-provider throttle.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::state::AppState;

const THROTTLE_WINDOW: Duration = Duration::from_secs(3);

static LAST_UPDATE: Lazy<Mutex<HashMap<Uuid, Instant>>> = Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("update throttled, at most one accepted per {window:?}")]
    Throttled { window: Duration },
    #[error("coordinates out of range: lat={lat}, lng={lng}")]
    OutOfRange { lat: f64, lng: f64 },
}

#[instrument(skip(_state))]
pub async fn record_location_update(
    _state: &AppState,
    provider_id: Uuid,
    lat: f64,
    lng: f64,
    heading: Option<f64>,
    speed: Option<f64>,
    accuracy: Option<f64>,
) -> Result<(), LocationError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(LocationError::OutOfRange { lat, lng });
    }

    let now = Instant::now();
    {
        let mut last = LAST_UPDATE.lock().expect("location throttle lock poisoned");
        if let Some(previous) = last.get(&provider_id) {
            if now.duration_since(*previous) < THROTTLE_WINDOW {
                return Err(LocationError::Throttled {
                    window: THROTTLE_WINDOW,
                });
            }
        }
        last.insert(provider_id, now);
    }

    debug!(%provider_id, lat, lng, ?heading, ?speed, ?accuracy, "location update accepted");
    Ok(())
}
