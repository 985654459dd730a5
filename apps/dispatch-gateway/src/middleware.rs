//! Request guards: liveness gate and bearer-token authentication.

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// Blocks the request while the system is in maintenance mode (spec §6).
pub async fn health_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Err(reason) = state.is_operational() {
        warn!(reason, "rejecting request: system in maintenance");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "maintenance_active", "reason": reason })),
        )
            .into_response();
    }
    next.run(req).await
}

/// Verifies the bearer token against the auth provider collaborator and
/// injects the resolved identity as a request extension. The core never
/// decodes or issues tokens itself (spec §6) — it only consults the
/// collaborator's verdict.
pub async fn auth_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    match state.auth_provider.verify(token).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(error = %e, "token verification failed");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
