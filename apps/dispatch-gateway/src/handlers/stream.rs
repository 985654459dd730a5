//! The real-time fan-out socket (spec §4.K). Authentication happens at
//! handshake, same as the bearer-token guard on the HTTP routes, just
//! carried as a query parameter since the browser `WebSocket` API can't set
//! request headers. Once connected, one session runs three cooperative
//! tasks: an internal command worker, a downstream sender that filters the
//! event bus down to the rooms this session has joined, and an upstream
//! reader that decodes inbound frames. Whichever task ends first tears
//! down the other two.

use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dispatch_domain_models::DomainEvent;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::services::location::record_location_update;
use crate::state::AppState;

const KEEPALIVE_INTERVAL_SECS: u64 = 25;
const COMMAND_BUFFER_CAPACITY: usize = 32;

#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    token: String,
}

/// Verifies the handshake token before upgrading; an unauthenticated
/// handshake never reaches `run_session` (spec §4.K: "Unauthenticated
/// handshakes are rejected").
#[instrument(skip(upgrade, state, params))]
pub async fn upgrade(
    upgrade: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsAuthParams>,
) -> Result<Response, StatusCode> {
    let identity = state.auth_provider.verify(&params.token).await.map_err(|e| {
        warn!(error = %e, "websocket handshake rejected");
        StatusCode::UNAUTHORIZED
    })?;

    Ok(upgrade.on_upgrade(move |socket| run_session(socket, state, identity)))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InboundFrame {
    JoinJob { job_id: Uuid },
    LeaveJob { job_id: Uuid },
    LocationUpdate {
        provider_id: Uuid,
        lat: f64,
        lng: f64,
        heading: Option<f64>,
        speed: Option<f64>,
        accuracy: Option<f64>,
    },
}

/// A session receives an event when it's in the event's job room
/// (`job_{job_id}`, joined explicitly via `join_job`) or the event targets
/// this session's own personal room (`{role}_{user_id}`, joined
/// automatically at handshake).
fn in_scope(event: &DomainEvent, joined_jobs: &HashSet<Uuid>, subject_id: Uuid) -> bool {
    event.job_id().is_some_and(|job_id| joined_jobs.contains(&job_id))
        || event.provider_id() == Some(subject_id)
}

async fn run_session(socket: WebSocket, state: AppState, identity: dispatch_infra_collaborators::VerifiedIdentity) {
    let (mut sink, mut stream) = socket.split();
    let mut events = state.event_bus.subscribe();
    let session_id = Uuid::new_v4();
    let subject_id = identity.subject_id;

    debug!(%session_id, subject_id = %subject_id, role = %identity.role, "websocket session opened");

    let (command_tx, mut command_rx) = mpsc::channel::<InboundFrame>(COMMAND_BUFFER_CAPACITY);
    let (room_tx, mut room_rx) = mpsc::unbounded_channel::<RoomChange>();

    let worker_state = state.clone();
    let mut worker_task = tokio::spawn(async move {
        while let Some(frame) = command_rx.recv().await {
            match frame {
                InboundFrame::JoinJob { job_id } => {
                    let _ = room_tx.send(RoomChange::Join(job_id));
                }
                InboundFrame::LeaveJob { job_id } => {
                    let _ = room_tx.send(RoomChange::Leave(job_id));
                }
                InboundFrame::LocationUpdate {
                    provider_id,
                    lat,
                    lng,
                    heading,
                    speed,
                    accuracy,
                } => {
                    if let Err(e) = record_location_update(
                        &worker_state,
                        provider_id,
                        lat,
                        lng,
                        heading,
                        speed,
                        accuracy,
                    )
                    .await
                    {
                        warn!(%provider_id, error = %e, "location update rejected");
                    }
                }
            }
        }
    });

    let mut sender_task = tokio::spawn(async move {
        let mut keepalive = interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECS));
        let mut joined_jobs: HashSet<Uuid> = HashSet::new();
        loop {
            tokio::select! {
                change = room_rx.recv() => {
                    match change {
                        Some(RoomChange::Join(job_id)) => { joined_jobs.insert(job_id); }
                        Some(RoomChange::Leave(job_id)) => { joined_jobs.remove(&job_id); }
                        None => {}
                    }
                }
                _ = keepalive.tick() => {
                    if sink.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
                received = events.recv() => {
                    match received {
                        Ok(event) => {
                            if !in_scope(&event, &joined_jobs, subject_id) {
                                continue;
                            }
                            let Ok(payload) = serde_json::to_string(&event) else { continue };
                            if sink.send(Message::Text(payload)).await.is_err() {
                                break;
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "websocket session fell behind the event bus");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    });

    let mut receiver_task = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<InboundFrame>(&text) {
                        Ok(frame) => {
                            if command_tx.send(frame).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "ignoring malformed inbound frame"),
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "websocket read error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut sender_task => {
            receiver_task.abort();
            worker_task.abort();
        }
        _ = &mut receiver_task => {
            sender_task.abort();
            worker_task.abort();
        }
        _ = &mut worker_task => {
            sender_task.abort();
            receiver_task.abort();
        }
    }

    debug!(%session_id, "websocket session closed");
}

enum RoomChange {
    Join(Uuid),
    Leave(Uuid),
}
