//! Control endpoints: lifecycle, host events and partition inspection

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tracing::{info, warn};

use super::state::AppState;
use super::types::{
    ApiError, PartitionsResponse, StateResponse, SyncRequest, SyncResponse, WorkerInfo,
};
use crate::domain::worker::{ActivationReport, NotificationClick, PushOutcome, WorkerEvents};
use crate::infrastructure::services::ServiceWorker;

pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(StateResponse {
        active: state
            .registration
            .active()
            .map(|worker| WorkerInfo::from(worker.as_ref())),
        pending: state
            .registration
            .pending()
            .map(|worker| WorkerInfo::from(worker.as_ref())),
    })
}

pub async fn install(State(state): State<AppState>) -> Result<Json<StateResponse>, ApiError> {
    state.registration.install_pending().await?;
    Ok(get_state(State(state)).await)
}

pub async fn activate(State(state): State<AppState>) -> Result<Json<ActivationReport>, ApiError> {
    let report = state.registration.activate_pending().await?;
    Ok(Json(report))
}

/// Raw push payload, forwarded untouched to the active worker
pub async fn push(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PushOutcome>, ApiError> {
    let worker = dispatch_target(&state)?;
    Ok(Json(worker.push(&body).await))
}

pub async fn notification_click(
    State(state): State<AppState>,
    payload: Result<Json<NotificationClick>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(click) = payload?;
    let worker = dispatch_target(&state)?;

    worker.notification_click(click).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn sync(
    State(state): State<AppState>,
    payload: Result<Json<SyncRequest>, JsonRejection>,
) -> Result<Json<SyncResponse>, ApiError> {
    let Json(request) = payload?;
    let worker = dispatch_target(&state)?;

    let outcome = worker.sync(&request.tag).await;
    Ok(Json(SyncResponse {
        tag: request.tag,
        outcome,
    }))
}

pub async fn list_partitions(
    State(state): State<AppState>,
) -> Result<Json<PartitionsResponse>, ApiError> {
    let partitions = state.store.list_names().await?;
    let current = state
        .registration
        .active()
        .map(|worker| {
            partitions
                .iter()
                .filter(|name| worker.policy().is_current_partition(name))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    Ok(Json(PartitionsResponse {
        partitions,
        current,
    }))
}

/// Host events as server-sent events, one JSON object per event
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("Host event subscriber connected");

    let stream = BroadcastStream::new(state.host.subscribe()).filter_map(|event| match event {
        Ok(event) => Event::default().json_data(&event).ok().map(Ok),
        Err(e) => {
            warn!(error = %e, "Host event subscriber lagged");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Push, click and sync events go to the active worker, or the staged one before activation
fn dispatch_target(state: &AppState) -> Result<Arc<ServiceWorker>, ApiError> {
    state
        .registration
        .active()
        .or_else(|| state.registration.pending())
        .ok_or_else(|| ApiError::unavailable("No worker is registered"))
}
