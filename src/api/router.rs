use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::{control, health, proxy};
use crate::infrastructure::observability::{PrometheusMetrics, create_metrics_router};

/// Everything under this prefix is answered by the gateway itself
pub const CONTROL_PREFIX: &str = "/__worker";

/// Control API routes, relative to [`CONTROL_PREFIX`]
pub fn create_control_router(
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router<AppState> {
    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .route("/ready", get(health::ready_check))
        .route("/state", get(control::get_state))
        .route("/install", post(control::install))
        .route("/activate", post(control::activate))
        .route("/push", post(control::push))
        .route("/notifications/click", post(control::notification_click))
        .route("/sync", post(control::sync))
        .route("/partitions", get(control::list_partitions))
        .route("/events", get(control::events))
        .layer(CorsLayer::permissive());

    match metrics {
        Some(metrics) => router.merge(create_metrics_router(metrics, metrics_path)),
        None => router,
    }
}

/// Control API plus the intercepting fallback
pub fn create_router(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router {
    Router::new()
        .nest(CONTROL_PREFIX, create_control_router(metrics, metrics_path))
        .fallback(proxy::proxy)
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
