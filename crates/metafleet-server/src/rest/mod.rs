mod handlers;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, State};
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};

use metafleet_auth::{AuthenticationOrchestrator, AuthorizationEvaluator};
use metafleet_cache::MetadataSource;

use crate::metrics::Metrics;
use crate::service::MetadataService;

const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024; // 1 MB

pub struct AppState<S: MetadataSource> {
    pub service: Arc<MetadataService<S>>,
    pub orchestrator: Arc<AuthenticationOrchestrator<S>>,
    pub evaluator: Arc<AuthorizationEvaluator<S>>,
    pub metrics: Arc<Metrics>,
}

impl<S: MetadataSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            orchestrator: self.orchestrator.clone(),
            evaluator: self.evaluator.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

async fn metrics_middleware<S: MetadataSource + 'static>(
    State(state): State<AppState<S>>,
    request: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> Response {
    state.metrics.record_request();

    let response = next.run(request).await;

    if response.status().is_success() {
        state.metrics.record_success();
    } else {
        state.metrics.record_error();
    }

    response
}

pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: MetadataSource + 'static,
{
    Router::new()
        // Peer-facing invalidation endpoint; path is part of the fleet
        // protocol and shared by every node.
        .route("/resetMemoryCache", post(handlers::reset_memory_cache))
        .route("/login", post(handlers::login))
        .route("/v1/permissions/check", post(handlers::check_permission))
        .route("/v1/metadata/notify", post(handlers::notify_metadata))
        .route(
            "/v1/tenants/{tenant_id}/promotion-order",
            get(handlers::promotion_order),
        )
        .route("/v1/tenants/{tenant_id}/topics", get(handlers::topic_summaries))
        .route("/healthz", get(handlers::healthz))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .with_state(state)
}
