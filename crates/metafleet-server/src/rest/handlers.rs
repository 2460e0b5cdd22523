use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use metafleet_auth::{AuthFailure, AuthOutcome, LoginRequest, build_login_context};
use metafleet_cache::MetadataSource;
use metafleet_core::event::WireMetadataChange;
use metafleet_core::model::summarize_topics;
use metafleet_core::permission::PermissionType;
use metafleet_core::principal::Principal;
use metafleet_core::tenant::TenantId;

use super::AppState;
use super::types::*;
use crate::error::ApiError;

fn error_response(err: ApiError) -> axum::response::Response {
    let status = match &err {
        ApiError::Auth(AuthFailure::DirectoryUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
        ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
        ApiError::Source(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Peer-facing cache invalidation. Unknown events are acknowledged with
/// `accepted: false`; only a source outage is an error.
pub async fn reset_memory_cache<S: MetadataSource + 'static>(
    State(state): State<AppState<S>>,
    Json(wire): Json<WireMetadataChange>,
) -> impl IntoResponse {
    match state.service.apply_remote(wire).await {
        Ok(accepted) => {
            (StatusCode::OK, Json(ResetCacheResponse { accepted })).into_response()
        }
        Err(err) => error_response(err.into()),
    }
}

/// Locally originated change: apply here, then fan out to the fleet.
pub async fn notify_metadata<S: MetadataSource + 'static>(
    State(state): State<AppState<S>>,
    Json(wire): Json<WireMetadataChange>,
) -> impl IntoResponse {
    let Some(event) = wire.into_event() else {
        return error_response(ApiError::BadRequest(
            "unknown entity or operation type".to_string(),
        ));
    };

    match state.service.update_metadata(event).await {
        Ok(()) => (StatusCode::OK, Json(NotifyResponse { applied: true })).into_response(),
        Err(err) => error_response(err.into()),
    }
}

pub async fn login<S: MetadataSource + 'static>(
    State(state): State<AppState<S>>,
    Json(body): Json<LoginRequestBody>,
) -> impl IntoResponse {
    let request = LoginRequest {
        username: body.username,
        password: body.password,
        captcha_token: body.captcha_token,
    };

    match state.orchestrator.login(&request).await {
        Ok(AuthOutcome::Success(identity)) => {
            let context = build_login_context(state.service.store(), &identity);
            (StatusCode::OK, Json(LoginResponse::from_context(context))).into_response()
        }
        Ok(AuthOutcome::ProvisioningRequired { username }) => (
            StatusCode::OK,
            Json(ProvisioningResponse {
                provisioning_required: true,
                username,
            }),
        )
            .into_response(),
        Err(failure) => error_response(failure.into()),
    }
}

pub async fn check_permission<S: MetadataSource + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<PermissionCheckRequest>,
) -> impl IntoResponse {
    let mut required = Vec::with_capacity(request.permissions.len());
    for name in &request.permissions {
        let Some(permission) = PermissionType::parse(name) else {
            return error_response(ApiError::BadRequest(format!("unknown permission '{name}'")));
        };
        required.push(permission);
    }

    let principal = Principal::Username(request.username);
    let allowed = state.evaluator.has_any_permission(&principal, &required);
    (StatusCode::OK, Json(PermissionCheckResponse { allowed })).into_response()
}

pub async fn promotion_order<S: MetadataSource + 'static>(
    State(state): State<AppState<S>>,
    Path(tenant_id): Path<i32>,
) -> impl IntoResponse {
    let environments = state
        .service
        .store()
        .topic_promotion_order(TenantId::new(tenant_id));
    (StatusCode::OK, Json(PromotionOrderResponse { environments }))
}

pub async fn topic_summaries<S: MetadataSource + 'static>(
    State(state): State<AppState<S>>,
    Path(tenant_id): Path<i32>,
) -> impl IntoResponse {
    let topics = state.service.store().topics(TenantId::new(tenant_id));
    let summaries: Vec<TopicSummaryResponse> = summarize_topics(&topics)
        .into_iter()
        .map(TopicSummaryResponse::from)
        .collect();
    (StatusCode::OK, Json(summaries))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::TestServer;
    use serde_json::json;

    use metafleet_auth::{AuthenticationOrchestrator, AuthorizationEvaluator};
    use metafleet_cache::{
        CredentialStore, InMemorySource, MetadataDispatcher, TenantCacheStore,
    };
    use metafleet_core::mode::{AuthenticationMode, DeploymentMode};
    use metafleet_core::model::{Environment, KafkaCluster, TenantProperties, Topic, UserProfile};
    use metafleet_core::permission::{PermissionType, RolePermissionRow};

    use crate::broadcast::InvalidationBroadcaster;
    use crate::config::FleetConfig;
    use crate::metrics::Metrics;
    use crate::observer::LoginObserver;
    use crate::rest::{AppState, create_router};
    use crate::service::MetadataService;

    use super::*;

    const TENANT: TenantId = TenantId::new(1);

    async fn test_server(source: InMemorySource) -> (TestServer, Arc<Metrics>) {
        let store = Arc::new(TenantCacheStore::new(source));
        store.reload_users_all_tenants().await.unwrap();
        store.reload_role_permissions(TENANT).await.unwrap();

        let credentials = Arc::new(CredentialStore::new());
        credentials.install("alice", "OPERATOR", "s3cret").unwrap();

        let metrics = Arc::new(Metrics::new());
        let observer = Arc::new(LoginObserver::new(Arc::clone(&metrics)));

        let dispatcher = Arc::new(MetadataDispatcher::new(
            Arc::clone(&store),
            AuthenticationMode::Local,
        ));
        let broadcaster =
            Arc::new(InvalidationBroadcaster::new(&FleetConfig::default()).unwrap());
        let service = Arc::new(MetadataService::new(
            dispatcher,
            broadcaster,
            Arc::clone(&metrics),
        ));
        let orchestrator = Arc::new(
            AuthenticationOrchestrator::new(
                Arc::clone(&store),
                credentials,
                AuthenticationMode::Local,
                DeploymentMode::OnPremise,
            )
            .on_success(Arc::clone(&observer) as Arc<dyn metafleet_auth::LoginSuccessHandler>)
            .on_failure(observer as Arc<dyn metafleet_auth::LoginFailureHandler>),
        );
        let evaluator = Arc::new(AuthorizationEvaluator::new(Arc::clone(&store)));

        let state = AppState {
            service,
            orchestrator,
            evaluator,
            metrics: Arc::clone(&metrics),
        };
        (TestServer::new(create_router(state)).unwrap(), metrics)
    }

    fn source_with_alice() -> InMemorySource {
        let source = InMemorySource::new();
        source.put_user(UserProfile {
            username: "alice".to_string(),
            tenant_id: TENANT,
            team_id: 10,
            role: "OPERATOR".to_string(),
            encrypted_password: None,
            switch_teams: false,
        });
        source.put_role_permission(
            TENANT,
            RolePermissionRow {
                role: "OPERATOR".to_string(),
                permission: PermissionType::ApproveTopics,
            },
        );
        source
    }

    #[tokio::test]
    async fn healthz_returns_ok() {
        let (server, _) = test_server(InMemorySource::new()).await;

        let response = server.get("/healthz").await;

        response.assert_status_ok();
        assert_eq!(response.text(), "ok");
    }

    #[tokio::test]
    async fn login_returns_the_resolved_context() {
        let (server, metrics) = test_server(source_with_alice()).await;

        let response = server
            .post("/login")
            .json(&json!({"username": "alice", "password": "s3cret"}))
            .await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body["username"], "alice");
        assert_eq!(body["role"], "OPERATOR");
        assert_eq!(body["tenant_id"], 1);
        assert_eq!(body["capabilities"]["approve_topics"], true);
        assert_eq!(body["capabilities"]["superadmin"], false);
        assert!(!body["session_id"].as_str().unwrap().is_empty());
        assert_eq!(metrics.logins_success(), 1);
    }

    #[tokio::test]
    async fn login_with_bad_password_is_unauthorized() {
        let (server, metrics) = test_server(source_with_alice()).await;

        let response = server
            .post("/login")
            .json(&json!({"username": "alice", "password": "wrong"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(metrics.logins_failed(), 1);
    }

    #[tokio::test]
    async fn permission_check_is_fail_closed() {
        let (server, _) = test_server(source_with_alice()).await;

        let response = server
            .post("/v1/permissions/check")
            .json(&json!({"username": "alice", "permissions": ["APPROVE_TOPICS"]}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["allowed"], true);

        // Intersection semantics: one held permission is enough.
        let response = server
            .post("/v1/permissions/check")
            .json(&json!({
                "username": "alice",
                "permissions": ["SHUTDOWN_SYSTEM", "APPROVE_TOPICS"]
            }))
            .await;
        assert_eq!(response.json::<serde_json::Value>()["allowed"], true);

        let response = server
            .post("/v1/permissions/check")
            .json(&json!({"username": "alice", "permissions": ["SHUTDOWN_SYSTEM"]}))
            .await;
        assert_eq!(response.json::<serde_json::Value>()["allowed"], false);

        let response = server
            .post("/v1/permissions/check")
            .json(&json!({"username": "nobody", "permissions": ["APPROVE_TOPICS"]}))
            .await;
        assert_eq!(response.json::<serde_json::Value>()["allowed"], false);
    }

    #[tokio::test]
    async fn permission_check_rejects_unknown_permission_strings() {
        let (server, _) = test_server(source_with_alice()).await;

        let response = server
            .post("/v1/permissions/check")
            .json(&json!({"username": "alice", "permissions": ["FLY_TO_MARS"]}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn reset_memory_cache_applies_known_events() {
        let source = InMemorySource::new();
        source.put_topic(
            TENANT,
            Topic {
                name: "orders".to_string(),
                environment_id: "dev".to_string(),
                team_id: 1,
            },
        );
        let (server, metrics) = test_server(source).await;

        let response = server
            .post("/resetMemoryCache")
            .json(&json!({
                "tenantId": 1,
                "entityType": "TOPICS",
                "entityValue": "orders",
                "operationType": "CREATE"
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["accepted"], true);
        assert_eq!(metrics.events_applied(), 1);
    }

    #[tokio::test]
    async fn reset_memory_cache_acknowledges_unknown_events() {
        let (server, metrics) = test_server(InMemorySource::new()).await;

        let response = server
            .post("/resetMemoryCache")
            .json(&json!({
                "tenantId": 1,
                "entityType": "WIDGETS",
                "entityValue": "na",
                "operationType": "CREATE"
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["accepted"], false);
        assert_eq!(metrics.events_ignored(), 1);
    }

    #[tokio::test]
    async fn notify_rejects_malformed_events() {
        let (server, _) = test_server(InMemorySource::new()).await;

        let response = server
            .post("/v1/metadata/notify")
            .json(&json!({
                "tenantId": 1,
                "entityType": "TOPICS",
                "entityValue": "na",
                "operationType": "MERGE"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn notify_applies_locally() {
        let source = InMemorySource::new();
        source.put_topic(
            TENANT,
            Topic {
                name: "orders".to_string(),
                environment_id: "dev".to_string(),
                team_id: 1,
            },
        );
        let (server, metrics) = test_server(source).await;

        let response = server
            .post("/v1/metadata/notify")
            .json(&json!({
                "tenantId": 1,
                "entityType": "TOPICS",
                "entityValue": "orders",
                "operationType": "CREATE"
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<serde_json::Value>()["applied"], true);
        assert_eq!(metrics.events_applied(), 1);
    }

    #[tokio::test]
    async fn promotion_order_endpoint_reflects_the_cache() {
        let source = InMemorySource::new();
        source.put_environment(
            TENANT,
            Environment {
                id: "dev".to_string(),
                name: "Dev".to_string(),
                cluster_id: "c1".to_string(),
                tenant_id: TENANT,
                associated_env_id: None,
            },
        );
        source.put_cluster(
            TENANT,
            KafkaCluster {
                cluster_id: "c1".to_string(),
                name: "main".to_string(),
                bootstrap_servers: "localhost:9092".to_string(),
            },
        );
        source.put_properties(
            TENANT,
            TenantProperties {
                topic_promotion_order: vec!["dev".to_string()],
                ..Default::default()
            },
        );
        let (server, _) = test_server(source).await;

        // Cold cache first.
        let response = server.get("/v1/tenants/1/promotion-order").await;
        response.assert_status_ok();
        assert_eq!(
            response.json::<serde_json::Value>()["environments"],
            json!([])
        );

        for (entity, op) in [
            ("ENVIRONMENT", "CREATE"),
            ("CLUSTER", "CREATE"),
            ("PROPERTIES", "UPDATE"),
        ] {
            server
                .post("/resetMemoryCache")
                .json(&json!({
                    "tenantId": 1,
                    "entityType": entity,
                    "entityValue": "na",
                    "operationType": op
                }))
                .await
                .assert_status_ok();
        }

        let response = server.get("/v1/tenants/1/promotion-order").await;
        assert_eq!(
            response.json::<serde_json::Value>()["environments"],
            json!(["dev"])
        );
    }

    #[tokio::test]
    async fn topic_summaries_group_by_name() {
        let source = InMemorySource::new();
        for env in ["dev", "prod"] {
            source.put_topic(
                TENANT,
                Topic {
                    name: "orders".to_string(),
                    environment_id: env.to_string(),
                    team_id: 3,
                },
            );
        }
        let (server, _) = test_server(source).await;
        server
            .post("/resetMemoryCache")
            .json(&json!({
                "tenantId": 1,
                "entityType": "TOPICS",
                "entityValue": "na",
                "operationType": "CREATE"
            }))
            .await
            .assert_status_ok();

        let response = server.get("/v1/tenants/1/topics").await;

        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "orders");
        assert_eq!(body[0]["environments"], json!(["dev", "prod"]));
    }

    #[tokio::test]
    async fn request_metrics_count_every_call() {
        let (server, metrics) = test_server(InMemorySource::new()).await;

        server.get("/healthz").await.assert_status_ok();
        server
            .post("/login")
            .json(&json!({"username": "x", "password": "y"}))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        assert_eq!(metrics.request_total(), 2);
        assert_eq!(metrics.request_success(), 1);
        assert_eq!(metrics.request_error(), 1);
    }
}
