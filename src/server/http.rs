//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Each connection runs on
//! its own task; shutdown stops accepting, then waits up to the configured
//! grace period for in-flight requests.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::{Body, Incoming};
use hyper::header::ORIGIN;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use hyper_util::server::graceful::GracefulShutdown;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{Args, StorageBackend};
use crate::db::MongoClient;
use crate::models::{
    CompetitiveAnalysis, ConversationCluster, DashboardStat, DiscussionTopic, Opportunity,
    PriorityAction, Risk, SentimentTrend,
};
use crate::resource::Resource;
use crate::routes::{self, error_response, method_not_allowed, route_not_found, BoxError};
use crate::server::cors::CorsPolicy;
use crate::services::ResourceService;
use crate::store::MongoStore;
use crate::types::ApiError;

/// Prefix for every resource route
pub const API_PREFIX: &str = "/api/v1";

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub cors: CorsPolicy,
    /// Backend actually in use (may differ from `args.storage` after a
    /// dev-mode fallback)
    pub storage: StorageBackend,
    pub priority_actions: ResourceService<PriorityAction>,
    pub dashboard_stats: ResourceService<DashboardStat>,
    pub risks: ResourceService<Risk>,
    pub opportunities: ResourceService<Opportunity>,
    pub sentiment_trends: ResourceService<SentimentTrend>,
    pub discussion_topics: ResourceService<DiscussionTopic>,
    pub competitive_analyses: ResourceService<CompetitiveAnalysis>,
    pub conversation_clusters: ResourceService<ConversationCluster>,
}

impl AppState {
    /// State backed by in-process stores
    pub fn in_memory(args: Args) -> Result<Self, ApiError> {
        Ok(Self {
            cors: CorsPolicy::from_args(&args.cors)?,
            storage: StorageBackend::Memory,
            priority_actions: ResourceService::in_memory(),
            dashboard_stats: ResourceService::in_memory(),
            risks: ResourceService::in_memory(),
            opportunities: ResourceService::in_memory(),
            sentiment_trends: ResourceService::in_memory(),
            discussion_topics: ResourceService::in_memory(),
            competitive_analyses: ResourceService::in_memory(),
            conversation_clusters: ResourceService::in_memory(),
            args,
        })
    }

    /// State backed by MongoDB collections; indexes are applied on open
    pub async fn with_mongo(args: Args, mongo: &MongoClient) -> Result<Self, ApiError> {
        Ok(Self {
            cors: CorsPolicy::from_args(&args.cors)?,
            storage: StorageBackend::Mongo,
            priority_actions: mongo_service(mongo).await?,
            dashboard_stats: mongo_service(mongo).await?,
            risks: mongo_service(mongo).await?,
            opportunities: mongo_service(mongo).await?,
            sentiment_trends: mongo_service(mongo).await?,
            discussion_topics: mongo_service(mongo).await?,
            competitive_analyses: mongo_service(mongo).await?,
            conversation_clusters: mongo_service(mongo).await?,
            args,
        })
    }
}

async fn mongo_service<R: Resource>(mongo: &MongoClient) -> Result<ResourceService<R>, ApiError> {
    let store = MongoStore::<R>::open(mongo).await?;
    Ok(ResourceService::new(Arc::new(store)))
}

/// Bind the configured address and serve until SIGINT/SIGTERM
pub async fn run(state: Arc<AppState>) -> Result<(), ApiError> {
    let addr = state.args.listen_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Naradai listening on {}", addr);
    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    serve(listener, state, shutdown_signal()).await
}

/// Accept connections on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<(), ApiError>
where
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, addr) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!("Error accepting connection: {:?}", e);
                        continue;
                    }
                };

                let state = Arc::clone(&state);
                let service = service_fn(move |req: Request<Incoming>| {
                    let state = Arc::clone(&state);
                    async move { Ok::<_, Infallible>(handle_request(state, req).await) }
                });

                let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                let conn = graceful.watch(conn);

                tokio::spawn(async move {
                    if let Err(err) = conn.await {
                        debug!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received, draining connections");
                break;
            }
        }
    }

    drop(listener);

    tokio::select! {
        _ = graceful.shutdown() => {
            info!("All connections closed");
        }
        _ = tokio::time::sleep(state.args.shutdown_grace()) => {
            warn!(
                "Grace period of {}s elapsed, closing remaining connections",
                state.args.shutdown_grace_secs
            );
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Entry point for every request: CORS, deadline, routing and access log
pub async fn handle_request<B>(state: Arc<AppState>, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let request_id = Uuid::new_v4();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let origin = req.headers().get(ORIGIN).cloned();
    let span = info_span!("request", id = %request_id, %method, %path);

    async move {
        let started = Instant::now();

        let mut response = if method == Method::OPTIONS {
            state.cors.preflight(origin.as_ref())
        } else {
            let deadline = state.args.request_timeout();
            match tokio::time::timeout(deadline, route(&state, req, &path)).await {
                Ok(response) => response,
                Err(_) => {
                    let err = ApiError::Timeout(state.args.request_timeout_ms);
                    warn!("{}", err);
                    error_response(&err, "Request timed out")
                }
            }
        };

        state.cors.apply(origin.as_ref(), &mut response);

        info!(
            status = response.status().as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "{} {}",
            method,
            path
        );
        response
    }
    .instrument(span)
    .await
}

/// Route to the health probe or a resource handler
async fn route<B>(state: &AppState, req: Request<B>, path: &str) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    if path == "/health" {
        return if *req.method() == Method::GET {
            routes::health_check()
        } else {
            method_not_allowed(req.method(), path)
        };
    }

    let Some(rest) = path.strip_prefix(API_PREFIX).and_then(|p| p.strip_prefix('/')) else {
        return route_not_found(path);
    };

    let (resource, subpath) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };

    match resource {
        r if r == PriorityAction::PATH => {
            routes::handle_priority_actions_request(req, &state.priority_actions, subpath).await
        }
        r if r == DashboardStat::PATH => {
            routes::handle_resource_request(req, &state.dashboard_stats, subpath).await
        }
        r if r == Risk::PATH => routes::handle_resource_request(req, &state.risks, subpath).await,
        r if r == Opportunity::PATH => {
            routes::handle_resource_request(req, &state.opportunities, subpath).await
        }
        r if r == SentimentTrend::PATH => {
            routes::handle_resource_request(req, &state.sentiment_trends, subpath).await
        }
        r if r == DiscussionTopic::PATH => {
            routes::handle_resource_request(req, &state.discussion_topics, subpath).await
        }
        r if r == CompetitiveAnalysis::PATH => {
            routes::handle_resource_request(req, &state.competitive_analyses, subpath).await
        }
        r if r == ConversationCluster::PATH => {
            routes::handle_resource_request(req, &state.conversation_clusters, subpath).await
        }
        _ => route_not_found(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bson::oid::ObjectId;
    use chrono::{DateTime, Utc};
    use clap::Parser;
    use http_body_util::BodyExt;
    use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE};
    use hyper::StatusCode;
    use serde_json::{json, Value};

    use crate::models::ActiveFilter;
    use crate::resource::{Page, PageRequest, Record};
    use crate::store::ResourceStore;

    fn state(extra: &[&str]) -> Arc<AppState> {
        let mut argv = vec!["naradai", "--storage", "memory"];
        argv.extend_from_slice(extra);
        let args = Args::try_parse_from(argv).unwrap();
        Arc::new(AppState::in_memory(args).unwrap())
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Full<Bytes>> {
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> (StatusCode, Value) {
        let response = handle_request(Arc::clone(state), req).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn action_body() -> Value {
        json!({
            "priority": "critical",
            "title": "Fix checkout",
            "description": "Checkout fails for saved cards",
            "impact": "Critical",
            "effort": "Low",
            "recommendation": "Roll back the payment SDK update",
            "mentions": 12,
            "sentiment": -0.8,
            "trend": "increasing",
            "icon": "alert"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let state = state(&[]);
        let (status, body) = send(&state, request("GET", "/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_create_priority_action() {
        let state = state(&[]);
        let (status, body) = send(
            &state,
            request("POST", "/api/v1/priority-actions", Some(action_body())),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Priority action created successfully");
        assert_eq!(body["data"]["status"], "not-started");
        assert_eq!(body["data"]["id"].as_str().unwrap().len(), 24);
        assert_eq!(body["data"]["created_at"], body["data"]["updated_at"]);
    }

    #[tokio::test]
    async fn test_status_update() {
        let state = state(&[]);
        let (_, created) = send(
            &state,
            request("POST", "/api/v1/priority-actions", Some(action_body())),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/priority-actions/{}/status", id);

        let (status, body) = send(&state, request("PUT", &uri, Some(json!({ "status": "done" })))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            &state,
            request("PUT", &uri, Some(json!({ "status": "in-progress" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Status updated successfully");
        assert_eq!(body["data"]["status"], "in-progress");
        assert_eq!(body["data"]["title"], "Fix checkout");
    }

    #[tokio::test]
    async fn test_invalid_enum_is_rejected() {
        let state = state(&[]);
        let cluster = json!({ "theme": "Refunds", "size": 3, "sentiment": 0.1, "trend": "sideways" });
        let (status, body) = send(
            &state,
            request("POST", "/api/v1/conversation-clusters", Some(cluster)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Validation failed"));
    }

    #[tokio::test]
    async fn test_invalid_enum_on_update_leaves_record_unchanged() {
        let state = state(&[]);
        let cluster = json!({ "theme": "Refunds", "size": 3, "sentiment": 0.1, "trend": "up" });
        let (_, created) = send(
            &state,
            request("POST", "/api/v1/conversation-clusters", Some(cluster)),
        )
        .await;
        let id = created["data"]["id"].as_str().unwrap().to_string();
        let item = format!("/api/v1/conversation-clusters/{}", id);

        let update = json!({ "theme": "Refunds v2", "size": 9, "sentiment": 0.5, "trend": "sideways" });
        let (status, body) = send(&state, request("PUT", &item, Some(update))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Validation failed"));

        let (status, fetched) = send(&state, request("GET", &item, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["data"], created["data"]);
        assert_eq!(fetched["data"]["updated_at"], created["data"]["updated_at"]);
    }

    #[tokio::test]
    async fn test_null_lists_are_accepted() {
        let state = state(&[]);
        let risk = json!({
            "title": "Price backlash",
            "description": "Complaints about the new pricing tier",
            "severity": "medium",
            "probability": 50,
            "impact_assessment": "Churn among small accounts",
            "trend": "stable",
            "indicators": null,
            "mitigation_strategy": null
        });
        let (status, body) = send(&state, request("POST", "/api/v1/risks", Some(risk))).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["indicators"], json!([]));
        assert_eq!(body["data"]["mitigation_strategy"], json!([]));
    }

    #[tokio::test]
    async fn test_oversized_body_is_bad_request() {
        let state = state(&[]);
        let padding = "x".repeat(routes::MAX_BODY_BYTES + 1);
        let topic = json!({ "name": padding, "volume": 1, "sentiment_score": 0.0 });
        let (status, body) = send(&state, request("POST", "/api/v1/discussion-topics", Some(topic))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

        let (_, list) = send(&state, request("GET", "/api/v1/discussion-topics", None)).await;
        assert_eq!(list["total"], 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let state = state(&[]);
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/risks")
            .body(Full::new(Bytes::from_static(b"{not json")))
            .unwrap();
        let (status, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_malformed_id_is_not_found() {
        let state = state(&[]);
        for method in ["GET", "PUT", "DELETE"] {
            let body = (method == "PUT").then(|| json!({ "name": "Acme", "share_of_voice": 1.0, "sentiment": 2.0 }));
            let (status, body) = send(
                &state,
                request(method, "/api/v1/competitive-analyses/not-an-id", body),
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", method);
            assert_eq!(body["error"], "Competitive analysis not found");
        }
    }

    #[tokio::test]
    async fn test_crud_round() {
        let state = state(&[]);
        let topic = json!({ "name": "Shipping", "volume": 10, "sentiment_score": -0.3 });
        let (_, created) = send(&state, request("POST", "/api/v1/discussion-topics", Some(topic))).await;
        let id = created["data"]["id"].as_str().unwrap().to_string();
        let item = format!("/api/v1/discussion-topics/{}", id);

        let update = json!({ "name": "Shipping delays", "volume": 25, "sentiment_score": -0.5, "color": "#f00" });
        let (status, updated) = send(&state, request("PUT", &item, Some(update))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["message"], "Discussion topic updated successfully");
        assert_eq!(updated["data"]["created_at"], created["data"]["created_at"]);
        assert_ne!(updated["data"]["updated_at"], created["data"]["updated_at"]);

        let (status, body) = send(&state, request("DELETE", &item, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true, "message": "Discussion topic deleted successfully" }));

        let (status, _) = send(&state, request("GET", &item, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_filters_and_total() {
        let state = state(&[]);
        for (name, active) in [("Acme", true), ("Globex", true), ("Initech", false)] {
            let row = json!({ "name": name, "share_of_voice": 10.0, "sentiment": 50.0, "is_active": active });
            send(&state, request("POST", "/api/v1/competitive-analyses", Some(row))).await;
        }

        let (status, body) = send(
            &state,
            request("GET", "/api/v1/competitive-analyses?is_active=true&limit=1", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["is_active"], true);

        let (status, _) = send(&state, request("GET", "/api/v1/risks?severity=extreme", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_and_wrong_method() {
        let state = state(&[]);
        let (status, _) = send(&state, request("GET", "/api/v1/widgets", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, request("GET", "/api/v1/risks/a/b", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, request("GET", "/api/v1/risks/abc/status", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&state, request("PATCH", "/api/v1/risks", None)).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let state = state(&[]);
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/risks")
            .header("origin", "http://localhost:3000")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handle_request(Arc::clone(&state), req).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(response.headers()[ACCESS_CONTROL_MAX_AGE], "43200");

        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/v1/risks")
            .header("origin", "https://evil.example")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handle_request(Arc::clone(&state), req).await;
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    /// Store that never answers in time
    struct SlowStore;

    #[async_trait]
    impl ResourceStore<ConversationCluster> for SlowStore {
        async fn create(&self, _body: ConversationCluster) -> crate::types::Result<Record<ConversationCluster>> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Err(ApiError::Internal("unreachable".into()))
        }

        async fn find_page(
            &self,
            _filter: &ActiveFilter,
            _page: PageRequest,
        ) -> crate::types::Result<Page<ConversationCluster>> {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Err(ApiError::Internal("unreachable".into()))
        }

        async fn find_by_id(&self, _id: &ObjectId) -> crate::types::Result<Option<Record<ConversationCluster>>> {
            Ok(None)
        }

        async fn update(
            &self,
            _id: &ObjectId,
            _body: &ConversationCluster,
            _updated_at: DateTime<Utc>,
        ) -> crate::types::Result<bool> {
            Ok(false)
        }

        async fn delete(&self, _id: &ObjectId) -> crate::types::Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_request_deadline() {
        let args = Args::try_parse_from(["naradai", "--request-timeout-ms", "20"]).unwrap();
        let mut state = AppState::in_memory(args).unwrap();
        state.conversation_clusters = ResourceService::new(Arc::new(SlowStore));
        let state = Arc::new(state);

        let (status, body) = send(&state, request("GET", "/api/v1/conversation-clusters", None)).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["success"], false);
    }
}
