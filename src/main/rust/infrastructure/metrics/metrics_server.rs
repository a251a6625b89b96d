use std::future::Future;
use std::sync::Arc;

use warp::Filter;

use super::PrometheusReporter;
use crate::application::services::SessionManager;

/// Health check response structure
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    active_sessions: Option<usize>,
}

pub async fn serve_metrics<F>(port: u16, manager: Arc<SessionManager>, shutdown: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    // CORS configuration for browser access
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(vec!["Content-Type"]);

    let with_manager = warp::any().map(move || manager.clone());

    let metrics_route = warp::path("metrics").map(|| {
        let body = PrometheusReporter::gather_metrics();
        warp::reply::with_header(body, "content-type", "text/plain; version=0.0.4; charset=utf-8")
    });

    let health_route = warp::path("health")
        .and(with_manager.clone())
        .then(|manager: Arc<SessionManager>| async move {
            let response = HealthResponse {
                status: "healthy",
                service: "multistream-relay",
                version: env!("CARGO_PKG_VERSION"),
                active_sessions: Some(manager.active_count().await),
            };
            warp::reply::json(&response)
        });

    // Liveness probe endpoint (minimal check - is the process running?)
    let liveness_route =
        warp::path("livez").map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Readiness probe endpoint (can the service accept traffic?)
    let readiness_route = warp::path("readyz").map(|| {
        warp::reply::json(&HealthResponse {
            status: "ready",
            service: "multistream-relay",
            version: env!("CARGO_PKG_VERSION"),
            active_sessions: None,
        })
    });

    // Read-only session snapshots for dashboards
    let sessions_route = warp::path("sessions")
        .and(with_manager)
        .then(|manager: Arc<SessionManager>| async move {
            warp::reply::json(&manager.sessions().await)
        });

    let routes = metrics_route
        .or(health_route)
        .or(liveness_route)
        .or(readiness_route)
        .or(sessions_route)
        .with(cors);

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], port), shutdown);

    tracing::info!("Metrics server listening on http://{}", addr);

    server.await;
}
