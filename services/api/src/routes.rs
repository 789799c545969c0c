use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use job_apply::agent::{AgentExecutor, BrowserProvider};
use job_apply::workflows::application::{application_router, ApplicationService};
use job_apply::workflows::research::{research_router, CompanyResearcher};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

const SERVICE_NAME: &str = "Job Application API";

#[derive(Debug, Serialize)]
pub(crate) struct ServiceInfo {
    pub(crate) name: &'static str,
    pub(crate) version: &'static str,
    pub(crate) endpoints: BTreeMap<&'static str, &'static str>,
}

pub(crate) fn with_service_routes<E, B>(
    application: Arc<ApplicationService<E, B>>,
    research: Arc<CompanyResearcher<E>>,
) -> axum::Router
where
    E: AgentExecutor + ?Sized + 'static,
    B: BrowserProvider + ?Sized + 'static,
{
    application_router(application)
        .merge(research_router(research))
        .route("/", axum::routing::get(service_info))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn service_info() -> Json<ServiceInfo> {
    let endpoints = BTreeMap::from([
        ("apply", "POST /apply/{employer_id}"),
        ("apply_test", "POST /apply/{employer_id}/test"),
        ("deep_research", "POST /deep_research"),
        ("health", "GET /health"),
    ]);

    Json(ServiceInfo {
        name: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints,
    })
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
