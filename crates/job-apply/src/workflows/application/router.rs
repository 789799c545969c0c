use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use super::orchestrator::{ApplicationReport, ApplyError};
use super::service::{ApplicationService, ApplicationServiceError, ApplySubmission};
use crate::agent::{AgentExecutor, BrowserProvider};

/// Response envelope shared by the apply endpoints.
#[derive(Debug, Serialize)]
pub struct ApplyResponse {
    pub success: bool,
    pub message: String,
    pub result: Option<ApplicationReport>,
}

/// Router builder exposing the apply endpoints.
pub fn application_router<E, B>(service: Arc<ApplicationService<E, B>>) -> Router
where
    E: AgentExecutor + ?Sized + 'static,
    B: BrowserProvider + ?Sized + 'static,
{
    Router::new()
        .route("/apply/:employer_id", post(apply_handler::<E, B>))
        .route("/apply/:employer_id/test", post(apply_test_handler::<E, B>))
        .with_state(service)
}

pub(crate) async fn apply_handler<E, B>(
    State(service): State<Arc<ApplicationService<E, B>>>,
    Path(employer_id): Path<String>,
    axum::Json(submission): axum::Json<ApplySubmission>,
) -> Response
where
    E: AgentExecutor + ?Sized + 'static,
    B: BrowserProvider + ?Sized + 'static,
{
    let result = service.apply(&employer_id, submission).await;
    respond(result, "Application submitted successfully", "Application failed")
}

pub(crate) async fn apply_test_handler<E, B>(
    State(service): State<Arc<ApplicationService<E, B>>>,
    Path(employer_id): Path<String>,
) -> Response
where
    E: AgentExecutor + ?Sized + 'static,
    B: BrowserProvider + ?Sized + 'static,
{
    let result = service.apply_with_fixtures(&employer_id).await;
    respond(
        result,
        "Test application submitted successfully using mock data",
        "Test application failed",
    )
}

fn respond(
    result: Result<ApplicationReport, ApplicationServiceError>,
    success_message: &str,
    failure_prefix: &str,
) -> Response {
    match result {
        Ok(report) => (
            StatusCode::OK,
            axum::Json(ApplyResponse {
                success: true,
                message: success_message.to_string(),
                result: Some(report),
            }),
        )
            .into_response(),
        Err(error) if error.is_not_found() => {
            let payload = json!({ "detail": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(ApplicationServiceError::Apply(ApplyError::NotSubmitted { report })) => {
            warn!(employer = %report.employer_id, "application run ended without submission");
            (
                StatusCode::OK,
                axum::Json(ApplyResponse {
                    success: false,
                    message: format!("{failure_prefix}: the form was not submitted"),
                    result: Some(*report),
                }),
            )
                .into_response()
        }
        Err(other) => {
            warn!(error = %other, "application run failed");
            (
                StatusCode::OK,
                axum::Json(ApplyResponse {
                    success: false,
                    message: format!("{failure_prefix}: {other}"),
                    result: None,
                }),
            )
                .into_response()
        }
    }
}
