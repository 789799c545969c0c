use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{CompanyResearch, CompanyResearcher, ResearchError};
use crate::agent::AgentExecutor;

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub company_name: String,
}

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<CompanyResearch>,
}

pub fn research_router<E>(researcher: Arc<CompanyResearcher<E>>) -> Router
where
    E: AgentExecutor + ?Sized + 'static,
{
    Router::new()
        .route("/deep_research", post(research_handler::<E>))
        .with_state(researcher)
}

pub(crate) async fn research_handler<E>(
    State(researcher): State<Arc<CompanyResearcher<E>>>,
    axum::Json(request): axum::Json<ResearchRequest>,
) -> Response
where
    E: AgentExecutor + ?Sized + 'static,
{
    match researcher.research(&request.company_name).await {
        Ok(research) => (
            StatusCode::OK,
            axum::Json(ResearchResponse {
                success: true,
                message: format!("Research completed for {}", request.company_name.trim()),
                data: Some(research),
            }),
        )
            .into_response(),
        Err(ResearchError::EmptyCompany) => {
            let payload = json!({ "detail": ResearchError::EmptyCompany.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(error) => {
            tracing::warn!(error = %error, "company research failed");
            (
                StatusCode::OK,
                axum::Json(ResearchResponse {
                    success: false,
                    message: format!("Research failed: {error}"),
                    data: None,
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentError, AgentRun, AgentTask};
    use async_trait::async_trait;
    use std::time::Duration;
    use tower::ServiceExt;

    struct CannedAgent(Result<AgentRun, AgentError>);

    #[async_trait]
    impl AgentExecutor for CannedAgent {
        async fn execute(&self, _task: AgentTask) -> Result<AgentRun, AgentError> {
            self.0.clone()
        }
    }

    fn router(result: Result<AgentRun, AgentError>) -> Router {
        research_router(Arc::new(CompanyResearcher::new(
            Arc::new(CannedAgent(result)),
            crate::agent::ModelHandle::new("gpt-4.1"),
            Duration::from_secs(5),
        )))
    }

    async fn post(router: Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                axum::http::Request::post("/deep_research")
                    .header(axum::http::header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(body.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&bytes).expect("json payload"))
    }

    #[tokio::test]
    async fn unreadable_output_returns_fallback_answer() {
        let (status, payload) = post(
            router(Ok(AgentRun::completed("Sorry, search is unavailable."))),
            json!({ "company_name": "Globex" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["success"], true);
        assert_eq!(
            payload["data"]["summary"],
            "Unable to research Globex due to technical issues."
        );
    }

    #[tokio::test]
    async fn agent_failure_reports_unsuccessful() {
        let (status, payload) = post(
            router(Err(AgentError::Unreachable("connection refused".to_string()))),
            json!({ "company_name": "Globex" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["success"], false);
        assert!(payload["data"].is_null());
    }

    #[tokio::test]
    async fn blank_company_is_rejected() {
        let (status, _) = post(
            router(Ok(AgentRun::completed("{}"))),
            json!({ "company_name": "  " }),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
