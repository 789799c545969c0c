use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

use job_apply::agent::{AgentError, AgentExecutor, AgentRun, AgentTask, ModelHandle};
use job_apply::workflows::research::{research_router, CompanyResearcher};

struct CannedAgent {
    output: Result<String, String>,
    instructions: Mutex<Vec<String>>,
}

impl CannedAgent {
    fn answering(output: &str) -> Self {
        Self {
            output: Ok(output.to_string()),
            instructions: Mutex::new(Vec::new()),
        }
    }

    fn failing(reason: &str) -> Self {
        Self {
            output: Err(reason.to_string()),
            instructions: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AgentExecutor for CannedAgent {
    async fn execute(&self, task: AgentTask) -> Result<AgentRun, AgentError> {
        self.instructions
            .lock()
            .expect("instruction mutex poisoned")
            .push(task.instructions);
        match &self.output {
            Ok(output) => Ok(AgentRun::completed(output.clone())),
            Err(reason) => Err(AgentError::Unreachable(reason.clone())),
        }
    }
}

async fn research(agent: Arc<CannedAgent>, company: &str) -> (StatusCode, Value) {
    let researcher = CompanyResearcher::new(
        agent,
        ModelHandle::new("gpt-4.1"),
        Duration::from_secs(5),
    );
    let response = research_router(Arc::new(researcher))
        .oneshot(
            axum::http::Request::post("/deep_research")
                .header(axum::http::header::CONTENT_TYPE, "application/json")
                .body(axum::body::Body::from(
                    json!({ "company_name": company }).to_string(),
                ))
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
async fn acme_corp_research_has_summary_and_recommendation() {
    let agent = Arc::new(CannedAgent::answering(
        "Here is what I found:\n```json\n{\"summary\": \"Acme Corp manufactures industrial tools.\", \"recommendation\": \"Worth applying; reviews praise the culture.\"}\n```",
    ));

    let (status, payload) = research(agent.clone(), "Acme Corp").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["success"], true);
    assert_eq!(payload["message"], "Research completed for Acme Corp");
    assert!(!payload["data"]["summary"].as_str().unwrap_or_default().is_empty());
    assert!(!payload["data"]["recommendation"]
        .as_str()
        .unwrap_or_default()
        .is_empty());

    let instructions = agent
        .instructions
        .lock()
        .expect("instruction mutex poisoned")
        .clone();
    assert_eq!(instructions.len(), 1);
    assert!(instructions[0].contains("google Acme Corp"));
}

#[tokio::test]
async fn unreadable_answer_falls_back_to_canned_research() {
    let agent = Arc::new(CannedAgent::answering("I could not load the page."));

    let (status, payload) = research(agent, "Acme Corp").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        payload["data"]["summary"],
        "Unable to research Acme Corp due to technical issues."
    );
    assert_eq!(
        payload["data"]["recommendation"],
        "Research failed - please try again later."
    );
}

#[tokio::test]
async fn agent_failure_is_unsuccessful() {
    let agent = Arc::new(CannedAgent::failing("connection refused"));

    let (status, payload) = research(agent, "Acme Corp").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["success"], false);
    assert!(payload["data"].is_null());
}

#[tokio::test]
async fn blank_company_is_rejected() {
    let agent = Arc::new(CannedAgent::answering("{}"));

    let (status, payload) = research(agent.clone(), "   ").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(payload["detail"].is_string());
    assert!(agent
        .instructions
        .lock()
        .expect("instruction mutex poisoned")
        .is_empty());
}
