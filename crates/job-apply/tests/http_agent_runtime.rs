//! The HTTP agent adapter against an in-process stand-in for the agent runtime.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use job_apply::agent::{
    AgentError, AgentExecutor, AgentTask, BrowserProvider, HttpAgentRuntime, ModelHandle,
};

#[derive(Default)]
struct RuntimeState {
    created_tasks: Mutex<Vec<Value>>,
    polls: Mutex<u32>,
    closed_sessions: Mutex<Vec<String>>,
    stopped_tasks: Mutex<Vec<String>>,
    stalled: Mutex<bool>,
    authorization: Mutex<Vec<String>>,
}

fn record_auth(state: &RuntimeState, headers: &HeaderMap) {
    if let Some(value) = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        state
            .authorization
            .lock()
            .expect("auth mutex poisoned")
            .push(value.to_string());
    }
}

async fn open_session(State(state): State<Arc<RuntimeState>>, headers: HeaderMap) -> Json<Value> {
    record_auth(&state, &headers);
    Json(json!({ "id": "session-7" }))
}

async fn close_session(
    State(state): State<Arc<RuntimeState>>,
    Path(id): Path<String>,
) -> StatusCode {
    state
        .closed_sessions
        .lock()
        .expect("session mutex poisoned")
        .push(id);
    StatusCode::NO_CONTENT
}

async fn create_task(
    State(state): State<Arc<RuntimeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_auth(&state, &headers);
    if body["llm"] == "broken-model" {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": "unknown model" })),
        );
    }
    if body["llm"] == "stalled-model" {
        *state.stalled.lock().expect("stall mutex poisoned") = true;
    }
    state
        .created_tasks
        .lock()
        .expect("task mutex poisoned")
        .push(body);
    (StatusCode::CREATED, Json(json!({ "id": "task-1" })))
}

async fn stop_task(State(state): State<Arc<RuntimeState>>, Path(id): Path<String>) -> StatusCode {
    state
        .stopped_tasks
        .lock()
        .expect("stop mutex poisoned")
        .push(id);
    StatusCode::NO_CONTENT
}

async fn task_status(State(state): State<Arc<RuntimeState>>) -> Json<Value> {
    let stalled = *state.stalled.lock().expect("stall mutex poisoned");
    let mut polls = state.polls.lock().expect("poll mutex poisoned");
    *polls += 1;
    if stalled || *polls < 3 {
        Json(json!({ "status": "running", "steps": *polls }))
    } else {
        Json(json!({
            "status": "finished",
            "is_success": true,
            "output": "{\"summary\": \"done\", \"fields\": [], \"submitted\": true}",
            "steps": 12
        }))
    }
}

async fn spawn_runtime() -> (String, Arc<RuntimeState>) {
    let state = Arc::new(RuntimeState::default());
    let app = Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/:id", delete(close_session))
        .route("/tasks", post(create_task))
        .route("/tasks/:id", get(task_status).delete(stop_task))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub runtime");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub runtime serves");
    });

    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn task_is_created_and_polled_until_finished() {
    let (endpoint, state) = spawn_runtime().await;
    let runtime = HttpAgentRuntime::new(
        endpoint,
        Some("secret-key".to_string()),
        Duration::from_millis(5),
    )
    .expect("client builds");

    let session = runtime.open().await.expect("session opens");
    assert_eq!(session.id, "session-7");

    let task = AgentTask::new("apply to the job", ModelHandle::new("gpt-4o-mini"))
        .in_session(&session)
        .with_output_schema(json!({ "type": "object" }));
    let run = runtime.execute(task).await.expect("task completes");

    assert!(run.is_done);
    assert_eq!(run.steps, 12);
    assert!(run.final_output().expect("output").contains("submitted"));
    assert_eq!(*state.polls.lock().expect("poll mutex poisoned"), 3);

    let created = state.created_tasks.lock().expect("task mutex poisoned").clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["session_id"], "session-7");
    assert_eq!(created[0]["llm"], "gpt-4o-mini");
    assert_eq!(created[0]["output_schema"]["type"], "object");

    let auth = state.authorization.lock().expect("auth mutex poisoned").clone();
    assert!(auth.iter().all(|value| value == "Bearer secret-key"));
    assert_eq!(auth.len(), 2);

    runtime.close(&session).await.expect("session closes");
    assert_eq!(
        *state.closed_sessions.lock().expect("session mutex poisoned"),
        vec!["session-7".to_string()]
    );
}

#[tokio::test]
async fn rejected_task_surfaces_status_and_body() {
    let (endpoint, _state) = spawn_runtime().await;
    let runtime =
        HttpAgentRuntime::new(endpoint, None, Duration::from_millis(5)).expect("client builds");

    let error = runtime
        .execute(AgentTask::new("apply", ModelHandle::new("broken-model")))
        .await
        .expect_err("runtime rejects");

    match error {
        AgentError::Rejected { status, body } => {
            assert_eq!(status, 422);
            assert!(body.contains("unknown model"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_runtime_is_reported() {
    let runtime = HttpAgentRuntime::new("http://127.0.0.1:9", None, Duration::from_millis(5))
        .expect("client builds");

    let error = runtime.open().await.expect_err("nothing listens");
    assert!(matches!(error, AgentError::Session(_)));
}

#[tokio::test]
async fn task_abandoned_at_the_deadline_is_stopped() {
    let (endpoint, state) = spawn_runtime().await;
    let runtime =
        HttpAgentRuntime::new(endpoint, None, Duration::from_millis(5)).expect("client builds");

    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        runtime.execute(AgentTask::new("apply", ModelHandle::new("stalled-model"))),
    )
    .await;
    assert!(outcome.is_err(), "stalled task never finishes");

    let mut stopped = Vec::new();
    for _ in 0..100 {
        stopped = state.stopped_tasks.lock().expect("stop mutex poisoned").clone();
        if !stopped.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(stopped, vec!["task-1".to_string()]);
}

#[tokio::test]
async fn finished_task_is_not_stopped() {
    let (endpoint, state) = spawn_runtime().await;
    let runtime =
        HttpAgentRuntime::new(endpoint, None, Duration::from_millis(5)).expect("client builds");

    runtime
        .execute(AgentTask::new("apply", ModelHandle::new("gpt-4o-mini")))
        .await
        .expect("task completes");
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(state
        .stopped_tasks
        .lock()
        .expect("stop mutex poisoned")
        .is_empty());
}
