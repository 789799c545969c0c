use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{
    AgentError, AgentExecutor, AgentRun, AgentTask, AgentTool, BrowserProvider, BrowserSession,
};
use crate::config::AgentConfig;

const SESSIONS_PATH: &str = "sessions";
const TASKS_PATH: &str = "tasks";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Agent runtime reached over HTTP.
///
/// Tasks are created with `POST /tasks` and polled with `GET /tasks/{id}` until they reach a
/// terminal status. A task abandoned before then (deadline, cancellation, failed poll) is
/// stopped with `DELETE /tasks/{id}`. Sessions map to `POST /sessions` and
/// `DELETE /sessions/{id}`.
#[derive(Debug, Clone)]
pub struct HttpAgentRuntime {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
    poll_interval: Duration,
}

impl HttpAgentRuntime {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        poll_interval: Duration,
    ) -> Result<Self, AgentError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| AgentError::Unreachable(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
            poll_interval,
        })
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        Self::new(
            config.runtime_url.clone(),
            config.api_key.clone(),
            config.poll_interval,
        )
    }

    fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.api_key.as_deref() {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send<T>(&self, request: RequestBuilder) -> Result<T, AgentError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|err| AgentError::Unreachable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| AgentError::Decode(err.to_string()))
    }

    async fn poll(&self, task_id: &str) -> Result<AgentRun, AgentError> {
        let url = self.build_url(&format!("{TASKS_PATH}/{task_id}"));
        loop {
            let view: TaskView = self.send(self.http.get(&url)).await?;
            debug!(task = task_id, status = ?view.status, steps = view.steps, "polled agent task");
            if view.status.is_terminal() {
                return Ok(view.into_run());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn stop(&self, task_id: &str) -> Result<(), AgentError> {
        let url = self.build_url(&format!("{TASKS_PATH}/{task_id}"));
        let response = self
            .authorized(self.http.delete(url))
            .send()
            .await
            .map_err(|err| AgentError::Unreachable(err.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(AgentError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

/// Remote task that is stopped on drop unless it reached a terminal status.
struct PendingTask {
    runtime: HttpAgentRuntime,
    id: Option<String>,
}

impl PendingTask {
    fn settled(mut self) {
        self.id = None;
    }
}

impl Drop for PendingTask {
    fn drop(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let runtime = self.runtime.clone();
                handle.spawn(async move {
                    match runtime.stop(&id).await {
                        Ok(()) => info!(task = %id, "abandoned agent task stopped"),
                        Err(err) => warn!(task = %id, error = %err, "failed to stop abandoned agent task"),
                    }
                });
            }
            Err(_) => warn!(task = %id, "no runtime available to stop abandoned agent task"),
        }
    }
}

#[async_trait]
impl AgentExecutor for HttpAgentRuntime {
    async fn execute(&self, task: AgentTask) -> Result<AgentRun, AgentError> {
        let body = CreateTaskRequest::from(&task);
        let created: Created = self
            .send(self.http.post(self.build_url(TASKS_PATH)).json(&body))
            .await?;
        info!(task = %created.id, model = task.model.as_str(), "agent task created");

        let pending = PendingTask {
            runtime: self.clone(),
            id: Some(created.id.clone()),
        };
        let run = self.poll(&created.id).await?;
        pending.settled();
        Ok(run)
    }
}

#[async_trait]
impl BrowserProvider for HttpAgentRuntime {
    async fn open(&self) -> Result<BrowserSession, AgentError> {
        let created: Created = self
            .send(
                self.http
                    .post(self.build_url(SESSIONS_PATH))
                    .json(&CreateSessionRequest { keep_alive: true }),
            )
            .await
            .map_err(|err| AgentError::Session(err.to_string()))?;
        Ok(BrowserSession { id: created.id })
    }

    async fn close(&self, session: &BrowserSession) -> Result<(), AgentError> {
        let url = self.build_url(&format!("{SESSIONS_PATH}/{}", session.id));
        let response = self
            .authorized(self.http.delete(url))
            .send()
            .await
            .map_err(|err| AgentError::Session(err.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Ok(()),
            status => Err(AgentError::Session(format!(
                "runtime refused to close session {} ({status})",
                session.id
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest {
    keep_alive: bool,
}

#[derive(Debug, Serialize)]
struct CreateTaskRequest<'a> {
    task: &'a str,
    llm: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    tools: &'a [AgentTool],
    available_file_paths: &'a [PathBuf],
    #[serde(skip_serializing_if = "Option::is_none")]
    output_schema: Option<&'a serde_json::Value>,
}

impl<'a> From<&'a AgentTask> for CreateTaskRequest<'a> {
    fn from(task: &'a AgentTask) -> Self {
        Self {
            task: &task.instructions,
            llm: task.model.as_str(),
            session_id: task.session.as_ref().map(|session| session.id.as_str()),
            tools: &task.tools,
            available_file_paths: &task.available_file_paths,
            output_schema: task.output_schema.as_ref(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TaskStatus {
    Created,
    Started,
    Running,
    Paused,
    Finished,
    Failed,
    Stopped,
}

impl TaskStatus {
    fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Stopped)
    }
}

#[derive(Debug, Deserialize)]
struct TaskView {
    status: TaskStatus,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    is_success: Option<bool>,
    #[serde(default)]
    steps: u32,
    #[serde(default)]
    error: Option<String>,
}

impl TaskView {
    fn into_run(self) -> AgentRun {
        let is_done = self.status == TaskStatus::Finished && self.is_success.unwrap_or(true);
        let mut errors = Vec::new();
        if let Some(error) = self.error.filter(|error| !error.trim().is_empty()) {
            errors.push(error);
        } else if !is_done {
            errors.push(format!("agent task ended with status {:?}", self.status));
        }

        AgentRun {
            final_result: self.output,
            is_done,
            steps: self.steps,
            errors,
        }
    }
}
