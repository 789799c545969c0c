//! Capability interface for the external autonomous browser agent.
//!
//! Browser control, page understanding, and model inference live outside this crate. The
//! orchestrator only sees the two traits below, so production wiring can point them at the
//! HTTP agent runtime while tests substitute in-memory fakes.

mod http;
mod session;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpAgentRuntime;
pub use session::SessionGuard;

/// Runs one agent task to completion.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(&self, task: AgentTask) -> Result<AgentRun, AgentError>;
}

/// Creates and tears down keep-alive browser sessions.
#[async_trait]
pub trait BrowserProvider: Send + Sync {
    async fn open(&self) -> Result<BrowserSession, AgentError>;
    async fn close(&self, session: &BrowserSession) -> Result<(), AgentError>;
}

/// Handle to a live browser session owned by a single application run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserSession {
    pub id: String,
}

/// Language model the agent should plan with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelHandle(pub String);

impl ModelHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Custom action exposed to the agent in addition to its built-in browser primitives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTool {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bound_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl AgentTool {
    pub const UPLOAD_RESUME: &'static str = "upload_resume";

    /// Upload action bound to a fixed local file.
    pub fn upload_resume(path: &Path) -> Self {
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Self {
            name: Self::UPLOAD_RESUME.to_string(),
            description: "Upload resume file".to_string(),
            bound_path: Some(path.to_path_buf()),
            content_type: Some(content_type),
        }
    }
}

/// Everything the agent needs for one run.
#[derive(Debug, Clone, Serialize)]
pub struct AgentTask {
    pub instructions: String,
    pub model: ModelHandle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<BrowserSession>,
    pub tools: Vec<AgentTool>,
    pub available_file_paths: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<serde_json::Value>,
}

impl AgentTask {
    pub fn new(instructions: impl Into<String>, model: ModelHandle) -> Self {
        Self {
            instructions: instructions.into(),
            model,
            session: None,
            tools: Vec::new(),
            available_file_paths: Vec::new(),
            output_schema: None,
        }
    }

    pub fn in_session(mut self, session: &BrowserSession) -> Self {
        self.session = Some(session.clone());
        self
    }

    pub fn with_tool(mut self, tool: AgentTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_files(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.available_file_paths.extend(paths);
        self
    }

    pub fn with_output_schema(mut self, schema: serde_json::Value) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

/// Result of a finished agent run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRun {
    pub final_result: Option<String>,
    pub is_done: bool,
    #[serde(default)]
    pub steps: u32,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl AgentRun {
    pub fn completed(final_result: impl Into<String>) -> Self {
        Self {
            final_result: Some(final_result.into()),
            is_done: true,
            steps: 0,
            errors: Vec::new(),
        }
    }

    /// The agent's final output, provided it reached the done action.
    pub fn final_output(&self) -> Result<&str, AgentError> {
        match (&self.final_result, self.is_done) {
            (Some(output), true) if !output.trim().is_empty() => Ok(output),
            _ => {
                let reason = self
                    .errors
                    .last()
                    .cloned()
                    .unwrap_or_else(|| "agent stopped without a final result".to_string());
                Err(AgentError::Incomplete(reason))
            }
        }
    }
}

/// Failures raised while talking to, or waiting on, the agent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("agent runtime unreachable: {0}")]
    Unreachable(String),
    #[error("agent runtime rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("agent did not complete the task: {0}")]
    Incomplete(String),
    #[error("agent pass '{pass}' exceeded its {}s deadline", .limit.as_secs())]
    Timeout { pass: &'static str, limit: Duration },
    #[error("unable to decode agent runtime response: {0}")]
    Decode(String),
    #[error("browser session error: {0}")]
    Session(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_tool_binds_path_and_guesses_content_type() {
        let tool = AgentTool::upload_resume(Path::new("/tmp/resume.pdf"));
        assert_eq!(tool.name, AgentTool::UPLOAD_RESUME);
        assert_eq!(tool.bound_path.as_deref(), Some(Path::new("/tmp/resume.pdf")));
        assert_eq!(tool.content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn final_output_requires_done_action() {
        let run = AgentRun {
            final_result: Some("partial".to_string()),
            is_done: false,
            steps: 12,
            errors: vec!["max steps reached".to_string()],
        };
        match run.final_output() {
            Err(AgentError::Incomplete(reason)) => assert_eq!(reason, "max steps reached"),
            other => panic!("expected incomplete run, got {other:?}"),
        }

        let done = AgentRun::completed("{\"ok\":true}");
        assert_eq!(done.final_output().expect("done run"), "{\"ok\":true}");
    }

    #[test]
    fn blank_output_counts_as_incomplete() {
        let run = AgentRun::completed("   ");
        assert!(matches!(run.final_output(), Err(AgentError::Incomplete(_))));
    }

    #[test]
    fn timeout_message_names_pass_and_limit() {
        let err = AgentError::Timeout {
            pass: "extraction",
            limit: Duration::from_secs(90),
        };
        assert_eq!(
            err.to_string(),
            "agent pass 'extraction' exceeded its 90s deadline"
        );
    }
}
