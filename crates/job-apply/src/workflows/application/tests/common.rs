use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::agent::{
    AgentError, AgentExecutor, AgentRun, AgentTask, BrowserProvider, BrowserSession, ModelHandle,
};
use crate::workflows::application::{
    ApplicantProfile, ApplicationOrchestrator, ApplicationRequest, ApplicationService,
    EmployerRegistry, MockFixtures, ModelDefaults,
};
use crate::workflows::application::employers::ROCHESTER_REGIONAL_HEALTH;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).expect("valid date")
}

pub(super) fn jane_doe() -> Value {
    json!({
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane.doe@example.com",
        "phone": "585-555-0142",
        "age": "29",
        "US_citizen": true,
        "sponsorship_needed": false,
        "postal_code": "14604",
        "country": "USA",
        "state": "NY",
        "city": "Rochester",
        "address": "100 Main St",
        "gender": "Female",
        "Veteran_status": "I am not a veteran",
        "job_experiences": [
            { "title": "Registered Nurse", "startDate": "2019-06", "currentJob": true }
        ]
    })
}

pub(super) fn jane_doe_profile() -> ApplicantProfile {
    ApplicantProfile::from_value(jane_doe()).expect("object profile")
}

/// Execution pass result for Jane Doe, listing every standard field in page order.
pub(super) fn jane_doe_outcome(submitted: bool) -> String {
    json!({
        "summary": "Successfully completed job application form",
        "fields": [
            { "label": "Legal First Name", "kind": "text", "value": "Jane", "required": true },
            { "label": "Legal Last Name", "kind": "text", "value": "Doe", "required": true },
            { "label": "Email", "kind": "email", "value": "jane.doe@example.com", "required": true },
            { "label": "Phone", "kind": "tel", "value": "585-555-0142", "required": true },
            { "label": "Resume", "kind": "file", "value": "test_CV.pdf", "required": true },
            { "label": "Postal Code", "kind": "text", "value": "14604", "required": true },
            { "label": "Country", "kind": "dropdown", "value": "United States", "required": true },
            { "label": "State", "kind": "dropdown", "value": "NY", "required": false },
            { "label": "City", "kind": "text", "value": "Rochester", "required": true },
            { "label": "Address Line", "kind": "text", "value": "100 Main St", "required": false },
            { "label": "Are you over the age of 18?", "kind": "radio", "value": "Yes", "required": true },
            { "label": "Are you eligible to work in the United States?", "kind": "radio", "value": "Yes", "required": true },
            { "label": "Will you require sponsorship for employment visa?", "kind": "radio", "value": "No", "required": true },
            { "label": "Do you have or are obtaining a professional license?", "kind": "radio", "value": "No", "required": true },
            { "label": "What drew you to healthcare?", "kind": "textarea", "value": "I am passionate about healthcare.", "required": false },
            { "label": "Years of experience in related role", "kind": "dropdown", "value": "5-10 years", "required": true },
            { "label": "Gender", "kind": "dropdown", "value": "Female", "required": false },
            { "label": "Race/Ethnicity", "kind": "dropdown", "value": "Prefer not to answer", "required": false },
            { "label": "Hispanic or Latino", "kind": "radio", "value": "No", "required": true },
            { "label": "Veteran Status", "kind": "dropdown", "value": "I am not a veteran", "required": false },
            { "label": "Disability Status", "kind": "radio", "value": "No, I do not have a disability", "required": false },
            { "label": "Please enter today's date", "kind": "date", "value": "10/16/2026", "required": true }
        ],
        "submitted": submitted
    })
    .to_string()
}

/// Reported fields of `jane_doe_outcome`, for editing before re-serializing.
pub(super) fn jane_doe_fields() -> Vec<Value> {
    let outcome: Value = serde_json::from_str(&jane_doe_outcome(true)).expect("outcome json");
    outcome["fields"].as_array().cloned().expect("field list")
}

pub(super) fn outcome_with_fields(fields: Vec<Value>, submitted: bool) -> String {
    json!({
        "summary": "Successfully completed job application form",
        "fields": fields,
        "submitted": submitted
    })
    .to_string()
}

/// The standard form as the extraction pass reads it, paired with Jane Doe's answers.
pub(super) fn standard_form_fields() -> Vec<Value> {
    jane_doe_fields()
        .iter()
        .map(|field| {
            json!({
                "label": field["label"],
                "kind": field["kind"],
                "required": field["required"],
                "answer": field["value"],
            })
        })
        .collect()
}

pub(super) fn extraction_listing(fields: Vec<Value>) -> String {
    json!({ "fields": fields, "absent_fields": [] }).to_string()
}

pub(super) fn extraction_output() -> String {
    extraction_listing(standard_form_fields())
}

/// Agent replaying queued results in order and recording every task it receives.
#[derive(Default)]
pub(super) struct ScriptedAgent {
    responses: Mutex<VecDeque<Result<AgentRun, AgentError>>>,
    tasks: Mutex<Vec<AgentTask>>,
    delay: Option<Duration>,
}

impl ScriptedAgent {
    pub(super) fn new(responses: Vec<Result<AgentRun, AgentError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub(super) fn submitting() -> Self {
        Self::new(vec![
            Ok(AgentRun::completed(extraction_output())),
            Ok(AgentRun::completed(jane_doe_outcome(true))),
        ])
    }

    pub(super) fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::submitting()
        }
    }

    pub(super) fn tasks(&self) -> Vec<AgentTask> {
        self.tasks.lock().expect("task mutex poisoned").clone()
    }
}

#[async_trait]
impl AgentExecutor for ScriptedAgent {
    async fn execute(&self, task: AgentTask) -> Result<AgentRun, AgentError> {
        self.tasks.lock().expect("task mutex poisoned").push(task);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .expect("response mutex poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Incomplete("no scripted response".to_string())))
    }
}

#[derive(Default)]
pub(super) struct RecordingBrowser {
    opened: Mutex<u32>,
    closed: Mutex<Vec<String>>,
    fail_open: bool,
}

impl RecordingBrowser {
    pub(super) fn unavailable() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }

    pub(super) fn opened(&self) -> u32 {
        *self.opened.lock().expect("browser mutex poisoned")
    }

    pub(super) fn closed(&self) -> Vec<String> {
        self.closed.lock().expect("browser mutex poisoned").clone()
    }

    /// Waits briefly for a close spawned from `Drop`.
    pub(super) async fn wait_for_close(&self) -> Vec<String> {
        for _ in 0..50 {
            let closed = self.closed();
            if !closed.is_empty() {
                return closed;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.closed()
    }
}

#[async_trait]
impl BrowserProvider for RecordingBrowser {
    async fn open(&self) -> Result<BrowserSession, AgentError> {
        if self.fail_open {
            return Err(AgentError::Session("no browsers available".to_string()));
        }
        let mut opened = self.opened.lock().expect("browser mutex poisoned");
        *opened += 1;
        Ok(BrowserSession {
            id: format!("session-{}", *opened),
        })
    }

    async fn close(&self, session: &BrowserSession) -> Result<(), AgentError> {
        self.closed
            .lock()
            .expect("browser mutex poisoned")
            .push(session.id.clone());
        Ok(())
    }
}

pub(super) fn orchestrator(
    agent: Arc<ScriptedAgent>,
    browser: Arc<RecordingBrowser>,
    pass_timeout: Duration,
) -> ApplicationOrchestrator<ScriptedAgent, RecordingBrowser> {
    ApplicationOrchestrator::new(agent, browser, pass_timeout).with_clock(today)
}

pub(super) fn resume_file(dir: &Path) -> PathBuf {
    let path = dir.join("resume.pdf");
    std::fs::write(&path, b"%PDF-1.4 resume").expect("write resume");
    path
}

pub(super) fn request(resume_path: PathBuf) -> ApplicationRequest {
    let registry = EmployerRegistry::standard();
    ApplicationRequest {
        portal: registry
            .get(ROCHESTER_REGIONAL_HEALTH)
            .expect("built-in portal")
            .clone(),
        profile: jane_doe_profile(),
        resume_path,
        model: ModelHandle::new("gpt-4o-mini"),
    }
}

pub(super) fn service(
    agent: Arc<ScriptedAgent>,
    browser: Arc<RecordingBrowser>,
    fixtures_dir: &Path,
) -> Arc<ApplicationService<ScriptedAgent, RecordingBrowser>> {
    Arc::new(ApplicationService::new(
        Arc::new(orchestrator(agent, browser, Duration::from_secs(5))),
        Arc::new(EmployerRegistry::standard()),
        MockFixtures::new(fixtures_dir),
        ModelDefaults::default(),
    ))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
