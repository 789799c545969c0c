use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};

use super::blueprint::ApplicationBlueprint;
use super::domain::{ApplicantProfile, ApplicationOutcome, ExtractionResult};
use super::employers::EmployerPortal;
use super::outcome::{parse_outcome, OutcomeAudit, OutcomeParseError};
use super::plan::FillPlan;
use super::prompt::{
    extraction_schema, outcome_schema, render_execution_task, render_extraction_task,
};
use crate::agent::{
    AgentError, AgentExecutor, AgentTask, AgentTool, BrowserProvider, BrowserSession, ModelHandle,
    SessionGuard,
};

const EXTRACTION_PASS: &str = "extraction";
const EXECUTION_PASS: &str = "execution";

/// One application run: which portal, for whom, with which resume and model.
#[derive(Debug, Clone)]
pub struct ApplicationRequest {
    pub portal: EmployerPortal,
    pub profile: ApplicantProfile,
    pub resume_path: PathBuf,
    pub model: ModelHandle,
}

/// What came back from a run, plus the post-run audit against the fill plan.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationReport {
    pub employer_id: String,
    pub model: String,
    pub outcome: ApplicationOutcome,
    /// Keys of the planned fields the form shows, in fill order.
    pub field_order: Vec<String>,
    pub audit: OutcomeAudit,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("Resume file not found: {}", .path.display())]
    ResumeNotFound { path: PathBuf },
    #[error("unable to open browser session: {0}")]
    Session(AgentError),
    #[error("extraction pass failed: {0}")]
    Extraction(AgentError),
    #[error("execution pass failed: {0}")]
    Execution(AgentError),
    #[error("unable to read the execution result: {0}")]
    Outcome(#[from] OutcomeParseError),
    #[error("the form was not submitted")]
    NotSubmitted { report: Box<ApplicationReport> },
}

impl ApplyError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ResumeNotFound { .. })
    }

    /// Partial result carried by an unsubmitted run.
    pub fn report(&self) -> Option<&ApplicationReport> {
        match self {
            Self::NotSubmitted { report } => Some(&**report),
            _ => None,
        }
    }
}

/// Two-pass application driver: extract what the form needs, then fill and submit it.
pub struct ApplicationOrchestrator<E: ?Sized, B: ?Sized> {
    agent: Arc<E>,
    browsers: Arc<B>,
    blueprint: ApplicationBlueprint,
    pass_timeout: Duration,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl<E, B> ApplicationOrchestrator<E, B>
where
    E: AgentExecutor + ?Sized + 'static,
    B: BrowserProvider + ?Sized + 'static,
{
    pub fn new(agent: Arc<E>, browsers: Arc<B>, pass_timeout: Duration) -> Self {
        Self {
            agent,
            browsers,
            blueprint: ApplicationBlueprint::standard(),
            pass_timeout,
            today: local_today,
        }
    }

    pub fn with_blueprint(mut self, blueprint: ApplicationBlueprint) -> Self {
        self.blueprint = blueprint;
        self
    }

    /// Replace the clock used for the date field.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn blueprint(&self) -> &ApplicationBlueprint {
        &self.blueprint
    }

    /// Plan the run would execute, dated now.
    pub fn plan(&self, request: &ApplicationRequest) -> FillPlan {
        FillPlan::build(
            &self.blueprint,
            &request.profile,
            &request.portal.wording,
            &request.resume_path,
            (self.today)(),
        )
    }

    /// Run both passes in one browser session. The session is released on every exit path.
    #[instrument(skip_all, fields(employer = %request.portal.id, model = request.model.as_str()))]
    pub async fn apply(&self, request: ApplicationRequest) -> Result<ApplicationReport, ApplyError> {
        let resume_exists = tokio::fs::metadata(&request.resume_path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !resume_exists {
            return Err(ApplyError::ResumeNotFound {
                path: request.resume_path.clone(),
            });
        }

        let guard = SessionGuard::acquire(Arc::clone(&self.browsers))
            .await
            .map_err(ApplyError::Session)?;
        let result = self.run_passes(&request, guard.session()).await;
        guard.release().await;
        result
    }

    async fn run_passes(
        &self,
        request: &ApplicationRequest,
        session: &BrowserSession,
    ) -> Result<ApplicationReport, ApplyError> {
        let upload = AgentTool::upload_resume(&request.resume_path);

        let extraction_task = AgentTask::new(
            render_extraction_task(&request.portal, &request.profile),
            request.model.clone(),
        )
        .in_session(session)
        .with_tool(upload.clone())
        .with_output_schema(extraction_schema());
        let extraction_output = self
            .run_pass(EXTRACTION_PASS, extraction_task)
            .await
            .map_err(ApplyError::Extraction)?;
        let extraction = ExtractionResult::from_agent_output(&extraction_output);
        info!(
            structured = extraction.answers.is_some(),
            "extraction pass finished"
        );

        // Dated here so the date field reflects when the form is actually filled.
        let plan = self.plan(request).fit_to_form(&extraction);
        let absent = plan.entries().iter().filter(|entry| entry.absent).count();
        if absent > 0 {
            info!(absent, "planned fields not shown by the form");
        }
        let execution_task = AgentTask::new(
            render_execution_task(&request.portal, &plan, &extraction),
            request.model.clone(),
        )
        .in_session(session)
        .with_tool(upload)
        .with_files([request.resume_path.clone()])
        .with_output_schema(outcome_schema());
        let execution_output = self
            .run_pass(EXECUTION_PASS, execution_task)
            .await
            .map_err(ApplyError::Execution)?;

        let outcome = parse_outcome(&execution_output)?;
        let audit = OutcomeAudit::inspect(&plan, &outcome);
        if !audit.missing_required.is_empty() {
            warn!(missing = ?audit.missing_required, "required fields not reported");
        }
        if !audit.phase_violations.is_empty() {
            warn!(violations = ?audit.phase_violations, "fields reported out of phase order");
        }
        if audit.license_answer_ok == Some(false) {
            warn!("professional license answered with something other than No");
        }

        let report = ApplicationReport {
            employer_id: request.portal.id.clone(),
            model: request.model.as_str().to_string(),
            field_order: plan.field_order().into_iter().map(str::to_string).collect(),
            outcome,
            audit,
        };

        if !report.outcome.submitted {
            warn!(fields = report.outcome.fields.len(), "agent finished without submitting");
            return Err(ApplyError::NotSubmitted {
                report: Box::new(report),
            });
        }

        info!(fields = report.outcome.fields.len(), "application submitted");
        Ok(report)
    }

    async fn run_pass(&self, pass: &'static str, task: AgentTask) -> Result<String, AgentError> {
        info!(pass, "starting agent pass");
        let run = tokio::time::timeout(self.pass_timeout, self.agent.execute(task))
            .await
            .map_err(|_| AgentError::Timeout {
                pass,
                limit: self.pass_timeout,
            })??;
        run.final_output().map(str::to_string)
    }
}
