use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use super::domain::ApplicantProfile;
use super::employers::{EmployerPortal, EmployerRegistry};
use super::fixtures::{FixtureError, MockFixtures};
use super::orchestrator::{ApplicationOrchestrator, ApplicationReport, ApplicationRequest, ApplyError};
use crate::agent::{AgentExecutor, BrowserProvider, ModelHandle};

/// Body of `POST /apply/{employer}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplySubmission {
    pub applicant_info: Map<String, Value>,
    pub resume_path: PathBuf,
    #[serde(default)]
    pub llm_model: Option<String>,
}

/// Models used when the caller names none.
#[derive(Debug, Clone)]
pub struct ModelDefaults {
    pub apply: ModelHandle,
    pub test: ModelHandle,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            apply: ModelHandle::new("gpt-4o-mini"),
            test: ModelHandle::new("gpt-4.1-mini"),
        }
    }
}

/// Service resolving employers and fixtures before handing runs to the orchestrator.
pub struct ApplicationService<E: ?Sized, B: ?Sized> {
    orchestrator: Arc<ApplicationOrchestrator<E, B>>,
    employers: Arc<EmployerRegistry>,
    fixtures: MockFixtures,
    models: ModelDefaults,
}

impl<E, B> ApplicationService<E, B>
where
    E: AgentExecutor + ?Sized + 'static,
    B: BrowserProvider + ?Sized + 'static,
{
    pub fn new(
        orchestrator: Arc<ApplicationOrchestrator<E, B>>,
        employers: Arc<EmployerRegistry>,
        fixtures: MockFixtures,
        models: ModelDefaults,
    ) -> Self {
        Self {
            orchestrator,
            employers,
            fixtures,
            models,
        }
    }

    pub fn orchestrator(&self) -> &ApplicationOrchestrator<E, B> {
        &self.orchestrator
    }

    pub fn employer(&self, employer_id: &str) -> Result<&EmployerPortal, ApplicationServiceError> {
        self.employers
            .get(employer_id)
            .ok_or_else(|| ApplicationServiceError::UnknownEmployer(employer_id.to_string()))
    }

    /// Apply with caller-supplied applicant data and resume.
    pub async fn apply(
        &self,
        employer_id: &str,
        submission: ApplySubmission,
    ) -> Result<ApplicationReport, ApplicationServiceError> {
        let portal = self.employer(employer_id)?.clone();
        let model = submission
            .llm_model
            .filter(|model| !model.trim().is_empty())
            .map(ModelHandle::new)
            .unwrap_or_else(|| self.models.apply.clone());

        let request = ApplicationRequest {
            portal,
            profile: ApplicantProfile::new(submission.applicant_info),
            resume_path: submission.resume_path,
            model,
        };
        Ok(self.orchestrator.apply(request).await?)
    }

    /// Apply with the canned fixture applicant and the test model.
    pub async fn apply_with_fixtures(
        &self,
        employer_id: &str,
    ) -> Result<ApplicationReport, ApplicationServiceError> {
        let portal = self.employer(employer_id)?.clone();
        let fixture = self.fixtures.load().await?;
        info!(
            employer = employer_id,
            fixtures = %self.fixtures.dir().display(),
            "running application with fixture data"
        );

        let request = ApplicationRequest {
            portal,
            profile: fixture.profile,
            resume_path: fixture.resume_path,
            model: self.models.test.clone(),
        };
        Ok(self.orchestrator.apply(request).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApplicationServiceError {
    #[error("Unknown employer: {0}")]
    UnknownEmployer(String),
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
}

impl ApplicationServiceError {
    /// Resource-not-found failures that map to 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::UnknownEmployer(_) => true,
            Self::Fixture(error) => error.is_not_found(),
            Self::Apply(error) => error.is_not_found(),
        }
    }
}
