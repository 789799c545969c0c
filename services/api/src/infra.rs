use chrono::NaiveDate;
use job_apply::agent::{HttpAgentRuntime, ModelHandle};
use job_apply::config::AppConfig;
use job_apply::error::AppError;
use job_apply::workflows::application::{
    ApplicantProfile, ApplicationOrchestrator, ApplicationService, EmployerRegistry, MockFixtures,
    ModelDefaults,
};
use job_apply::workflows::research::CompanyResearcher;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type RuntimeApplicationService = ApplicationService<HttpAgentRuntime, HttpAgentRuntime>;

/// Everything the routes and CLI commands need, wired against the HTTP agent runtime.
pub(crate) struct Services {
    pub(crate) application: Arc<RuntimeApplicationService>,
    pub(crate) research: Arc<CompanyResearcher<HttpAgentRuntime>>,
}

impl Services {
    pub(crate) fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let runtime = Arc::new(HttpAgentRuntime::from_config(&config.agent)?);
        let employers = load_employers(config)?;
        info!(
            runtime = %config.agent.runtime_url,
            employers = employers.ids().count(),
            "agent runtime configured"
        );

        let orchestrator = ApplicationOrchestrator::new(
            runtime.clone(),
            runtime.clone(),
            config.agent.pass_timeout,
        );
        let models = ModelDefaults {
            apply: ModelHandle::new(config.agent.default_model.clone()),
            test: ModelHandle::new(config.agent.test_model.clone()),
        };
        let application = ApplicationService::new(
            Arc::new(orchestrator),
            Arc::new(employers),
            MockFixtures::new(config.fixtures.dir.clone()),
            models,
        );
        let research = CompanyResearcher::new(
            runtime,
            ModelHandle::new(config.agent.research_model.clone()),
            config.agent.pass_timeout,
        );

        Ok(Self {
            application: Arc::new(application),
            research: Arc::new(research),
        })
    }
}

pub(crate) fn load_employers(config: &AppConfig) -> Result<EmployerRegistry, AppError> {
    match &config.employers_file {
        Some(path) => Ok(EmployerRegistry::from_path(path)?),
        None => Ok(EmployerRegistry::standard()),
    }
}

/// Reads an applicant profile JSON object from disk.
pub(crate) async fn read_profile(path: &Path) -> Result<ApplicantProfile, AppError> {
    let problem = |reason: String| AppError::Profile {
        path: path.to_path_buf(),
        reason,
    };
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| problem(err.to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|err| problem(format!("invalid JSON ({err})")))?;
    ApplicantProfile::from_value(value)
        .ok_or_else(|| problem("must contain a JSON object".to_string()))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
