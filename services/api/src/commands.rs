use crate::infra::{load_employers, parse_date, read_profile, Services};
use chrono::{Local, NaiveDate};
use clap::Args;
use job_apply::agent::{HttpAgentRuntime, ModelHandle};
use job_apply::config::AppConfig;
use job_apply::error::AppError;
use job_apply::telemetry;
use job_apply::workflows::application::{
    render_execution_task, ApplicationBlueprint, ApplicationReport, ApplicationServiceError,
    ApplySubmission, ExtractionResult, FillPlan, WorkflowPhase, ROCHESTER_REGIONAL_HEALTH,
};
use job_apply::workflows::research::CompanyResearcher;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ApplyArgs {
    /// Employer portal id
    #[arg(long, default_value = ROCHESTER_REGIONAL_HEALTH)]
    pub(crate) employer: String,
    /// Applicant profile JSON file
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// Resume file uploaded to the portal
    #[arg(long)]
    pub(crate) resume: PathBuf,
    /// Model override (defaults to AGENT_DEFAULT_MODEL)
    #[arg(long)]
    pub(crate) model: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct PlanArgs {
    /// Employer portal id
    #[arg(long, default_value = ROCHESTER_REGIONAL_HEALTH)]
    pub(crate) employer: String,
    /// Applicant profile JSON file
    #[arg(long)]
    pub(crate) profile: PathBuf,
    /// Resume file named in the upload step
    #[arg(long)]
    pub(crate) resume: PathBuf,
    /// Date written into the form (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the rendered agent instructions
    #[arg(long)]
    pub(crate) plan_only: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ResearchArgs {
    /// Company to research
    #[arg(long)]
    pub(crate) company: String,
    /// Model override (defaults to AGENT_RESEARCH_MODEL)
    #[arg(long)]
    pub(crate) model: Option<String>,
}

pub(crate) async fn run_apply(args: ApplyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let profile = read_profile(&args.profile).await?;
    let services = Services::from_config(&config)?;
    let submission = ApplySubmission {
        applicant_info: profile.fields().clone(),
        resume_path: args.resume,
        llm_model: args.model,
    };

    println!("Applying to {}", args.employer);
    match services.application.apply(&args.employer, submission).await {
        Ok(report) => {
            println!("Application submitted successfully");
            render_report(&report);
        }
        Err(err) => {
            println!("Application failed: {err}");
            if let Some(report) = err_report(&err) {
                render_report(report);
            }
        }
    }

    Ok(())
}

fn err_report(err: &ApplicationServiceError) -> Option<&ApplicationReport> {
    match err {
        ApplicationServiceError::Apply(inner) => inner.report(),
        _ => None,
    }
}

fn render_report(report: &ApplicationReport) {
    println!("- Employer: {} | model {}", report.employer_id, report.model);
    println!("- Summary: {}", report.outcome.summary);
    println!("- Submitted: {}", report.outcome.submitted);
    println!("Fields reported ({}):", report.outcome.fields.len());
    for field in &report.outcome.fields {
        let marker = if field.required { "Required" } else { "Optional" };
        println!("  - {} | {} | {} | {}", field.label, field.kind, field.value, marker);
    }

    let audit = &report.audit;
    if audit.is_clean() {
        println!("Audit: clean");
        return;
    }
    println!("Audit findings:");
    for label in &audit.missing_required {
        println!("  - required field not reported: {label}");
    }
    for violation in &audit.phase_violations {
        println!("  - {violation}");
    }
    for label in &audit.unmatched_fields {
        println!("  - unexpected field: {label}");
    }
    if audit.license_answer_ok == Some(false) {
        println!("  - professional license was not answered \"No\"");
    }
}

pub(crate) async fn run_plan(args: PlanArgs) -> Result<(), AppError> {
    let PlanArgs {
        employer,
        profile,
        resume,
        today,
        plan_only,
    } = args;

    let config = AppConfig::load()?;
    let employers = load_employers(&config)?;
    let Some(portal) = employers.get(&employer) else {
        return Err(AppError::unknown_employer(&employer, employers.ids()));
    };

    let profile = read_profile(&profile).await?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let plan = FillPlan::build(
        &ApplicationBlueprint::standard(),
        &profile,
        &portal.wording,
        &resume,
        today,
    );

    println!("Fill plan for {} ({})", portal.name, portal.apply_url);
    for phase in WorkflowPhase::ordered() {
        let mut entries = plan.entries_for_phase(phase).peekable();
        if entries.peek().is_none() {
            continue;
        }
        println!("\nPhase {}: {}", phase.number(), phase.label());
        for entry in entries {
            let marker = if entry.required() { "*" } else { " " };
            println!(
                "  {marker} {:<55} {} [{:?}]",
                entry.label,
                entry.value.describe(),
                entry.provenance
            );
        }
    }

    if !plan_only {
        let extraction = ExtractionResult::from_agent_output(
            &serde_json::to_string_pretty(profile.fields()).map_err(std::io::Error::from)?,
        );
        println!("\n--- Execution instructions ---\n");
        println!("{}", render_execution_task(portal, &plan, &extraction));
    }

    Ok(())
}

pub(crate) async fn run_research(args: ResearchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let model = args
        .model
        .unwrap_or_else(|| config.agent.research_model.clone());
    let runtime = Arc::new(HttpAgentRuntime::from_config(&config.agent)?);
    let researcher = CompanyResearcher::new(
        runtime,
        ModelHandle::new(model),
        config.agent.pass_timeout,
    );

    match researcher.research(&args.company).await {
        Ok(research) => {
            println!("Research completed for {}", args.company.trim());
            println!("- Summary: {}", research.summary);
            println!("- Recommendation: {}", research.recommendation);
        }
        Err(err) => println!("Research failed: {err}"),
    }

    Ok(())
}
