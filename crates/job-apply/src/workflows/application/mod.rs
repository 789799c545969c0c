//! Agent-driven job applications.
//!
//! A run is two agent passes inside one browser session. The extraction pass reads the live
//! form and pairs it with the applicant profile; the execution pass fills the form phase by
//! phase from a [`FillPlan`] and submits it. The reported outcome is audited against the plan.

pub(crate) mod autofill;
pub mod blueprint;
pub mod domain;
pub mod employers;
pub mod fixtures;
pub mod orchestrator;
pub mod outcome;
pub mod plan;
pub mod prompt;
pub mod router;
pub mod run;
pub mod service;
pub mod wording;

#[cfg(test)]
mod tests;

pub use autofill::AutofillAction;
pub use blueprint::ApplicationBlueprint;
pub use domain::{
    ApplicantProfile, ApplicationOutcome, AutofillDependency, ExtractionResult, FieldEntry,
    FieldKind, FieldTemplate, ProfileKey, ValueSource, WorkflowPhase,
};
pub use employers::{
    EmployerPortal, EmployerRegistry, EmployerRegistryError, ROCHESTER_REGIONAL_HEALTH,
};
pub use fixtures::{FixtureError, LoadedFixture, MockFixtures};
pub use orchestrator::{ApplicationOrchestrator, ApplicationReport, ApplicationRequest, ApplyError};
pub use outcome::{parse_outcome, OutcomeAudit, OutcomeParseError};
pub use plan::{FillPlan, PlannedFill, PlannedValue, ValueProvenance};
pub use prompt::{extraction_schema, outcome_schema, render_execution_task, render_extraction_task};
pub use router::{application_router, ApplyResponse};
pub use run::{FieldProgress, FieldStatus, FormRun, RunError};
pub use service::{ApplicationService, ApplicationServiceError, ApplySubmission, ModelDefaults};
pub use wording::WorkflowWording;
