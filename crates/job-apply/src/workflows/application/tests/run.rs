use super::common::*;
use std::path::Path;

use crate::workflows::application::{
    ApplicationBlueprint, FieldStatus, FillPlan, FormRun, RunError, WorkflowPhase,
    WorkflowWording,
};

fn run() -> FormRun {
    let plan = FillPlan::build(
        &ApplicationBlueprint::standard(),
        &jane_doe_profile(),
        &WorkflowWording::default(),
        Path::new("/tmp/resume.pdf"),
        today(),
    );
    FormRun::new(&plan)
}

fn fill(run: &mut FormRun, key: &str, value: &str) {
    run.record_filled(key, value).expect("fill allowed");
    run.record_verified(key).expect("verify allowed");
}

fn complete_contact_info(run: &mut FormRun) {
    fill(run, "first_name", "Jane");
    fill(run, "last_name", "Doe");
    fill(run, "email", "jane.doe@example.com");
    fill(run, "phone", "585-555-0142");
}

#[test]
fn later_phase_waits_for_required_fields() {
    let mut run = run();
    fill(&mut run, "first_name", "Jane");

    match run.begin("resume") {
        Err(RunError::PhaseGate { phase, pending, .. }) => {
            assert_eq!(phase, WorkflowPhase::ContactInfo);
            assert_eq!(pending, vec!["last_name", "email", "phone"]);
        }
        other => panic!("expected phase gate, got {other:?}"),
    }

    complete_contact_info(&mut run);
    run.begin("resume").expect("gate opens once contact info is verified");
}

#[test]
fn filled_but_unverified_fields_hold_the_gate() {
    let mut run = run();
    complete_contact_info(&mut run);
    run.record_filled("resume", "resume.pdf").expect("upload");

    assert!(matches!(
        run.begin("postal_code"),
        Err(RunError::PhaseGate {
            phase: WorkflowPhase::FileUpload,
            ..
        })
    ));
}

#[test]
fn validation_errors_return_field_to_pending() {
    let mut run = run();
    run.record_filled("email", "jane@").expect("fill");
    let attempts = run
        .record_validation_error("email", "Enter a valid email address")
        .expect("known field");
    assert_eq!(attempts, 1);

    let field = run.field("email").expect("email progress");
    assert_eq!(field.status, FieldStatus::Pending);
    assert_eq!(field.last_error.as_deref(), Some("Enter a valid email address"));
    assert_eq!(
        run.record_verified("email"),
        Err(RunError::NotFilled("email".to_string()))
    );

    fill(&mut run, "email", "jane.doe@example.com");
    let field = run.field("email").expect("email progress");
    assert_eq!(field.status, FieldStatus::Verified);
    assert!(field.last_error.is_none());
    assert_eq!(field.attempts, 1);
}

#[test]
fn absent_and_autofilled_fields_release_the_gate() {
    let mut run = run();
    complete_contact_info(&mut run);
    fill(&mut run, "resume", "resume.pdf");
    fill(&mut run, "postal_code", "14604");
    run.record_autofilled("country", "United States")
        .expect("autofill recorded");
    run.record_autofilled("city", "Rochester")
        .expect("autofill recorded");

    assert_eq!(run.current_phase(), Some(WorkflowPhase::Eligibility));

    run.mark_absent("over_18").expect("known field");
    fill(&mut run, "work_eligibility", "Yes");
    fill(&mut run, "sponsorship", "No");
    fill(&mut run, "professional_license", "No");
    run.begin("motivation").expect("eligibility settled");
}

#[test]
fn submission_requires_every_required_field() {
    let mut run = run();
    complete_contact_info(&mut run);

    match run.record_submitted() {
        Err(RunError::NotReady(pending)) => {
            assert!(pending.contains(&"resume".to_string()));
            assert!(pending.contains(&"todays_date".to_string()));
            assert!(!pending.contains(&"gender".to_string()));
        }
        other => panic!("expected not ready, got {other:?}"),
    }
    assert_eq!(run.confirm_submission(), Err(RunError::NotSubmitted));
    assert!(!run.is_done());
}

#[test]
fn confirmed_submission_completes_the_run() {
    let mut run = run();
    complete_contact_info(&mut run);
    for (key, value) in [
        ("resume", "resume.pdf"),
        ("postal_code", "14604"),
        ("country", "United States"),
        ("city", "Rochester"),
        ("over_18", "Yes"),
        ("work_eligibility", "Yes"),
        ("sponsorship", "No"),
        ("professional_license", "No"),
        ("years_experience", "7 years"),
        ("hispanic_latino", "No"),
        ("todays_date", "10/16/2026"),
    ] {
        fill(&mut run, key, value);
    }

    assert_eq!(run.current_phase(), Some(WorkflowPhase::Submit));
    run.ready_to_submit().expect("all required fields verified");
    run.record_submitted().expect("submit");
    assert!(!run.is_done(), "done only after confirmation");
    run.confirm_submission().expect("confirmation observed");
    assert!(run.is_done());
    assert_eq!(run.current_phase(), None);

    let outcome = run.outcome("submitted");
    assert!(outcome.submitted);
    assert_eq!(outcome.fields.len(), 15);
    assert_eq!(outcome.fields[0].label, "Legal First Name");
    assert!(outcome.field("Submit your application").is_none());
}

#[test]
fn unknown_fields_are_rejected() {
    let mut run = run();
    assert_eq!(
        run.begin("favourite_colour"),
        Err(RunError::UnknownField("favourite_colour".to_string()))
    );
}
