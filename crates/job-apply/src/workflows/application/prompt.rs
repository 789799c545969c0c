//! Agent instructions for the two application passes.
//!
//! The extraction pass reads the live form and pairs it with the applicant profile. The
//! execution pass receives the ordered fill plan, rendered phase by phase, with the extraction
//! output as its source of truth.

use serde_json::{json, Value};

use super::domain::{ApplicantProfile, ExtractionResult, FieldKind, WorkflowPhase};
use super::employers::EmployerPortal;
use super::plan::{FillPlan, PlannedFill, PlannedValue};
use crate::agent::AgentTool;

pub fn render_extraction_task(portal: &EmployerPortal, profile: &ApplicantProfile) -> String {
    let profile_json = serde_json::to_string_pretty(profile.fields()).unwrap_or_default();

    format!(
        "Navigate to {url} and scroll through the entire application. Use the \
         extract_structured_data action to extract every question and field the form asks for, \
         including its label, control type, whether it is required, and the options it offers.\n\
         \n\
         Pair each field with the answer from the applicant information below and return a \
         structured output that can be used to fill out the entire form. When the applicant \
         information has no answer, leave the answer empty rather than inventing one. List any \
         field that the form does not show under absent_fields.\n\
         \n\
         APPLICANT INFORMATION:\n{profile_json}\n\
         \n\
         Do not fill in or submit anything. Use the done action to finish the task.",
        url = portal.apply_url,
    )
}

pub fn render_execution_task(
    portal: &EmployerPortal,
    plan: &FillPlan,
    extraction: &ExtractionResult,
) -> String {
    let mut lines = vec![
        format!("OBJECTIVE: Complete the job application form at {}", portal.apply_url),
        String::new(),
        format!("SOURCE DATA: {}", extraction.source_data()),
        "*** This data is your source of truth - refer to it for EVERY field ***".to_string(),
        String::new(),
        "EXECUTION INSTRUCTIONS:".to_string(),
        String::new(),
        "=== PHASE 0: PREPARATION ===".to_string(),
        "1. Navigate to the URL".to_string(),
        "2. Wait for page to fully load (3-5 seconds)".to_string(),
        "3. Handle any popups:".to_string(),
        "   - If a cookie banner appears, accept or close it".to_string(),
        "   - If any modal or overlay blocks the form, close it immediately".to_string(),
        "   - If a chat widget appears, minimize or close it".to_string(),
        "4. Scroll through the entire page once to understand its structure".to_string(),
        "5. Return to the top of the form".to_string(),
    ];

    let mut number = 1;
    for phase in WorkflowPhase::ordered() {
        let entries: Vec<&PlannedFill> = plan
            .entries_for_phase(phase)
            .filter(|entry| !entry.absent)
            .collect();
        if entries.is_empty() {
            continue;
        }

        lines.push(String::new());
        lines.push(format!(
            "=== PHASE {}: {} ===",
            phase.number(),
            phase.label().to_uppercase()
        ));
        if let Some(rule) = phase_rule(phase) {
            lines.push(rule.to_string());
        }
        if phase == WorkflowPhase::Address {
            lines.push("Complete in this exact order (some fields may populate others):".to_string());
        }

        for entry in entries {
            render_field(&mut lines, number, entry, plan);
            number += 1;
        }

        if phase == WorkflowPhase::Address {
            lines.extend(autofill_notes(plan));
        }
    }

    lines.push(String::new());
    lines.extend(
        [
            "=== ERROR HANDLING ===",
            "- If a validation error appears: read the message, fix the field, and retry this phase",
            "- If a field won't accept input: click elsewhere, then click back on the field",
            "- If a dropdown won't open: try clicking the arrow icon specifically",
            "- If a radio button won't select: click directly on the circle, not the label",
            "- If the upload fails: try clicking the upload area instead of the button",
            "- If a field described above does not exist on this form, skip it and continue",
        ]
        .map(str::to_string),
    );

    lines.push(String::new());
    lines.push("=== OUTPUT REQUIREMENTS ===".to_string());
    lines.push(
        "When finished, return JSON with a short human-readable summary, every field you \
         filled in page order, and whether the form was submitted:"
            .to_string(),
    );
    lines.push(
        r#"{"summary": "...", "fields": [{"label": "Legal First Name", "kind": "text", "value": "...", "required": true}], "submitted": true}"#
            .to_string(),
    );
    lines.push(
        "If you cannot produce JSON, list each field as `- Label | kind | value | Required` \
         and finish with `Form submitted: Yes` or `Form submitted: No`."
            .to_string(),
    );

    lines.push(String::new());
    lines.push("=== CRITICAL REMINDERS ===".to_string());
    lines.extend(
        [
            "- DO NOT skip any field, even optional ones",
            "- DO NOT use the done action until the form is submitted",
            "- ALWAYS select \"No\" for the professional license question",
            "- CLOSE any popups or overlays that block the form",
            "- REFER to the source data for every single field",
            "- If the source data lacks information, use the defaults given above",
            "- Complete fields sequentially from top to bottom; finish a phase before starting the next",
            "- If you do not see any fields to fill, scroll until you find one",
        ]
        .map(str::to_string),
    );
    lines.extend(
        portal
            .wording
            .reminders
            .iter()
            .map(|reminder| format!("- {reminder}")),
    );

    lines.push(String::new());
    lines.push("The task is ONLY complete when you have:".to_string());
    lines.push("1. Filled every field".to_string());
    lines.push(format!("2. Clicked \"{}\"", portal.wording.submit_label));
    lines.push("3. Received a confirmation".to_string());
    lines.push("4. Returned the output described above".to_string());

    lines.join("\n")
}

fn phase_rule(phase: WorkflowPhase) -> Option<&'static str> {
    match phase {
        WorkflowPhase::ContactInfo => Some(
            "For each field: scroll until it is visible, click the input (not the label), clear \
             existing content, type the value, and verify the text was entered correctly.",
        ),
        WorkflowPhase::Eligibility => {
            Some("*** For radio buttons: click the actual circle, NOT the text label ***")
        }
        WorkflowPhase::Voluntary => {
            Some("*** For dropdowns: click to open first, then select the option ***")
        }
        _ => None,
    }
}

fn render_field(lines: &mut Vec<String>, number: usize, entry: &PlannedFill, plan: &FillPlan) {
    let marker = if entry.required() { " (required)" } else { "" };
    lines.push(format!("{number}. \"{}\"{marker}", entry.label));

    if let Some(dependency) = entry.template.autofill {
        let driver = plan
            .entry(dependency.populated_by)
            .map(|driver| driver.label.as_str())
            .unwrap_or(dependency.populated_by);
        lines.push(format!(
            "   - ONLY fill if not auto-populated by \"{driver}\" or if the shown value is wrong"
        ));
    }

    let action = match &entry.value {
        PlannedValue::Upload(_) => format!(
            "   - Use the {} action to upload the resume",
            AgentTool::UPLOAD_RESUME
        ),
        other => format!("   - {}", capitalize(&other.describe())),
    };
    lines.push(action);

    lines.extend(entry.template.hints.iter().map(|hint| format!("   - {hint}")));

    if let Some(settle) = entry.settle {
        let what = if entry.kind() == FieldKind::File {
            "for the upload to complete"
        } else {
            "before checking the fields it populates"
        };
        lines.push(format!("   - WAIT {} seconds {what}", settle.as_secs()));
    }

    if entry.template.verify {
        lines.push("   - Verify the value before moving on".to_string());
    }
}

fn autofill_notes(plan: &FillPlan) -> Vec<String> {
    let dependents: Vec<&str> = plan
        .entries()
        .iter()
        .filter(|entry| entry.template.autofill.is_some() && !entry.absent)
        .map(|entry| entry.label.as_str())
        .collect();
    if dependents.is_empty() {
        return Vec::new();
    }

    vec![
        String::new(),
        "IMPORTANT AUTO-FILL NOTES:".to_string(),
        "- MAKE SURE YOU FILLED THE PREVIOUS ELEMENT BEFORE YOU MOVE ON".to_string(),
        format!(
            "- After the postal code, check which of {} auto-populated",
            dependents.join(", ")
        ),
        "- Never overwrite an auto-filled value that already matches the source data".to_string(),
        "- Replace an auto-filled value only when it is wrong; fill it only when it is empty"
            .to_string(),
        "- \"United States\", \"USA\" and \"US\" are the same country".to_string(),
    ]
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Output schema for the extraction pass.
pub fn extraction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "fields": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "label": { "type": "string" },
                        "kind": { "type": "string" },
                        "required": { "type": "boolean" },
                        "options": { "type": "array", "items": { "type": "string" } },
                        "answer": { "type": "string" }
                    },
                    "required": ["label", "kind", "required"]
                }
            },
            "absent_fields": { "type": "array", "items": { "type": "string" } }
        },
        "required": ["fields"]
    })
}

/// Output schema for the execution pass; mirrors `ApplicationOutcome`.
pub fn outcome_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "fields": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "label": { "type": "string" },
                        "kind": { "type": "string" },
                        "value": { "type": "string" },
                        "required": { "type": "boolean" }
                    },
                    "required": ["label", "kind", "value", "required"]
                }
            },
            "submitted": { "type": "boolean" }
        },
        "required": ["summary", "fields", "submitted"]
    })
}
