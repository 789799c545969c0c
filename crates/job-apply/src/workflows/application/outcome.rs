use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::Value;

use super::domain::{normalize_label, ApplicationOutcome, FieldEntry, FieldKind};
use super::plan::FillPlan;
use super::run::{FormRun, RunError};

const LICENSE_KEY: &str = "professional_license";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutcomeParseError {
    #[error("agent returned an empty result")]
    Empty,
    #[error("agent result has neither a field list nor a submission line")]
    Unrecognized,
}

/// First JSON document in `raw`: the whole text, a fenced block, or the outermost braces.
pub(crate) fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(block) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str(block) {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if start >= end {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let (_, body) = text[open + 3..].split_once('\n')?;
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Read the execution pass result.
///
/// Accepts the structured JSON outcome, optionally fenced, and the plain report format:
/// a summary, `- Label | kind | value | Required` lines, and `Form submitted: Yes/No`.
pub fn parse_outcome(raw: &str) -> Result<ApplicationOutcome, OutcomeParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(OutcomeParseError::Empty);
    }

    if let Some(Value::Object(object)) = extract_json(trimmed) {
        if object.contains_key("fields") || object.contains_key("submitted") {
            return Ok(outcome_from_json(&object));
        }
    }

    parse_report(trimmed)
}

fn outcome_from_json(object: &serde_json::Map<String, Value>) -> ApplicationOutcome {
    let fields = object
        .get("fields")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(field_from_json).collect())
        .unwrap_or_default();

    ApplicationOutcome {
        summary: object
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        fields,
        submitted: match object.get("submitted") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => is_affirmative(text),
            _ => false,
        },
    }
}

fn field_from_json(item: &Value) -> Option<FieldEntry> {
    let label = item.get("label").or_else(|| item.get("name"))?.as_str()?.trim();
    if label.is_empty() {
        return None;
    }

    let text = |value: Option<&Value>| match value {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    Some(FieldEntry {
        label: label.to_string(),
        kind: text(item.get("kind").or_else(|| item.get("type"))),
        value: text(item.get("value")),
        required: match item.get("required") {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(marker)) => is_required_marker(marker),
            _ => false,
        },
    })
}

fn parse_report(text: &str) -> Result<ApplicationOutcome, OutcomeParseError> {
    let mut summary_lines = Vec::new();
    let mut fields = Vec::new();
    let mut submitted = None;

    for line in text.lines() {
        let item = strip_bullet(line);
        if is_column_header(item) {
            continue;
        }

        if let Some(answer) = submission_answer(item) {
            submitted = Some(is_affirmative(answer));
            continue;
        }

        if let Some(field) = report_field(item) {
            fields.push(field);
            continue;
        }

        if fields.is_empty() {
            summary_lines.push(line.trim());
        }
    }

    if fields.is_empty() && submitted.is_none() {
        return Err(OutcomeParseError::Unrecognized);
    }

    Ok(ApplicationOutcome {
        summary: summary_lines.join("\n").trim().to_string(),
        fields,
        submitted: submitted.unwrap_or(false),
    })
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    let line = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .unwrap_or(line);
    let line = match line.split_once(". ") {
        Some((number, rest)) if !number.is_empty() && number.chars().all(|c| c.is_ascii_digit()) => {
            rest
        }
        _ => line,
    };
    line.trim()
}

fn submission_answer(item: &str) -> Option<&str> {
    let (label, answer) = item.split_once(':')?;
    (normalize_label(label) == "form submitted").then(|| answer.trim())
}

fn report_field(item: &str) -> Option<FieldEntry> {
    let columns: Vec<&str> = item.split('|').map(str::trim).collect();
    if columns.len() < 3 || columns[0].is_empty() {
        return None;
    }
    Some(FieldEntry {
        label: columns[0].to_string(),
        kind: columns[1].to_string(),
        value: columns[2].to_string(),
        required: columns.get(3).is_some_and(|marker| is_required_marker(marker)),
    })
}

fn is_column_header(item: &str) -> bool {
    item.split_once('|')
        .is_some_and(|(first, _)| normalize_label(first) == "field name")
}

fn is_required_marker(marker: &str) -> bool {
    let marker = normalize_label(marker);
    (marker.starts_with("required") || marker == "yes" || marker == "true")
        && !marker.contains("not")
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        normalize_label(answer).split(' ').next(),
        Some("yes" | "true" | "submitted")
    )
}

/// Post-run check of a reported outcome against the plan it was executed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeAudit {
    /// Required fields the form shows that the agent never reported.
    pub missing_required: Vec<String>,
    /// Fields reported before an earlier phase was complete.
    pub phase_violations: Vec<String>,
    /// Reported labels that match no planned field.
    pub unmatched_fields: Vec<String>,
    /// `None` when the license question was not reported.
    pub license_answer_ok: Option<bool>,
    pub submitted: bool,
}

impl OutcomeAudit {
    /// Replay the reported fields, in reported order, through the phase gate.
    pub fn inspect(plan: &FillPlan, outcome: &ApplicationOutcome) -> Self {
        let mut audit = Self::default();
        let mut run = FormRun::new(plan);

        let matched: Vec<(&str, &FieldEntry)> = outcome
            .fields
            .iter()
            .filter_map(|field| match plan.match_label(&field.label) {
                Some(entry) => Some((entry.key(), field)),
                None => {
                    audit.unmatched_fields.push(field.label.clone());
                    None
                }
            })
            .collect();

        let reported: BTreeSet<&str> = matched.iter().map(|(key, _)| *key).collect();
        for entry in plan.entries() {
            if entry.kind() == FieldKind::Action
                || entry.absent
                || reported.contains(entry.key())
            {
                continue;
            }
            if entry.required() {
                audit.missing_required.push(entry.label.clone());
            }
            // Unreported fields cannot hold the gate for the fields reported after them.
            let _ = run.mark_absent(entry.key());
        }

        for (key, field) in matched {
            if key == LICENSE_KEY {
                audit.license_answer_ok = Some(normalize_label(&field.value) == "no");
            }

            match run.record_filled(key, field.value.clone()) {
                Ok(()) => {}
                Err(RunError::PhaseGate { phase, pending, .. }) => {
                    audit.phase_violations.push(format!(
                        "{} reported before {} was complete ({})",
                        field.label,
                        phase.label(),
                        pending.join(", ")
                    ));
                    let _ = run.mark_absent(key);
                }
                Err(_) => {}
            }
            let _ = run.record_verified(key);
        }

        if outcome.submitted && run.record_submitted().is_ok() {
            audit.submitted = run.confirm_submission().is_ok();
        }

        audit
    }

    pub fn is_clean(&self) -> bool {
        self.missing_required.is_empty()
            && self.phase_violations.is_empty()
            && self.license_answer_ok != Some(false)
            && self.submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_outcome_is_read() {
        let raw = "Done.\n```json\n{\"summary\": \"ok\", \"fields\": [{\"label\": \"Email\", \"type\": \"email\", \"value\": \"jane@example.com\", \"required\": \"Required\"}], \"submitted\": true}\n```";
        let outcome = parse_outcome(raw).expect("parses");
        assert!(outcome.submitted);
        assert_eq!(outcome.summary, "ok");
        assert_eq!(outcome.fields[0].kind, "email");
        assert!(outcome.fields[0].required);
    }

    #[test]
    fn plain_report_is_read() {
        let raw = "Successfully completed job application form with the following actions:\n\
                   - Filled 4 text input fields\n\
                   - Form submitted: Yes\n\
                   \n\
                   QUESTIONS ENCOUNTERED:\n\
                   - Field name | Field type | Value entered | Required?\n\
                   - Legal First Name | text | Jane | Required\n\
                   - Gender | dropdown | Prefer not to answer | Optional";
        let outcome = parse_outcome(raw).expect("parses");

        assert!(outcome.submitted);
        assert_eq!(outcome.fields.len(), 2);
        assert_eq!(outcome.fields[0].value, "Jane");
        assert!(outcome.fields[0].required);
        assert!(!outcome.fields[1].required);
        assert!(outcome.summary.starts_with("Successfully completed"));
    }

    #[test]
    fn numbered_lines_and_negative_submission() {
        let outcome = parse_outcome("1. Email | email | a@b.co | Required\nForm submitted: No")
            .expect("parses");
        assert!(!outcome.submitted);
        assert_eq!(outcome.fields[0].label, "Email");
    }

    #[test]
    fn prose_without_fields_is_unrecognized() {
        assert_eq!(
            parse_outcome("I could not find the form."),
            Err(OutcomeParseError::Unrecognized)
        );
        assert_eq!(parse_outcome("   "), Err(OutcomeParseError::Empty));
    }

    #[test]
    fn extract_json_finds_embedded_object() {
        let value = extract_json("Here you go: {\"a\": 1} thanks").expect("object");
        assert_eq!(value["a"], 1);
        assert!(extract_json("no json at all").is_none());
    }

    #[test]
    fn required_marker_rejects_negations() {
        assert!(is_required_marker("Required"));
        assert!(is_required_marker("required*"));
        assert!(!is_required_marker("Not required"));
        assert!(!is_required_marker("Optional"));
    }
}
