use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use serde_json::Value;

use super::autofill::{reconcile, AutofillAction};
use super::blueprint::ApplicationBlueprint;
use super::domain::{
    normalize_label, ApplicantProfile, ExtractionResult, FieldKind, FieldTemplate, FormField,
    ProfileKey, ValueSource, WorkflowPhase,
};
use super::wording::WorkflowWording;

/// What the agent should put into a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum PlannedValue {
    Enter(String),
    Select(String),
    /// First option of the rendered list, whatever its wording.
    SelectFirstOption,
    Upload(PathBuf),
    Date(String),
    /// No profile value; the agent infers it from the extracted source data.
    Infer,
    Activate,
}

impl PlannedValue {
    /// Concrete answer the field should end up holding, when one is known up front.
    pub fn expected_answer(&self) -> Option<&str> {
        match self {
            Self::Enter(value) | Self::Select(value) | Self::Date(value) => Some(value),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Enter(value) => format!("enter \"{value}\""),
            Self::Select(value) => format!("select \"{value}\""),
            Self::SelectFirstOption => "select the first option in the list".to_string(),
            Self::Upload(path) => format!(
                "upload {}",
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            ),
            Self::Date(value) => format!("enter today's date \"{value}\""),
            Self::Infer => "use the matching value from the source data".to_string(),
            Self::Activate => "click the control".to_string(),
        }
    }
}

/// Why a field holds the value it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueProvenance {
    Profile,
    /// Answer the extraction pass paired with the live form.
    Extracted,
    /// Business rule that ignores the profile.
    Override,
    Default,
    Inferred,
    Clock,
    Resume,
    Control,
}

/// One resolved step of the fill plan.
#[derive(Debug, Clone)]
pub struct PlannedFill {
    pub key: String,
    pub template: FieldTemplate,
    pub label: String,
    pub value: PlannedValue,
    pub provenance: ValueProvenance,
    pub settle: Option<Duration>,
    /// The live form does not show this field.
    pub absent: bool,
}

impl PlannedFill {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.template.phase
    }

    pub fn kind(&self) -> FieldKind {
        self.template.kind
    }

    pub fn required(&self) -> bool {
        self.template.required
    }

    pub fn matches_label(&self, label: &str) -> bool {
        normalize_label(label) == normalize_label(&self.label) || self.template.matches_label(label)
    }
}

/// Ordered field-by-field plan for one application run.
#[derive(Debug, Clone)]
pub struct FillPlan {
    entries: Vec<PlannedFill>,
    today: NaiveDate,
}

impl FillPlan {
    pub fn build(
        blueprint: &ApplicationBlueprint,
        profile: &ApplicantProfile,
        wording: &WorkflowWording,
        resume_path: &Path,
        today: NaiveDate,
    ) -> Self {
        let templates = blueprint.field_templates();
        let mut entries: Vec<PlannedFill> = templates
            .iter()
            .map(|template| {
                let (value, provenance) =
                    resolve_value(template, profile, wording, resume_path, today);
                let label = match template.source {
                    ValueSource::Motivation => wording.motivation_question.clone(),
                    ValueSource::SubmitControl => wording.submit_label.clone(),
                    _ => template.label.to_string(),
                };
                let drives_autofill = templates.iter().any(|other| {
                    other
                        .autofill
                        .is_some_and(|dependency| dependency.populated_by == template.key)
                });
                let settle = if template.kind == FieldKind::File {
                    Some(wording.upload_settle)
                } else if drives_autofill {
                    Some(wording.postal_code_settle)
                } else {
                    template.settle
                };

                PlannedFill {
                    key: template.key.to_string(),
                    template: template.clone(),
                    label,
                    value,
                    provenance,
                    settle,
                    absent: false,
                }
            })
            .collect();

        // Stable: blueprint order is kept within a phase.
        entries.sort_by_key(PlannedFill::phase);

        Self { entries, today }
    }

    pub fn entries(&self) -> &[PlannedFill] {
        &self.entries
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn entry(&self, key: &str) -> Option<&PlannedFill> {
        self.entries.iter().find(|entry| entry.key() == key)
    }

    pub fn entries_for_phase(&self, phase: WorkflowPhase) -> impl Iterator<Item = &PlannedFill> {
        self.entries.iter().filter(move |entry| entry.phase() == phase)
    }

    /// Keys of the fields the form shows, in fill order.
    pub fn field_order(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| !entry.absent)
            .map(PlannedFill::key)
            .collect()
    }

    /// Align the plan with the field set the extraction pass read off the live form.
    ///
    /// Fields listed under `absent_fields` are marked absent. When the pass returned a field
    /// inventory, planned fields it does not list are absent too, extracted answers replace
    /// values the plan could only infer, and questions no template covers are added in the
    /// phase of the field they follow. Without an inventory the plan is left as built.
    pub fn fit_to_form(mut self, extraction: &ExtractionResult) -> Self {
        for label in extraction.absent_labels() {
            if let Some(index) = self.position_of_label(&label) {
                if self.entries[index].kind() != FieldKind::Action {
                    self.entries[index].absent = true;
                }
            }
        }

        let Some(form_fields) = extraction.form_fields() else {
            return self;
        };

        let mut listed = vec![false; self.entries.len()];
        let mut extras: Vec<(Option<String>, PlannedFill)> = Vec::new();
        let mut anchor: Option<(String, WorkflowPhase)> = None;

        for field in &form_fields {
            match self.position_of_label(&field.label) {
                Some(index) => {
                    listed[index] = true;
                    let entry = &mut self.entries[index];
                    match &field.answer {
                        Some(answer) if entry.value == PlannedValue::Infer => {
                            entry.value = answer_value(entry.kind(), answer.clone());
                            entry.provenance = ValueProvenance::Extracted;
                        }
                        _ => {}
                    }
                    anchor = Some((entry.key.clone(), entry.phase()));
                }
                None => {
                    let after_phase = anchor.as_ref().map(|(_, phase)| *phase);
                    let Some(extra) = form_question(field, after_phase) else {
                        continue;
                    };
                    let taken = self.entries.iter().any(|entry| entry.key == extra.key)
                        || extras.iter().any(|(_, other)| other.key == extra.key);
                    if taken {
                        continue;
                    }
                    let after = anchor
                        .as_ref()
                        .filter(|(_, phase)| *phase == extra.phase())
                        .map(|(key, _)| key.clone());
                    anchor = Some((extra.key.clone(), extra.phase()));
                    extras.push((after, extra));
                }
            }
        }

        for (entry, listed) in self.entries.iter_mut().zip(listed) {
            if !listed && entry.kind() != FieldKind::Action {
                entry.absent = true;
            }
        }

        for (after, extra) in extras {
            let index = after
                .and_then(|key| self.entries.iter().position(|entry| entry.key == key))
                .map(|index| index + 1)
                .unwrap_or_else(|| {
                    self.entries
                        .iter()
                        .rposition(|entry| entry.phase() <= extra.phase())
                        .map_or(0, |index| index + 1)
                });
            self.entries.insert(index, extra);
        }

        self
    }

    fn position_of_label(&self, label: &str) -> Option<usize> {
        let key = self.match_label(label)?.key.clone();
        self.entries.iter().position(|entry| entry.key == key)
    }

    /// Resolve a reported label to a planned field. Exact label matches win over partial ones.
    pub fn match_label(&self, label: &str) -> Option<&PlannedFill> {
        let wanted = normalize_label(label);
        self.entries
            .iter()
            .find(|entry| {
                normalize_label(&entry.label) == wanted
                    || std::iter::once(entry.template.label)
                        .chain(entry.template.alternate_labels.iter().copied())
                        .any(|candidate| normalize_label(candidate) == wanted)
            })
            .or_else(|| self.entries.iter().find(|entry| entry.matches_label(label)))
    }

    /// Decide, for each field that depends on `driver_key`, whether the page's autofilled
    /// value stays. `observed` holds what the page shows after the settle wait, keyed by field.
    pub fn reconcile_autofill<'a>(
        &self,
        driver_key: &str,
        observed: impl Fn(&str) -> Option<&'a str>,
    ) -> Vec<(&str, AutofillAction)> {
        self.entries
            .iter()
            .filter(|entry| {
                entry
                    .template
                    .autofill
                    .is_some_and(|dependency| dependency.populated_by == driver_key)
            })
            .map(|entry| (entry.key(), reconcile(entry.key(), observed(entry.key()), &entry.value)))
            .collect()
    }
}

fn resolve_value(
    template: &FieldTemplate,
    profile: &ApplicantProfile,
    wording: &WorkflowWording,
    resume_path: &Path,
    today: NaiveDate,
) -> (PlannedValue, ValueProvenance) {
    let from_profile = |key: ProfileKey| profile.text(key);
    let wrap = |value: String| match template.kind {
        FieldKind::Radio | FieldKind::Dropdown => PlannedValue::Select(value),
        _ => PlannedValue::Enter(value),
    };

    match template.source {
        ValueSource::Profile(key) => match (from_profile(key), template.default) {
            (Some(value), _) => (wrap(value), ValueProvenance::Profile),
            (None, Some(default)) => (wrap(default.to_string()), ValueProvenance::Default),
            (None, None) => (PlannedValue::Infer, ValueProvenance::Inferred),
        },
        ValueSource::YesNo { key, default } => match profile.flag(key) {
            Some(flag) => (wrap(yes_no(flag)), ValueProvenance::Profile),
            None => (wrap(yes_no(default)), ValueProvenance::Default),
        },
        ValueSource::AdultAge { default } => match profile.number(ProfileKey::Age) {
            Some(age) => (wrap(yes_no(age >= 18.0)), ValueProvenance::Profile),
            None => (wrap(yes_no(default)), ValueProvenance::Default),
        },
        ValueSource::Always(answer) => (wrap(answer.to_string()), ValueProvenance::Override),
        ValueSource::Voluntary { key, neutral } => match from_profile(key) {
            Some(value) => (PlannedValue::Select(value), ValueProvenance::Profile),
            None => (
                PlannedValue::Select(neutral.to_string()),
                ValueProvenance::Default,
            ),
        },
        ValueSource::FirstListedOption { key } => match from_profile(key) {
            Some(value) => (PlannedValue::Select(value), ValueProvenance::Profile),
            None => (PlannedValue::SelectFirstOption, ValueProvenance::Default),
        },
        ValueSource::Motivation => match from_profile(ProfileKey::Motivation) {
            Some(answer) => (PlannedValue::Enter(answer), ValueProvenance::Profile),
            None => (
                PlannedValue::Enter(wording.motivation_fallback.clone()),
                ValueProvenance::Default,
            ),
        },
        ValueSource::YearsOfExperience => {
            let years = profile
                .number(ProfileKey::YearsExperience)
                .map(|years| years.max(0.0).floor() as u32)
                .or_else(|| years_from_experiences(profile.entries(ProfileKey::JobExperiences), today));
            match years {
                Some(years) => (
                    PlannedValue::Select(format!("{years} years")),
                    ValueProvenance::Profile,
                ),
                None => (PlannedValue::Infer, ValueProvenance::Inferred),
            }
        }
        ValueSource::ResumeUpload => (
            PlannedValue::Upload(resume_path.to_path_buf()),
            ValueProvenance::Resume,
        ),
        ValueSource::CurrentDate => (
            PlannedValue::Date(wording.format_date(today)),
            ValueProvenance::Clock,
        ),
        ValueSource::SubmitControl => (PlannedValue::Activate, ValueProvenance::Control),
        ValueSource::FormQuestion => (PlannedValue::Infer, ValueProvenance::Inferred),
    }
}

/// Planned entry for a form question with no matching template.
fn form_question(field: &FormField, after: Option<WorkflowPhase>) -> Option<PlannedFill> {
    let kind = field.kind.unwrap_or(FieldKind::Text);
    if kind == FieldKind::Action {
        return None;
    }
    let slug = normalize_label(&field.label).replace(' ', "_");
    if slug.is_empty() {
        return None;
    }

    let phase = after
        .unwrap_or(match kind {
            FieldKind::File => WorkflowPhase::FileUpload,
            FieldKind::Radio => WorkflowPhase::Eligibility,
            FieldKind::TextArea => WorkflowPhase::FreeText,
            FieldKind::Dropdown => WorkflowPhase::Voluntary,
            FieldKind::Date => WorkflowPhase::Date,
            FieldKind::Text | FieldKind::Action => WorkflowPhase::ContactInfo,
        })
        .min(WorkflowPhase::Date);

    let (value, provenance) = match &field.answer {
        Some(answer) => (answer_value(kind, answer.clone()), ValueProvenance::Extracted),
        None => (PlannedValue::Infer, ValueProvenance::Inferred),
    };

    Some(PlannedFill {
        key: format!("form_{slug}"),
        template: FieldTemplate {
            key: "form_question",
            label: "",
            alternate_labels: Vec::new(),
            kind,
            phase,
            required: field.required,
            source: ValueSource::FormQuestion,
            default: None,
            autofill: None,
            settle: None,
            verify: true,
            hints: Vec::new(),
        },
        label: field.label.clone(),
        value,
        provenance,
        settle: None,
        absent: false,
    })
}

fn answer_value(kind: FieldKind, answer: String) -> PlannedValue {
    match kind {
        FieldKind::Radio | FieldKind::Dropdown => PlannedValue::Select(answer),
        _ => PlannedValue::Enter(answer),
    }
}

fn yes_no(flag: bool) -> String {
    let answer = if flag { "Yes" } else { "No" };
    answer.to_string()
}

/// Whole years covered by a list of `{startDate, endDate, currentJob}` entries.
fn years_from_experiences(entries: &[Value], today: NaiveDate) -> Option<u32> {
    let months: i64 = entries
        .iter()
        .filter_map(|entry| {
            let start = date_field(entry, &["start_date", "startDate"])?;
            let current = entry
                .get("current_job")
                .or_else(|| entry.get("currentJob"))
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let end = if current {
                today
            } else {
                date_field(entry, &["end_date", "endDate"]).unwrap_or(today)
            };
            let span = (end.year() as i64 - start.year() as i64) * 12 + end.month() as i64
                - start.month() as i64;
            (span > 0).then_some(span)
        })
        .sum();

    (months > 0).then(|| (months / 12) as u32)
}

fn date_field(entry: &Value, names: &[&str]) -> Option<NaiveDate> {
    let raw = names
        .iter()
        .find_map(|name| entry.get(*name).and_then(Value::as_str))?
        .trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .ok()
}
