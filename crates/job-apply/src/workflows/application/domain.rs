use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Semantic applicant keys the workflow knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKey {
    FirstName,
    LastName,
    Email,
    Phone,
    Age,
    UsCitizen,
    SponsorshipNeeded,
    PostalCode,
    Country,
    State,
    City,
    Address,
    Motivation,
    YearsExperience,
    JobExperiences,
    Gender,
    Race,
    HispanicLatino,
    VeteranStatus,
    DisabilityStatus,
}

impl ProfileKey {
    /// Accepted spellings, checked in order. Matching ignores case.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::FirstName => &["first_name", "firstName", "legal_first_name"],
            Self::LastName => &["last_name", "lastName", "legal_last_name"],
            Self::Email => &["email", "email_address"],
            Self::Phone => &["phone", "phone_number", "phoneNumber"],
            Self::Age => &["age"],
            Self::UsCitizen => &[
                "US_citizen",
                "us_citizen",
                "eligibility_to_work",
                "eligibilityToWork",
            ],
            Self::SponsorshipNeeded => &["sponsorship_needed", "sponsorshipNeeded", "needs_visa"],
            Self::PostalCode => &["postal_code", "postCode", "zip", "zip_code"],
            Self::Country => &["country"],
            Self::State => &["state", "province"],
            Self::City => &["city"],
            Self::Address => &["address", "street_address", "address_line"],
            Self::Motivation => &["motivation", "why_healthcare", "profile_summary", "profileSummary"],
            Self::YearsExperience => &[
                "years_experience",
                "yearsExperience",
                "years_of_experience",
                "experience",
            ],
            Self::JobExperiences => &["job_experiences", "jobExperiences", "work_history"],
            Self::Gender => &["gender"],
            Self::Race => &["race", "ethnicity"],
            Self::HispanicLatino => &["hispanic_latino", "hispanic_or_latino", "hispanicLatino"],
            Self::VeteranStatus => &["Veteran_status", "veteran_status", "veteranStatus"],
            Self::DisabilityStatus => &["disability_status", "disabilityStatus"],
        }
    }
}

/// Caller-supplied applicant data. No schema is enforced; absent keys are inferred downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantProfile(pub Map<String, Value>);

impl ApplicantProfile {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns `None` unless `value` is a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    fn lookup(&self, key: ProfileKey) -> Option<&Value> {
        key.aliases().iter().find_map(|alias| {
            self.0
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(alias))
                .map(|(_, value)| value)
        })
    }

    /// Non-empty text for `key`. Numbers and booleans are rendered as text.
    pub fn text(&self, key: ProfileKey) -> Option<String> {
        match self.lookup(key)? {
            Value::String(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(if *flag { "Yes" } else { "No" }.to_string()),
            _ => None,
        }
    }

    /// Boolean reading of `key`, accepting JSON booleans and yes/no style strings.
    pub fn flag(&self, key: ProfileKey) -> Option<bool> {
        match self.lookup(key)? {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" => Some(true),
                "false" | "no" | "n" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Array entries for `key`; empty when absent or not an array.
    pub fn entries(&self, key: ProfileKey) -> &[Value] {
        match self.lookup(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    pub fn number(&self, key: ProfileKey) -> Option<f64> {
        match self.lookup(key)? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().trim_end_matches('+').parse().ok(),
            _ => None,
        }
    }
}

/// Control type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    File,
    Radio,
    Dropdown,
    TextArea,
    Date,
    Action,
}

impl FieldKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Radio => "radio",
            Self::Dropdown => "dropdown",
            Self::TextArea => "textarea",
            Self::Date => "date",
            Self::Action => "action",
        }
    }

    /// Lenient reading of the kind column agents report back.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "email" | "tel" | "phone" | "input" => Some(Self::Text),
            "file" | "upload" => Some(Self::File),
            "radio" | "radio button" | "single-select" | "checkbox" => Some(Self::Radio),
            "dropdown" | "select" | "combobox" => Some(Self::Dropdown),
            "textarea" | "text area" | "multi-line text" => Some(Self::TextArea),
            "date" | "date picker" => Some(Self::Date),
            "action" | "button" | "submit" => Some(Self::Action),
            _ => None,
        }
    }
}

/// Ordered groups of fields. Every required field of a phase must be verified before the next
/// phase starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    ContactInfo,
    FileUpload,
    Address,
    Eligibility,
    FreeText,
    Voluntary,
    Date,
    Submit,
}

impl WorkflowPhase {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::ContactInfo,
            Self::FileUpload,
            Self::Address,
            Self::Eligibility,
            Self::FreeText,
            Self::Voluntary,
            Self::Date,
            Self::Submit,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ContactInfo => "Text Input Fields (Legal Name & Contact)",
            Self::FileUpload => "File Upload",
            Self::Address => "Address Fields",
            Self::Eligibility => "Radio Button Selections",
            Self::FreeText => "Text Area",
            Self::Voluntary => "Dropdown Selections",
            Self::Date => "Final Field",
            Self::Submit => "Submit",
        }
    }

    /// 1-based ordinal used in rendered instructions.
    pub fn number(self) -> usize {
        Self::ordered()
            .iter()
            .position(|phase| *phase == self)
            .map(|index| index + 1)
            .unwrap_or_default()
    }
}

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Plain text from the profile.
    Profile(ProfileKey),
    /// Yes/No derived from a profile flag, with a fallback when absent.
    YesNo { key: ProfileKey, default: bool },
    /// Yes when the profile age is at least 18.
    AdultAge { default: bool },
    /// Fixed answer regardless of profile content.
    Always(&'static str),
    /// Profile option, else the neutral option.
    Voluntary {
        key: ProfileKey,
        neutral: &'static str,
    },
    /// Profile option, else the first option of the rendered list.
    FirstListedOption { key: ProfileKey },
    /// Profile answer, else the configured fallback sentence.
    Motivation,
    YearsOfExperience,
    ResumeUpload,
    CurrentDate,
    SubmitControl,
    /// Question found on the live form with no standard template; answered from extraction.
    FormQuestion,
}

/// Field whose value may appear as a side effect of filling another field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutofillDependency {
    pub populated_by: &'static str,
}

/// Static description of one form field.
#[derive(Debug, Clone)]
pub struct FieldTemplate {
    pub key: &'static str,
    pub label: &'static str,
    pub alternate_labels: Vec<&'static str>,
    pub kind: FieldKind,
    pub phase: WorkflowPhase,
    pub required: bool,
    pub source: ValueSource,
    /// Used when the source yields nothing.
    pub default: Option<&'static str>,
    pub autofill: Option<AutofillDependency>,
    /// Wait applied after the field is written, before anything dependent is checked.
    pub settle: Option<Duration>,
    /// Re-read the field after writing it.
    pub verify: bool,
    pub hints: Vec<&'static str>,
}

impl FieldTemplate {
    /// True when `label` names this field, by primary or alternate label.
    pub fn matches_label(&self, label: &str) -> bool {
        let wanted = normalize_label(label);
        if wanted.is_empty() {
            return false;
        }
        std::iter::once(self.label)
            .chain(self.alternate_labels.iter().copied())
            .map(normalize_label)
            .any(|candidate| contains_phrase(&wanted, &candidate))
    }
}

/// Whole-word containment of one normalized label in another.
pub(crate) fn contains_phrase(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && format!(" {haystack} ").contains(&format!(" {needle} "))
}

/// Lowercase, strip required markers and punctuation, collapse whitespace.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Page-aware answer set produced by the extraction pass. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub raw: String,
    pub answers: Option<Value>,
}

impl ExtractionResult {
    pub fn from_agent_output(raw: &str) -> Self {
        let answers = super::outcome::extract_json(raw).filter(Value::is_object);
        Self {
            raw: raw.trim().to_string(),
            answers,
        }
    }

    /// Fields the form showed, in page order. `None` unless the pass returned a non-empty list.
    pub fn form_fields(&self) -> Option<Vec<FormField>> {
        let fields: Vec<FormField> = self
            .answers
            .as_ref()?
            .get("fields")?
            .as_array()?
            .iter()
            .filter_map(FormField::from_json)
            .collect();
        (!fields.is_empty()).then_some(fields)
    }

    /// Labels the agent reported as missing from the form.
    pub fn absent_labels(&self) -> Vec<String> {
        self.answers
            .as_ref()
            .and_then(|answers| answers.get("absent_fields"))
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Text handed to the execution pass as its source of truth.
    pub fn source_data(&self) -> String {
        match &self.answers {
            Some(answers) => {
                serde_json::to_string_pretty(answers).unwrap_or_else(|_| self.raw.clone())
            }
            None => self.raw.clone(),
        }
    }
}

/// One field of the live form, as read by the extraction pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub label: String,
    pub kind: Option<FieldKind>,
    pub required: bool,
    pub answer: Option<String>,
}

impl FormField {
    fn from_json(item: &Value) -> Option<Self> {
        let label = item.get("label")?.as_str()?.trim();
        if label.is_empty() {
            return None;
        }

        Some(Self {
            label: label.to_string(),
            kind: item
                .get("kind")
                .or_else(|| item.get("type"))
                .and_then(Value::as_str)
                .and_then(FieldKind::parse),
            required: item
                .get("required")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            answer: match item.get("answer") {
                Some(Value::String(text)) => {
                    Some(text.trim().to_string()).filter(|text| !text.is_empty())
                }
                Some(Value::Number(number)) => Some(number.to_string()),
                Some(Value::Bool(flag)) => Some(if *flag { "Yes" } else { "No" }.to_string()),
                _ => None,
            },
        })
    }
}

/// One field as the agent reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub label: String,
    pub kind: String,
    pub value: String,
    pub required: bool,
}

/// Final result of the execution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationOutcome {
    pub summary: String,
    pub fields: Vec<FieldEntry>,
    pub submitted: bool,
}

impl ApplicationOutcome {
    /// Normalized labels in the order the agent filled them.
    pub fn coverage(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|field| normalize_label(&field.label))
            .collect()
    }

    pub fn field(&self, label: &str) -> Option<&FieldEntry> {
        let wanted = normalize_label(label);
        self.fields
            .iter()
            .find(|field| contains_phrase(&normalize_label(&field.label), &wanted))
    }
}
