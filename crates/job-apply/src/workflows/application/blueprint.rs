use std::time::Duration;

use super::domain::{
    AutofillDependency, FieldKind, FieldTemplate, ProfileKey, ValueSource, WorkflowPhase,
};

const POSTAL_CODE_KEY: &str = "postal_code";

#[derive(Debug, Clone)]
pub struct ApplicationBlueprint {
    fields: Vec<FieldTemplate>,
}

impl ApplicationBlueprint {
    /// Standard career-portal application form, in top-to-bottom order.
    pub fn standard() -> Self {
        Self {
            fields: standard_field_templates(),
        }
    }

    pub fn from_templates(fields: Vec<FieldTemplate>) -> Self {
        Self { fields }
    }

    pub fn fields_for_phase(&self, phase: WorkflowPhase) -> Vec<&FieldTemplate> {
        self.fields
            .iter()
            .filter(|field| field.phase == phase)
            .collect()
    }

    pub fn field(&self, key: &str) -> Option<&FieldTemplate> {
        self.fields.iter().find(|field| field.key == key)
    }

    pub fn field_templates(&self) -> &[FieldTemplate] {
        &self.fields
    }
}

fn text(
    key: &'static str,
    label: &'static str,
    alternate_labels: Vec<&'static str>,
    phase: WorkflowPhase,
    required: bool,
    source: ValueSource,
) -> FieldTemplate {
    FieldTemplate {
        key,
        label,
        alternate_labels,
        kind: FieldKind::Text,
        phase,
        required,
        source,
        default: None,
        autofill: None,
        settle: None,
        verify: true,
        hints: Vec::new(),
    }
}

fn standard_field_templates() -> Vec<FieldTemplate> {
    let populated_by_postal_code = Some(AutofillDependency {
        populated_by: POSTAL_CODE_KEY,
    });

    vec![
        FieldTemplate {
            hints: vec!["Look for an input with a placeholder or label containing \"First\"."],
            ..text(
                "first_name",
                "Legal First Name",
                vec!["First Name"],
                WorkflowPhase::ContactInfo,
                true,
                ValueSource::Profile(ProfileKey::FirstName),
            )
        },
        FieldTemplate {
            hints: vec!["Look for an input with a placeholder or label containing \"Last\"."],
            ..text(
                "last_name",
                "Legal Last Name",
                vec!["Last Name"],
                WorkflowPhase::ContactInfo,
                true,
                ValueSource::Profile(ProfileKey::LastName),
            )
        },
        FieldTemplate {
            hints: vec!["Enter the complete email address."],
            ..text(
                "email",
                "Email",
                vec!["Email Address"],
                WorkflowPhase::ContactInfo,
                true,
                ValueSource::Profile(ProfileKey::Email),
            )
        },
        FieldTemplate {
            hints: vec![
                "If a country code dropdown exists, ensure it shows +1 (USA).",
                "Accept either xxx-xxx-xxxx or xxxxxxxxxx formats.",
            ],
            ..text(
                "phone",
                "Phone",
                vec!["Phone Number", "Mobile Phone"],
                WorkflowPhase::ContactInfo,
                true,
                ValueSource::Profile(ProfileKey::Phone),
            )
        },
        FieldTemplate {
            key: "resume",
            label: "Resume",
            alternate_labels: vec!["Upload Resume", "Resume/CV", "CV"],
            kind: FieldKind::File,
            phase: WorkflowPhase::FileUpload,
            required: true,
            source: ValueSource::ResumeUpload,
            default: None,
            autofill: None,
            settle: Some(Duration::from_secs(3)),
            verify: true,
            hints: vec![
                "Look for an \"Upload Resume\" button, a file input, or a document/paperclip icon.",
                "If the button does not accept the file, use the upload area instead.",
                "Verify the file name appears on the page.",
            ],
        },
        FieldTemplate {
            settle: Some(Duration::from_secs(3)),
            hints: vec!["City, state and country may populate from this value."],
            ..text(
                POSTAL_CODE_KEY,
                "Postal Code",
                vec!["ZIP Code", "Zip", "Postcode"],
                WorkflowPhase::Address,
                true,
                ValueSource::Profile(ProfileKey::PostalCode),
            )
        },
        FieldTemplate {
            key: "country",
            label: "Country",
            alternate_labels: Vec::new(),
            kind: FieldKind::Dropdown,
            phase: WorkflowPhase::Address,
            required: true,
            source: ValueSource::Profile(ProfileKey::Country),
            default: Some("United States"),
            autofill: populated_by_postal_code,
            settle: None,
            verify: true,
            hints: vec!["Open the dropdown and select \"United States\" or \"USA\" when it needs filling."],
        },
        FieldTemplate {
            key: "state",
            label: "State",
            alternate_labels: vec!["State/Province", "Province"],
            kind: FieldKind::Dropdown,
            phase: WorkflowPhase::Address,
            required: false,
            source: ValueSource::Profile(ProfileKey::State),
            default: None,
            autofill: populated_by_postal_code,
            settle: None,
            verify: true,
            hints: vec!["May be a dropdown or a text field; a text field takes the state abbreviation."],
        },
        FieldTemplate {
            autofill: populated_by_postal_code,
            ..text(
                "city",
                "City",
                Vec::new(),
                WorkflowPhase::Address,
                true,
                ValueSource::Profile(ProfileKey::City),
            )
        },
        FieldTemplate {
            hints: vec!["This field does not auto-populate; enter the full street address."],
            ..text(
                "address_line",
                "Address Line",
                vec!["Street Address", "Address"],
                WorkflowPhase::Address,
                false,
                ValueSource::Profile(ProfileKey::Address),
            )
        },
        radio(
            "over_18",
            "Are you over the age of 18?",
            vec!["over the age of 18"],
            true,
            ValueSource::AdultAge { default: true },
        ),
        radio(
            "work_eligibility",
            "Are you eligible to work in the United States?",
            vec!["eligible to work"],
            true,
            ValueSource::YesNo {
                key: ProfileKey::UsCitizen,
                default: true,
            },
        ),
        radio(
            "sponsorship",
            "Will you require sponsorship for employment visa?",
            vec!["require sponsorship", "sponsorship"],
            true,
            ValueSource::YesNo {
                key: ProfileKey::SponsorshipNeeded,
                default: false,
            },
        ),
        FieldTemplate {
            hints: vec![
                "Scan thoroughly for this question; it is easy to miss.",
                "ALWAYS select \"No\" for this field.",
            ],
            ..radio(
                "professional_license",
                "Do you have or are obtaining a professional license?",
                vec!["professional license"],
                true,
                ValueSource::Always("No"),
            )
        },
        FieldTemplate {
            key: "motivation",
            label: "What drew you to healthcare?",
            alternate_labels: vec!["motivation"],
            kind: FieldKind::TextArea,
            phase: WorkflowPhase::FreeText,
            required: false,
            source: ValueSource::Motivation,
            default: None,
            autofill: None,
            settle: None,
            verify: true,
            hints: vec!["Click inside the text area before typing."],
        },
        FieldTemplate {
            hints: vec!["Compute years from the job experiences and pick the closest matching range."],
            ..dropdown(
                "years_experience",
                "Years of experience in related role",
                vec!["Years of experience"],
                true,
                ValueSource::YearsOfExperience,
            )
        },
        dropdown(
            "gender",
            "Gender",
            Vec::new(),
            false,
            ValueSource::Voluntary {
                key: ProfileKey::Gender,
                neutral: "Prefer not to answer",
            },
        ),
        FieldTemplate {
            hints: vec!["Fully click the matching option; this dropdown is often opened and then skipped."],
            ..dropdown(
                "race",
                "Race/Ethnicity",
                vec!["Race", "Ethnicity"],
                false,
                ValueSource::Voluntary {
                    key: ProfileKey::Race,
                    neutral: "Prefer not to answer",
                },
            )
        },
        FieldTemplate {
            kind: FieldKind::Radio,
            hints: vec!["May be radio buttons or a dropdown."],
            ..dropdown(
                "hispanic_latino",
                "Hispanic or Latino",
                Vec::new(),
                true,
                ValueSource::Voluntary {
                    key: ProfileKey::HispanicLatino,
                    neutral: "No",
                },
            )
        },
        FieldTemplate {
            hints: vec!["Listed under the Armed Forces Service Medal veteran section."],
            ..dropdown(
                "veteran_status",
                "Veteran Status",
                vec!["Veteran"],
                false,
                ValueSource::Voluntary {
                    key: ProfileKey::VeteranStatus,
                    neutral: "I am not a veteran",
                },
            )
        },
        FieldTemplate {
            kind: FieldKind::Radio,
            hints: vec![
                "Radio buttons in a vertical list under Voluntary Self-Identification.",
                "Be thorough; this question has been skipped before.",
            ],
            ..dropdown(
                "disability_status",
                "Disability Status",
                vec!["Disability"],
                false,
                ValueSource::FirstListedOption {
                    key: ProfileKey::DisabilityStatus,
                },
            )
        },
        FieldTemplate {
            key: "todays_date",
            label: "Please enter today's date",
            alternate_labels: vec!["today's date"],
            kind: FieldKind::Date,
            phase: WorkflowPhase::Date,
            required: true,
            source: ValueSource::CurrentDate,
            default: None,
            autofill: None,
            settle: None,
            verify: true,
            hints: vec!["If a date picker appears, click it and select today's date."],
        },
        FieldTemplate {
            key: "submit",
            label: "Submit your application",
            alternate_labels: vec!["Submit"],
            kind: FieldKind::Action,
            phase: WorkflowPhase::Submit,
            required: true,
            source: ValueSource::SubmitControl,
            default: None,
            autofill: None,
            settle: None,
            verify: false,
            hints: vec![
                "Usually a blue button at the bottom of the page.",
                "Wait for a confirmation message or page after clicking.",
            ],
        },
    ]
}

fn radio(
    key: &'static str,
    label: &'static str,
    alternate_labels: Vec<&'static str>,
    required: bool,
    source: ValueSource,
) -> FieldTemplate {
    FieldTemplate {
        kind: FieldKind::Radio,
        hints: vec!["Click the circle itself, not the text label, and confirm it shows as selected."],
        ..text(
            key,
            label,
            alternate_labels,
            WorkflowPhase::Eligibility,
            required,
            source,
        )
    }
}

fn dropdown(
    key: &'static str,
    label: &'static str,
    alternate_labels: Vec<&'static str>,
    required: bool,
    source: ValueSource,
) -> FieldTemplate {
    FieldTemplate {
        kind: FieldKind::Dropdown,
        ..text(
            key,
            label,
            alternate_labels,
            WorkflowPhase::Voluntary,
            required,
            source,
        )
    }
}
