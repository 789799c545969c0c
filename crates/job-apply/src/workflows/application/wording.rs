use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";
const DEFAULT_MOTIVATION_FALLBACK: &str = "I am passionate about making a meaningful impact in people's lives through healthcare. My skills and experience align well with the healthcare industry's mission of improving patient outcomes and quality of life.";

/// Employer-specific strings and waits that parameterize one workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowWording {
    pub motivation_question: String,
    pub motivation_fallback: String,
    pub submit_label: String,
    /// chrono format string for the date field.
    pub date_format: String,
    #[serde(with = "seconds")]
    pub postal_code_settle: Duration,
    #[serde(with = "seconds")]
    pub upload_settle: Duration,
    pub reminders: Vec<String>,
}

impl Default for WorkflowWording {
    fn default() -> Self {
        Self {
            motivation_question: "What drew you to healthcare?".to_string(),
            motivation_fallback: DEFAULT_MOTIVATION_FALLBACK.to_string(),
            submit_label: "Submit your application".to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            postal_code_settle: Duration::from_secs(3),
            upload_settle: Duration::from_secs(3),
            reminders: Vec::new(),
        }
    }
}

impl WorkflowWording {
    /// True when `date_format` holds only specifiers chrono understands.
    pub fn has_valid_date_format(&self) -> bool {
        !StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error))
    }

    /// `day` rendered with `date_format`, or as MM/DD/YYYY when the format is unusable.
    pub fn format_date(&self, day: NaiveDate) -> String {
        if self.has_valid_date_format() {
            day.format(&self.date_format).to_string()
        } else {
            day.format(DEFAULT_DATE_FORMAT).to_string()
        }
    }
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
