use serde::Serialize;

use super::plan::PlannedValue;

const COUNTRY_KEY: &str = "country";

const UNITED_STATES: &[&str] = &[
    "us",
    "usa",
    "u s",
    "u s a",
    "united states",
    "united states of america",
];

/// What to do with a field that may have been populated by another field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AutofillAction {
    /// The page already shows the right value; leave it alone.
    Keep,
    /// The page shows a different value; replace it.
    Overwrite,
    /// The page left it empty.
    Fill,
}

/// Compare what the page shows after the settle wait with the planned value.
pub fn reconcile(key: &str, observed: Option<&str>, planned: &PlannedValue) -> AutofillAction {
    let Some(observed) = observed.map(str::trim).filter(|value| !value.is_empty()) else {
        return AutofillAction::Fill;
    };

    match planned.expected_answer() {
        Some(expected) if same_value(key, observed, expected) => AutofillAction::Keep,
        Some(_) => AutofillAction::Overwrite,
        None => AutofillAction::Keep,
    }
}

fn same_value(key: &str, observed: &str, expected: &str) -> bool {
    let observed = canonical(observed);
    let expected = canonical(expected);
    if observed == expected {
        return true;
    }

    key == COUNTRY_KEY
        && UNITED_STATES.contains(&observed.as_str())
        && UNITED_STATES.contains(&expected.as_str())
}

fn canonical(value: &str) -> String {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
