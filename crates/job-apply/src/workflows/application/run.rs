use serde::Serialize;

use super::domain::{ApplicationOutcome, FieldEntry, FieldKind, WorkflowPhase};
use super::plan::FillPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Pending,
    InProgress,
    Filled,
    Verified,
    /// The page populated the field with the right value on its own.
    Autofilled,
    /// The live form does not expose this field.
    Absent,
}

impl FieldStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Filled => "Filled",
            Self::Verified => "Verified",
            Self::Autofilled => "Autofilled",
            Self::Absent => "Absent",
        }
    }

    /// Counts toward releasing the phase gate.
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Verified | Self::Autofilled | Self::Absent)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldProgress {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub phase: WorkflowPhase,
    pub required: bool,
    pub status: FieldStatus,
    pub value: Option<String>,
    pub attempts: u32,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("field {0} is not part of the fill plan")]
    UnknownField(String),
    #[error("cannot start {field}: required fields in {} are not verified ({})", .phase.label(), .pending.join(", "))]
    PhaseGate {
        field: String,
        phase: WorkflowPhase,
        pending: Vec<String>,
    },
    #[error("field {0} must be filled before it can be verified")]
    NotFilled(String),
    #[error("submission blocked; required fields not verified: {}", .0.join(", "))]
    NotReady(Vec<String>),
    #[error("submit control has not been activated")]
    NotSubmitted,
}

/// Live progress of one fill plan, enforcing phase order.
///
/// A field in phase N+1 cannot start until every required field of the earlier phases is
/// verified, autofilled, or known to be absent from the form. Validation errors send a field
/// back to pending; they never fail the run.
#[derive(Debug, Clone)]
pub struct FormRun {
    fields: Vec<FieldProgress>,
    submitted: bool,
    confirmed: bool,
}

impl FormRun {
    pub fn new(plan: &FillPlan) -> Self {
        let fields = plan
            .entries()
            .iter()
            .map(|entry| FieldProgress {
                key: entry.key().to_string(),
                label: entry.label.clone(),
                kind: entry.kind(),
                phase: entry.phase(),
                required: entry.required(),
                status: if entry.absent {
                    FieldStatus::Absent
                } else {
                    FieldStatus::Pending
                },
                value: None,
                attempts: 0,
                last_error: None,
            })
            .collect();

        Self {
            fields,
            submitted: false,
            confirmed: false,
        }
    }

    pub fn progress(&self) -> &[FieldProgress] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldProgress> {
        self.fields.iter().find(|field| field.key == key)
    }

    fn index_of(&self, key: &str) -> Result<usize, RunError> {
        self.fields
            .iter()
            .position(|field| field.key == key)
            .ok_or_else(|| RunError::UnknownField(key.to_owned()))
    }

    /// Required fields of `phase` that still hold the gate closed.
    pub fn pending_required(&self, phase: WorkflowPhase) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.phase == phase && field.required && !field.status.is_settled())
            .map(|field| field.key.as_str())
            .collect()
    }

    fn check_gate(&self, index: usize) -> Result<(), RunError> {
        let target = &self.fields[index];
        for phase in WorkflowPhase::ordered()
            .into_iter()
            .take_while(|phase| *phase < target.phase)
        {
            let pending = self.pending_required(phase);
            if !pending.is_empty() {
                return Err(RunError::PhaseGate {
                    field: target.key.to_string(),
                    phase,
                    pending: pending.into_iter().map(str::to_string).collect(),
                });
            }
        }
        Ok(())
    }

    /// Start work on a field. Fails while an earlier phase is incomplete.
    pub fn begin(&mut self, key: &str) -> Result<(), RunError> {
        let index = self.index_of(key)?;
        self.check_gate(index)?;
        let field = &mut self.fields[index];
        if field.status == FieldStatus::Pending {
            field.status = FieldStatus::InProgress;
        }
        Ok(())
    }

    pub fn record_filled(&mut self, key: &str, value: impl Into<String>) -> Result<(), RunError> {
        let index = self.index_of(key)?;
        self.check_gate(index)?;
        let field = &mut self.fields[index];
        field.status = FieldStatus::Filled;
        field.value = Some(value.into());
        field.last_error = None;
        Ok(())
    }

    /// The field was re-read after writing and held its value.
    pub fn record_verified(&mut self, key: &str) -> Result<(), RunError> {
        let index = self.index_of(key)?;
        let field = &mut self.fields[index];
        match field.status {
            FieldStatus::Filled | FieldStatus::Verified => {
                field.status = FieldStatus::Verified;
                Ok(())
            }
            _ => Err(RunError::NotFilled(key.to_owned())),
        }
    }

    pub fn record_autofilled(&mut self, key: &str, observed: impl Into<String>) -> Result<(), RunError> {
        let index = self.index_of(key)?;
        self.check_gate(index)?;
        let field = &mut self.fields[index];
        field.status = FieldStatus::Autofilled;
        field.value = Some(observed.into());
        Ok(())
    }

    pub fn mark_absent(&mut self, key: &str) -> Result<(), RunError> {
        let index = self.index_of(key)?;
        self.fields[index].status = FieldStatus::Absent;
        Ok(())
    }

    /// The form rejected the field. It returns to pending for a retry; returns the attempt count.
    pub fn record_validation_error(
        &mut self,
        key: &str,
        message: impl Into<String>,
    ) -> Result<u32, RunError> {
        let index = self.index_of(key)?;
        let field = &mut self.fields[index];
        field.status = FieldStatus::Pending;
        field.attempts += 1;
        field.last_error = Some(message.into());
        Ok(field.attempts)
    }

    /// First phase with unsettled required work, `None` once submission is confirmed.
    pub fn current_phase(&self) -> Option<WorkflowPhase> {
        if self.confirmed {
            return None;
        }
        WorkflowPhase::ordered()
            .into_iter()
            .filter(|phase| *phase != WorkflowPhase::Submit)
            .find(|phase| !self.pending_required(*phase).is_empty())
            .or(Some(WorkflowPhase::Submit))
    }

    pub fn ready_to_submit(&self) -> Result<(), RunError> {
        let pending: Vec<String> = self
            .fields
            .iter()
            .filter(|field| {
                field.phase != WorkflowPhase::Submit && field.required && !field.status.is_settled()
            })
            .map(|field| field.key.clone())
            .collect();

        if pending.is_empty() {
            Ok(())
        } else {
            Err(RunError::NotReady(pending))
        }
    }

    pub fn record_submitted(&mut self) -> Result<(), RunError> {
        self.ready_to_submit()?;
        self.submitted = true;
        for field in self
            .fields
            .iter_mut()
            .filter(|field| field.phase == WorkflowPhase::Submit)
        {
            field.status = FieldStatus::Filled;
            field.value = Some("clicked".to_string());
        }
        Ok(())
    }

    /// A confirmation message or page was observed after submitting.
    pub fn confirm_submission(&mut self) -> Result<(), RunError> {
        if !self.submitted {
            return Err(RunError::NotSubmitted);
        }
        self.confirmed = true;
        for field in self
            .fields
            .iter_mut()
            .filter(|field| field.phase == WorkflowPhase::Submit)
        {
            field.status = FieldStatus::Verified;
        }
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.confirmed
    }

    /// Outcome listing every field that ended up holding a value.
    pub fn outcome(&self, summary: impl Into<String>) -> ApplicationOutcome {
        let fields = self
            .fields
            .iter()
            .filter(|field| field.phase != WorkflowPhase::Submit)
            .filter_map(|field| {
                let value = field.value.clone()?;
                Some(FieldEntry {
                    label: field.label.clone(),
                    kind: field.kind.label().to_string(),
                    value,
                    required: field.required,
                })
            })
            .collect();

        ApplicationOutcome {
            summary: summary.into(),
            fields,
            submitted: self.confirmed,
        }
    }
}
