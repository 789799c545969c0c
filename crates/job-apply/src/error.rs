use crate::agent::AgentError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::application::EmployerRegistryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use std::path::PathBuf;

/// Failures surfaced by the service entry points and CLI commands.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Employers(EmployerRegistryError),
    Agent(AgentError),
    /// Employer id missing from the loaded registry.
    UnknownEmployer { id: String, known: Vec<String> },
    /// Applicant profile file that is not a readable JSON object.
    Profile { path: PathBuf, reason: String },
}

impl AppError {
    pub fn unknown_employer<'a>(id: &str, known: impl IntoIterator<Item = &'a str>) -> Self {
        Self::UnknownEmployer {
            id: id.to_string(),
            known: known.into_iter().map(str::to_string).collect(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UnknownEmployer { .. } => StatusCode::NOT_FOUND,
            AppError::Profile { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Agent(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Employers(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Employers(err) => write!(f, "employer registry error: {}", err),
            AppError::Agent(err) => write!(f, "agent error: {}", err),
            AppError::UnknownEmployer { id, known } if known.is_empty() => {
                write!(f, "unknown employer '{}'", id)
            }
            AppError::UnknownEmployer { id, known } => {
                write!(f, "unknown employer '{}' (known: {})", id, known.join(", "))
            }
            AppError::Profile { path, reason } => {
                write!(f, "applicant profile {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Employers(err) => Some(err),
            AppError::Agent(err) => Some(err),
            AppError::UnknownEmployer { .. } | AppError::Profile { .. } => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<EmployerRegistryError> for AppError {
    fn from(value: EmployerRegistryError) -> Self {
        Self::Employers(value)
    }
}

impl From<AgentError> for AppError {
    fn from(value: AgentError) -> Self {
        Self::Agent(value)
    }
}
