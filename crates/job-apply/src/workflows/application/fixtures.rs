use std::path::{Path, PathBuf};

use super::domain::ApplicantProfile;

pub const PROFILE_FILE: &str = "test_data.json";
pub const RESUME_FILE: &str = "test_CV.pdf";

/// Canned applicant used by the test endpoint.
#[derive(Debug, Clone)]
pub struct MockFixtures {
    dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LoadedFixture {
    pub profile: ApplicantProfile,
    pub resume_path: PathBuf,
}

impl MockFixtures {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn load(&self) -> Result<LoadedFixture, FixtureError> {
        let profile_path = self.dir.join(PROFILE_FILE);
        let resume_path = self.dir.join(RESUME_FILE);

        let raw = match tokio::fs::read_to_string(&profile_path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(FixtureError::NotFound { path: profile_path })
            }
            Err(source) => {
                return Err(FixtureError::Io {
                    path: profile_path,
                    source,
                })
            }
        };

        if !tokio::fs::try_exists(&resume_path).await.unwrap_or(false) {
            return Err(FixtureError::NotFound { path: resume_path });
        }

        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|source| FixtureError::Parse {
                path: profile_path.clone(),
                source,
            })?;
        let profile = ApplicantProfile::from_value(value).ok_or(FixtureError::NotAnObject {
            path: profile_path,
        })?;

        Ok(LoadedFixture {
            profile,
            resume_path,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("Mock file not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{} must contain a JSON object", .path.display())]
    NotAnObject { path: PathBuf },
}

impl FixtureError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
