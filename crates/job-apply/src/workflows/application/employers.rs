use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::wording::WorkflowWording;

pub const ROCHESTER_REGIONAL_HEALTH: &str = "rochester-regional-health";

/// Application portal of one employer, with the wording its form uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployerPortal {
    pub id: String,
    pub name: String,
    pub apply_url: String,
    #[serde(default)]
    pub wording: WorkflowWording,
}

impl EmployerPortal {
    fn validate(&self) -> Result<(), EmployerRegistryError> {
        let reason = if self.id.trim().is_empty() {
            Some("id must not be empty")
        } else if !(self.apply_url.starts_with("https://") || self.apply_url.starts_with("http://"))
        {
            Some("apply_url must be an http(s) URL")
        } else if !self.wording.has_valid_date_format() {
            Some("wording.date_format is not a valid chrono format")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(EmployerRegistryError::InvalidPortal {
                id: self.id.clone(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Employer portals addressable by id.
#[derive(Debug, Clone, Default)]
pub struct EmployerRegistry {
    portals: BTreeMap<String, EmployerPortal>,
}

impl EmployerRegistry {
    /// Registry holding the built-in portals.
    pub fn standard() -> Self {
        let mut registry = Self::default();
        registry.portals.insert(
            ROCHESTER_REGIONAL_HEALTH.to_string(),
            EmployerPortal {
                id: ROCHESTER_REGIONAL_HEALTH.to_string(),
                name: "Rochester Regional Health".to_string(),
                apply_url: "https://apply.appcast.io/jobs/50590620606/applyboard/apply/"
                    .to_string(),
                wording: WorkflowWording::default(),
            },
        );
        registry
    }

    /// Built-in portals plus those listed in a JSON array file. File entries replace
    /// built-ins with the same id.
    pub fn from_path(path: &Path) -> Result<Self, EmployerRegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| EmployerRegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let portals: Vec<EmployerPortal> =
            serde_json::from_str(&raw).map_err(|source| EmployerRegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut registry = Self::standard();
        for portal in portals {
            registry.insert(portal)?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, portal: EmployerPortal) -> Result<(), EmployerRegistryError> {
        portal.validate()?;
        self.portals.insert(portal.id.clone(), portal);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&EmployerPortal> {
        self.portals.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.portals.keys().map(String::as_str)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EmployerRegistryError {
    #[error("unable to read employers file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid employers file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("employer portal '{id}' is invalid: {reason}")]
    InvalidPortal { id: String, reason: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn standard_registry_knows_rochester() {
        let registry = EmployerRegistry::standard();
        let portal = registry
            .get(ROCHESTER_REGIONAL_HEALTH)
            .expect("built-in portal");
        assert!(portal.apply_url.contains("appcast.io"));
        assert!(registry.get("unknown-employer").is_none());
    }

    #[test]
    fn file_portals_extend_the_registry() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"id": "lakeside-clinic", "name": "Lakeside Clinic", "apply_url": "https://careers.lakeside.example/apply", "wording": {{"motivation_question": "Why Lakeside?"}}}}]"#
        )
        .expect("write employers");

        let registry = EmployerRegistry::from_path(file.path()).expect("registry loads");
        let portal = registry.get("lakeside-clinic").expect("loaded portal");
        assert_eq!(portal.wording.motivation_question, "Why Lakeside?");
        assert_eq!(portal.wording.submit_label, "Submit your application");
        assert_eq!(registry.ids().count(), 2);
    }

    #[test]
    fn portals_without_http_urls_are_rejected() {
        let mut registry = EmployerRegistry::default();
        let error = registry
            .insert(EmployerPortal {
                id: "ftp-only".to_string(),
                name: "FTP".to_string(),
                apply_url: "ftp://example.com".to_string(),
                wording: WorkflowWording::default(),
            })
            .expect_err("ftp rejected");
        assert!(matches!(error, EmployerRegistryError::InvalidPortal { .. }));
    }

    #[test]
    fn portals_with_unknown_date_specifiers_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"[{{"id": "lakeside-clinic", "name": "Lakeside Clinic", "apply_url": "https://careers.lakeside.example/apply", "wording": {{"date_format": "%Q"}}}}]"#
        )
        .expect("write employers");

        match EmployerRegistry::from_path(file.path()) {
            Err(EmployerRegistryError::InvalidPortal { id, reason }) => {
                assert_eq!(id, "lakeside-clinic");
                assert!(reason.contains("date_format"));
            }
            other => panic!("expected invalid portal, got {other:?}"),
        }
    }
}
