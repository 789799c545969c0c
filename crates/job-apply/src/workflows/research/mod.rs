//! Company research: a single agent task that summarizes an employer and recommends
//! whether to work there.

pub mod router;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::agent::{AgentError, AgentExecutor, AgentTask, ModelHandle};
use crate::workflows::application::outcome::extract_json;

pub use router::research_router;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyResearch {
    pub summary: String,
    pub recommendation: String,
}

impl CompanyResearch {
    /// Answer used when the agent finished but its output could not be read.
    pub fn fallback(company: &str) -> Self {
        Self {
            summary: format!("Unable to research {company} due to technical issues."),
            recommendation: "Research failed - please try again later.".to_string(),
        }
    }

    /// Reads `{summary, recommendation}` JSON or `Summary:` / `Recommendation:` lines.
    pub fn from_agent_output(raw: &str) -> Option<Self> {
        if let Some(Value::Object(object)) = extract_json(raw) {
            let field = |name: &str| {
                object
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .and_then(|(_, value)| value.as_str())
                    .map(str::trim)
                    .filter(|text| !text.is_empty())
                    .map(str::to_string)
            };
            if let (Some(summary), Some(recommendation)) =
                (field("summary"), field("recommendation"))
            {
                return Some(Self {
                    summary,
                    recommendation,
                });
            }
        }

        let mut summary = None;
        let mut recommendation = None;
        for line in raw.lines() {
            let Some((label, text)) = line.trim().trim_start_matches(['-', '*']).split_once(':')
            else {
                continue;
            };
            let text = text.trim().trim_matches('"').trim();
            if text.is_empty() {
                continue;
            }
            match label.trim().to_ascii_lowercase().as_str() {
                "summary" => summary = Some(text.to_string()),
                "recommendation" => recommendation = Some(text.to_string()),
                _ => {}
            }
        }

        Some(Self {
            summary: summary?,
            recommendation: recommendation?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("company name must not be empty")]
    EmptyCompany,
    #[error("research task failed: {0}")]
    Agent(#[from] AgentError),
}

pub struct CompanyResearcher<E: ?Sized> {
    agent: Arc<E>,
    model: ModelHandle,
    timeout: Duration,
}

impl<E> CompanyResearcher<E>
where
    E: AgentExecutor + ?Sized + 'static,
{
    pub fn new(agent: Arc<E>, model: ModelHandle, timeout: Duration) -> Self {
        Self {
            agent,
            model,
            timeout,
        }
    }

    pub async fn research(&self, company: &str) -> Result<CompanyResearch, ResearchError> {
        let company = company.trim();
        if company.is_empty() {
            return Err(ResearchError::EmptyCompany);
        }

        let task = AgentTask::new(research_instructions(company), self.model.clone())
            .with_output_schema(research_schema());
        info!(company, model = self.model.as_str(), "starting company research");

        let run = tokio::time::timeout(self.timeout, self.agent.execute(task))
            .await
            .map_err(|_| AgentError::Timeout {
                pass: "research",
                limit: self.timeout,
            })??;
        let output = run.final_output()?;

        Ok(CompanyResearch::from_agent_output(output).unwrap_or_else(|| {
            warn!(company, "research output unreadable; using fallback answer");
            CompanyResearch::fallback(company)
        }))
    }
}

fn research_instructions(company: &str) -> String {
    format!(
        "Can you google {company} and provide a structured output of:\n\
         {{\n\
         \"summary\": \"String of what {company} is\",\n\
         \"recommendation\": \"Should I work or not work here?\"\n\
         }}"
    )
}

fn research_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "recommendation": { "type": "string" }
        },
        "required": ["summary", "recommendation"]
    })
}
