//! Turns raw run results into the few facts the shell shows the user.

use serde::Deserialize;
use serde_json::Value;

use crate::error::SessionError;
use crate::integrations::RunResult;
use crate::session::SubmissionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFacts {
    pub run_id: String,
    pub follow_up_url: Option<String>,
    /// Pretty-printed raw result for "technical details".
    pub details: String,
}

/// Strict view over the parts of a run result we rely on.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunFacts {
    run_id: Option<Value>,
    id: Option<Value>,
    output: Option<RunOutput>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunOutput {
    contact_url: Option<String>,
}

fn identifier(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn present(result: &RunResult) -> Result<DisplayFacts, SessionError> {
    // Unexpected shapes (e.g. `output` not an object) only cost us the link.
    let facts = serde_json::from_value::<RunFacts>(Value::Object(result.fields().clone()))
        .unwrap_or_else(|_| RunFacts {
            run_id: result.get("runId").cloned(),
            id: result.get("id").cloned(),
            output: None,
        });

    let run_id = identifier(facts.run_id.as_ref())
        .or_else(|| identifier(facts.id.as_ref()))
        .ok_or(SessionError::MalformedResult)?;

    let follow_up_url = facts
        .output
        .and_then(|o| o.contact_url)
        .filter(|url| !url.is_empty());

    Ok(DisplayFacts {
        run_id,
        follow_up_url,
        details: result.to_pretty_json(),
    })
}

/// What the shell renders after a submission cycle ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(DisplayFacts),
    /// The run succeeded but carried no identifier.
    CreatedWithoutId { details: String },
    Failed(String),
}

impl Outcome {
    pub fn from_result(result: &RunResult) -> Self {
        match present(result) {
            Ok(facts) => Self::Created(facts),
            Err(e) => {
                log::warn!("Presenting run result without identifier: {}", e);
                Self::CreatedWithoutId {
                    details: result.to_pretty_json(),
                }
            }
        }
    }

    /// `None` until a submission has finished.
    pub fn from_state(state: &SubmissionState) -> Option<Self> {
        match state {
            SubmissionState::Succeeded(result) => Some(Self::from_result(result)),
            SubmissionState::Failed(reason) => Some(Self::Failed(reason.clone())),
            SubmissionState::Idle | SubmissionState::InFlight => None,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Created(facts) => {
                let mut out = format!("✓ Contact created successfully!\n  Run ID: {}", facts.run_id);
                if let Some(url) = &facts.follow_up_url {
                    out.push_str(&format!("\n  View contact: {}", url));
                }
                out
            }
            Self::CreatedWithoutId { .. } => "✓ Contact created successfully!".to_string(),
            Self::Failed(reason) => format!("✗ Could not create contact: {}", reason),
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Created(facts) => Some(&facts.details),
            Self::CreatedWithoutId { details } => Some(details),
            Self::Failed(_) => None,
        }
    }
}
