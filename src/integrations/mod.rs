pub mod gateway;
pub mod http;
pub mod token;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Flow executed by the gateway for every contact submission.
pub const CREATE_CONTACT_FLOW: &str = "create-crm-contact";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    HubSpot,
    Pipedrive,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::HubSpot, ProviderId::Pipedrive];

    /// Integration key used by the gateway.
    pub fn key(self) -> &'static str {
        match self {
            Self::HubSpot => "hubspot",
            Self::Pipedrive => "pipedrive",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::HubSpot => "HubSpot",
            Self::Pipedrive => "Pipedrive",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ProviderId::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "unknown CRM provider '{}' (expected one of: {})",
                    s,
                    ProviderId::ALL.map(|p| p.key()).join(", ")
                )
            })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub name: String,
    pub description: String,
}

pub fn providers() -> Vec<ProviderInfo> {
    ProviderId::ALL
        .into_iter()
        .map(|id| ProviderInfo {
            id,
            name: id.display_name().to_string(),
            description: format!("Create contacts in {} through the integration gateway", id.display_name()),
        })
        .collect()
}

/// Raw result of one flow run, exactly as the gateway returned it.
///
/// The shape is owned by the remote flow; use [`crate::presenter::present`]
/// to pull typed facts out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunResult(Map<String, Value>);

impl RunResult {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Build from a successful response body of any shape.
    ///
    /// An empty body gives an empty record; anything that is not a JSON
    /// object is kept under `value` (as text when it is not JSON at all).
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self(Map::new());
        }
        let value = serde_json::from_str::<Value>(body)
            .unwrap_or_else(|_| Value::String(body.to_string()));
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                Self(map)
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}
