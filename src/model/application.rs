use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Criticality::Low => "Low",
            Criticality::Medium => "Medium",
            Criticality::High => "High",
            Criticality::Critical => "Critical",
        };
        f.write_str(label)
    }
}

/// Metadata describing one application under assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationProfile {
    pub name: String,
    pub functionality_summary: String,
    pub criticality: Criticality,
    pub common_issues: Vec<String>,
}

// Historical support ticket used only as prompt context.
// Everything beyond `application` and `summary` is carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub application: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
impl TicketRecord {
    pub fn new(application: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            summary: summary.into(),
            opened_at: None,
            extra: BTreeMap::new(),
        }
    }
}
