//! Read-only application and ticket data source

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use crate::model::{ApplicationProfile, Criticality, DataConfig, TicketRecord};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("Application not found: {0}")]
    NotFound(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Lookup of application profiles and their ticket history
#[async_trait]
pub trait ApplicationCatalog: Send + Sync {
    /// Known application names in sorted order
    async fn list_applications(&self) -> Result<Vec<String>, CatalogError>;

    async fn lookup_application(&self, name: &str) -> Result<ApplicationProfile, CatalogError>;

    /// Up to `limit` tickets for `application`, most recent first
    async fn recent_tickets(
        &self,
        application: &str,
        limit: usize,
    ) -> Result<Vec<TicketRecord>, CatalogError>;
}

/// On-disk shape of `applications.json`
#[derive(Debug, Deserialize)]
struct ApplicationsFile {
    applications: BTreeMap<String, ApplicationEntry>,
}

#[derive(Debug, Deserialize)]
struct ApplicationEntry {
    functionality: String,
    criticality: Criticality,
    #[serde(default)]
    common_issues: Vec<String>,
}

/// Catalog loaded once from JSON files
#[derive(Debug, Clone, Default)]
pub struct FileCatalog {
    applications: BTreeMap<String, ApplicationProfile>,
    tickets: Vec<TicketRecord>,
}

impl FileCatalog {
    /// Load applications (required) and tickets (optional) from disk
    pub fn load(config: &DataConfig) -> Result<Self, CatalogError> {
        let applications = load_applications(&config.applications_path)?;

        let tickets = if config.tickets_path.exists() {
            load_tickets(&config.tickets_path)?
        } else {
            tracing::warn!(
                path = %config.tickets_path.display(),
                "Tickets file not found, prompts will carry no ticket history"
            );
            Vec::new()
        };

        tracing::info!(
            applications = applications.len(),
            tickets = tickets.len(),
            "Loaded application catalog"
        );

        Ok(Self {
            applications,
            tickets,
        })
    }

    #[cfg(test)]
    pub fn from_parts(profiles: Vec<ApplicationProfile>, tickets: Vec<TicketRecord>) -> Self {
        Self {
            applications: profiles.into_iter().map(|p| (p.name.clone(), p)).collect(),
            tickets,
        }
    }
}

#[async_trait]
impl ApplicationCatalog for FileCatalog {
    async fn list_applications(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.applications.keys().cloned().collect())
    }

    async fn lookup_application(&self, name: &str) -> Result<ApplicationProfile, CatalogError> {
        self.applications
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }

    async fn recent_tickets(
        &self,
        application: &str,
        limit: usize,
    ) -> Result<Vec<TicketRecord>, CatalogError> {
        let mut tickets: Vec<&TicketRecord> = self
            .tickets
            .iter()
            .filter(|t| t.application == application)
            .collect();

        // Stable sort: undated tickets keep file order, after dated ones
        tickets.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));

        Ok(tickets.into_iter().take(limit).cloned().collect())
    }
}

fn load_applications(path: &Path) -> Result<BTreeMap<String, ApplicationProfile>, CatalogError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let file: ApplicationsFile =
        serde_json::from_str(&contents).map_err(|e| CatalogError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    Ok(file
        .applications
        .into_iter()
        .map(|(name, entry)| {
            let profile = ApplicationProfile {
                name: name.clone(),
                functionality_summary: entry.functionality,
                criticality: entry.criticality,
                common_issues: entry.common_issues,
            };
            (name, profile)
        })
        .collect())
}

fn load_tickets(path: &Path) -> Result<Vec<TicketRecord>, CatalogError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|e| CatalogError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
