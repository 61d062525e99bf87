use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const ENV_CONFIG_PATH: &str = "SKILL_ASSESS_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_DATABASE_URL: &str = "SKILL_ASSESS_DATABASE_URL";
const DEFAULT_DATABASE_URL: &str = "sqlite://skill_assessment.db?mode=rwc";

/// Fixed self-rating prompts, one rating (1-5) expected per entry
const DEFAULT_STATIC_QUESTIONS: &[&str] = &[
    "How familiar are you with the core infrastructure of this application?",
    "Have you resolved any critical issues related to this application?",
    "How well do you understand its functionalities and dependencies?",
    "Have you worked on performance optimization for this application?",
    "Can you troubleshoot complex failures in this application?",
];

/// General questions used when generation yields nothing and fallback is enabled
const DEFAULT_FALLBACK_QUESTIONS: &[&str] = &[
    "Describe a production incident you resolved for this application.",
    "Which monitoring signals do you check first when this application degrades?",
    "How would you trace a failed request through this application's dependencies?",
    "What is the rollback procedure after a faulty deployment of this application?",
    "Which recurring issue in this application would you automate away, and how?",
];

/// Tunables for the assessment lifecycle
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssessmentSettings {
    pub static_questions: Vec<String>,
    pub fallback_questions: Vec<String>,
    /// Adopt `fallback_questions` when generation parses to nothing
    pub fallback_on_empty: bool,
    pub max_questions: usize,
    pub max_tickets: usize,
    /// Upper bound on rendered ticket text inside a prompt, in characters
    pub ticket_char_budget: usize,
    pub max_generation_tokens: u64,
    pub generation_timeout_secs: u64,
}

impl Default for AssessmentSettings {
    fn default() -> Self {
        Self {
            static_questions: DEFAULT_STATIC_QUESTIONS
                .iter()
                .map(|q| q.to_string())
                .collect(),
            fallback_questions: DEFAULT_FALLBACK_QUESTIONS
                .iter()
                .map(|q| q.to_string())
                .collect(),
            fallback_on_empty: false,
            max_questions: 5,
            max_tickets: 5,
            ticket_char_budget: 2000,
            max_generation_tokens: 200,
            generation_timeout_secs: 60,
        }
    }
}

impl AssessmentSettings {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Check the settings a session cannot run without
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();

        if self.static_questions.is_empty() {
            problems.push("static_questions must not be empty");
        } else if self.static_questions.iter().any(|q| q.trim().is_empty()) {
            problems.push("static_questions must not contain blank entries");
        }
        if self.max_questions == 0 {
            problems.push("max_questions must be at least 1");
        }
        if self.max_generation_tokens == 0 {
            problems.push("max_generation_tokens must be at least 1");
        }
        if self.generation_timeout_secs == 0 {
            problems.push("generation_timeout_secs must be at least 1");
        }
        if self.fallback_on_empty && self.fallback_questions.iter().all(|q| q.trim().is_empty()) {
            problems.push("fallback_on_empty needs at least one fallback question");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

/// Locations of the read-only application and ticket data
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub applications_path: PathBuf,
    pub tickets_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            applications_path: PathBuf::from("applications.json"),
            tickets_path: PathBuf::from("tickets.json"),
        }
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub assessment: AssessmentSettings,
    #[serde(default)]
    pub data: DataConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub assessment: AssessmentSettings,
    pub data: DataConfig,
    pub database_url: String,
    pub port: u16,
    pub host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assessment: AssessmentSettings::default(),
            data: DataConfig::default(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            port: 8080,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let database_url =
            std::env::var(ENV_DATABASE_URL).unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let config_path = std::env::var(ENV_CONFIG_PATH)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let file = Self::load_config_file(&config_path).unwrap_or_default();

        Self {
            assessment: file.assessment,
            data: file.data,
            database_url,
            port,
            host,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str::<ConfigFile>(contents) {
                    Ok(config) => {
                        if let Err(problems) = config.assessment.validate() {
                            tracing::error!(path = %path.display(), problems = %problems, "Invalid assessment settings, using defaults");
                            return None;
                        }
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_carry_five_static_questions() {
        let settings = AssessmentSettings::default();
        assert_eq!(settings.static_questions.len(), 5);
        assert_eq!(settings.max_questions, 5);
        assert_eq!(settings.max_tickets, 5);
        assert!(!settings.fallback_on_empty);
        assert_eq!(settings.generation_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let file = write_config(
            r#"
assessment:
  max_questions: 3
  fallback_on_empty: true
data:
  tickets_path: /srv/data/tickets.json
"#,
        );

        let config = Config::load_config_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.assessment.max_questions, 3);
        assert!(config.assessment.fallback_on_empty);
        assert_eq!(config.assessment.max_tickets, 5);
        assert_eq!(config.assessment.static_questions.len(), 5);
        assert_eq!(config.data.tickets_path, PathBuf::from("/srv/data/tickets.json"));
        assert_eq!(config.data.applications_path, PathBuf::from("applications.json"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("   \n");
        let config = Config::load_config_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.assessment.max_questions, 5);
    }

    #[test]
    fn test_missing_or_invalid_file_is_ignored() {
        assert!(Config::load_config_file("/nonexistent/skill-assessment.yaml").is_none());

        let file = write_config("assessment: [not, a, map]");
        assert!(Config::load_config_file(file.path().to_str().unwrap()).is_none());
    }

    #[test]
    fn test_unusable_settings_are_rejected() {
        for contents in [
            "assessment:\n  max_questions: 0\n",
            "assessment:\n  static_questions: []\n",
            "assessment:\n  static_questions: [\"Familiar?\", \"  \"]\n",
            "assessment:\n  generation_timeout_secs: 0\n",
            "assessment:\n  fallback_on_empty: true\n  fallback_questions: []\n",
        ] {
            let file = write_config(contents);
            assert!(
                Config::load_config_file(file.path().to_str().unwrap()).is_none(),
                "accepted {:?}",
                contents
            );
        }
    }

    #[test]
    fn test_validate_lists_every_problem() {
        let settings = AssessmentSettings {
            static_questions: Vec::new(),
            max_questions: 0,
            ..AssessmentSettings::default()
        };
        let problems = settings.validate().unwrap_err();
        assert!(problems.contains("static_questions"));
        assert!(problems.contains("max_questions"));
        assert!(AssessmentSettings::default().validate().is_ok());
    }

    #[test]
    fn test_bind_addr() {
        let config = Config::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
