//! Migration configuration loaded from environment variables.
//!
//! The engine moves data between two GCP projects, so the config names both
//! the legacy and the new project plus their storage buckets.

use std::env;

/// Migration configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID of the legacy backend (migration source)
    pub legacy_project_id: String,
    /// GCP project ID of the new backend (migration target)
    pub new_project_id: String,
    /// Storage bucket holding legacy team attachments
    pub legacy_bucket: String,
    /// Storage bucket for migrated team attachments
    pub new_bucket: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            legacy_project_id: "legacy-test-project".to_string(),
            new_project_id: "new-test-project".to_string(),
            legacy_bucket: "legacy-test-project.appspot.com".to_string(),
            new_bucket: "new-test-project.appspot.com".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let legacy_project_id = env::var("LEGACY_PROJECT_ID")
            .map_err(|_| ConfigError::Missing("LEGACY_PROJECT_ID"))?;
        let new_project_id =
            env::var("NEW_PROJECT_ID").map_err(|_| ConfigError::Missing("NEW_PROJECT_ID"))?;

        Ok(Self {
            // Buckets default to the Firebase convention of {project}.appspot.com
            legacy_bucket: env::var("LEGACY_STORAGE_BUCKET")
                .unwrap_or_else(|_| format!("{}.appspot.com", legacy_project_id)),
            new_bucket: env::var("NEW_STORAGE_BUCKET")
                .unwrap_or_else(|_| format!("{}.appspot.com", new_project_id)),
            legacy_project_id,
            new_project_id,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("LEGACY_PROJECT_ID", "legacy-proj");
        env::set_var("NEW_PROJECT_ID", "new-proj");
        env::remove_var("LEGACY_STORAGE_BUCKET");
        env::remove_var("NEW_STORAGE_BUCKET");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.legacy_project_id, "legacy-proj");
        assert_eq!(config.new_project_id, "new-proj");
        assert_eq!(config.legacy_bucket, "legacy-proj.appspot.com");
        assert_eq!(config.new_bucket, "new-proj.appspot.com");
    }
}
