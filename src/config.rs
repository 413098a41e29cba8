//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::lifecycle::LifecycleTimings;

/// Client configuration derived from environment variables, configuration
/// files, and CLI flags. Credentials and project scope are injected into the
/// client once, at construction.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "OS")]
pub struct CloudConfig {
    /// Pre-issued token sent as `X-Auth-Token` on every request.
    pub auth_token: String,
    /// Project whose resources the client operates on.
    pub project_id: String,
    /// Block-storage service base URL, without the version prefix.
    pub volume_url: String,
    /// Compute service base URL, without the version prefix.
    pub compute_url: String,
    /// Pins the block-storage version prefix (for example `v3/{project_id}`)
    /// and skips discovery for that service.
    pub volume_api_prefix: Option<String>,
    /// Pins the compute version prefix and skips discovery for that service.
    pub compute_api_prefix: Option<String>,
    /// Per-request HTTP timeout.
    #[ortho_config(default = 30)]
    pub http_timeout_secs: u64,
    /// Interval between status reads while waiting for detach convergence.
    #[ortho_config(default = 2)]
    pub poll_interval_secs: u64,
    /// Convergence budget for the standard compute-side detach.
    #[ortho_config(default = 20)]
    pub standard_detach_budget_secs: u64,
    /// Convergence budget for the storage-side forced detach.
    #[ortho_config(default = 15)]
    pub force_detach_budget_secs: u64,
    /// Settle delay after per-attachment teardown.
    #[ortho_config(default = 3)]
    pub attachment_settle_secs: u64,
    /// Settle delay after an administrative status reset.
    #[ortho_config(default = 1)]
    pub reset_settle_secs: u64,
    /// Interval between reads while confirming a deletion.
    #[ortho_config(default = 1)]
    pub delete_poll_interval_secs: u64,
    /// Number of reads spent confirming a deletion.
    #[ortho_config(default = 30)]
    pub delete_poll_attempts: u32,
    /// Settle delay between attachment removal and status reset during
    /// emergency cleanup.
    #[ortho_config(default = 5)]
    pub emergency_settle_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn hint(&self) -> String {
        format!(
            "set {} or add {} to [openstack] in blockwarden.toml",
            self.env_var, self.toml_key
        )
    }
}

impl CloudConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: {}",
                metadata.description,
                metadata.hint()
            )));
        }
        Ok(())
    }

    fn require_url(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        Self::require_field(value, metadata)?;
        let trimmed = value.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Ok(());
        }
        Err(ConfigError::Invalid(format!(
            "{} must be an http(s) URL, got '{trimmed}': {}",
            metadata.description,
            metadata.hint()
        )))
    }

    fn require_positive(value: u64, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value == 0 {
            return Err(ConfigError::Invalid(format!(
                "{} must be greater than zero: {}",
                metadata.description,
                metadata.hint()
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("blockwarden")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and configuration key that supply the offending value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::Invalid`] when a value is malformed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.auth_token,
            &FieldMetadata::new("API auth token", "OS_AUTH_TOKEN", "auth_token"),
        )?;
        Self::require_field(
            &self.project_id,
            &FieldMetadata::new("project ID", "OS_PROJECT_ID", "project_id"),
        )?;
        Self::require_url(
            &self.volume_url,
            &FieldMetadata::new("block-storage endpoint", "OS_VOLUME_URL", "volume_url"),
        )?;
        Self::require_url(
            &self.compute_url,
            &FieldMetadata::new("compute endpoint", "OS_COMPUTE_URL", "compute_url"),
        )?;
        Self::require_positive(
            self.http_timeout_secs,
            &FieldMetadata::new(
                "HTTP timeout",
                "OS_HTTP_TIMEOUT_SECS",
                "http_timeout_secs",
            ),
        )?;
        Self::require_positive(
            self.poll_interval_secs,
            &FieldMetadata::new(
                "poll interval",
                "OS_POLL_INTERVAL_SECS",
                "poll_interval_secs",
            ),
        )?;
        Self::require_positive(
            self.delete_poll_interval_secs,
            &FieldMetadata::new(
                "delete poll interval",
                "OS_DELETE_POLL_INTERVAL_SECS",
                "delete_poll_interval_secs",
            ),
        )?;
        Self::require_positive(
            u64::from(self.delete_poll_attempts),
            &FieldMetadata::new(
                "delete poll attempts",
                "OS_DELETE_POLL_ATTEMPTS",
                "delete_poll_attempts",
            ),
        )?;
        Ok(())
    }

    /// Per-request HTTP timeout as a [`Duration`].
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Polling cadences and budgets for the lifecycle manager.
    #[must_use]
    pub const fn timings(&self) -> LifecycleTimings {
        LifecycleTimings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            standard_detach_budget: Duration::from_secs(self.standard_detach_budget_secs),
            force_detach_budget: Duration::from_secs(self.force_detach_budget_secs),
            attachment_settle: Duration::from_secs(self.attachment_settle_secs),
            reset_settle: Duration::from_secs(self.reset_settle_secs),
            delete_poll_interval: Duration::from_secs(self.delete_poll_interval_secs),
            delete_poll_attempts: self.delete_poll_attempts,
            emergency_settle: Duration::from_secs(self.emergency_settle_secs),
        }
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configuration value is present but unusable.
    #[error("invalid configuration value: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
