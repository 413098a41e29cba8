//! Unit tests for configuration validation and timing derivation.

#[path = "common/test_constants.rs"]
mod test_constants;

use std::time::Duration;

use blockwarden::{CloudConfig, config::ConfigError};
use rstest::*;

use test_constants::{AUTH_TOKEN, PROJECT_ID};

#[fixture]
fn valid_config() -> CloudConfig {
    CloudConfig {
        auth_token: String::from(AUTH_TOKEN),
        project_id: String::from(PROJECT_ID),
        volume_url: String::from("https://volume.example:8776"),
        compute_url: String::from("https://compute.example:8774"),
        volume_api_prefix: None,
        compute_api_prefix: None,
        http_timeout_secs: 30,
        poll_interval_secs: 2,
        standard_detach_budget_secs: 20,
        force_detach_budget_secs: 15,
        attachment_settle_secs: 3,
        reset_settle_secs: 1,
        delete_poll_interval_secs: 1,
        delete_poll_attempts: 30,
        emergency_settle_secs: 5,
    }
}

#[rstest]
fn valid_config_passes(valid_config: CloudConfig) {
    assert!(valid_config.validate().is_ok());
}

#[rstest]
fn missing_token_error_is_actionable(valid_config: CloudConfig) {
    let cfg = CloudConfig {
        auth_token: String::from("   "),
        ..valid_config
    };

    let error = cfg.validate().expect_err("token is required");
    let ConfigError::MissingField(ref message) = error else {
        panic!("expected MissingField error, got {error:?}");
    };
    assert!(
        message.contains("OS_AUTH_TOKEN"),
        "error should mention env var: {message}"
    );
    assert!(
        message.contains("blockwarden.toml"),
        "error should mention config file: {message}"
    );
    assert!(
        message.contains("auth_token"),
        "error should mention TOML key: {message}"
    );
}

#[rstest]
#[case::project(|cfg: &mut CloudConfig| cfg.project_id.clear(), "OS_PROJECT_ID", "project_id")]
#[case::volume_url(|cfg: &mut CloudConfig| cfg.volume_url.clear(), "OS_VOLUME_URL", "volume_url")]
#[case::compute_url(
    |cfg: &mut CloudConfig| cfg.compute_url = String::from("compute.example"),
    "OS_COMPUTE_URL",
    "compute_url"
)]
#[case::timeout(
    |cfg: &mut CloudConfig| cfg.http_timeout_secs = 0,
    "OS_HTTP_TIMEOUT_SECS",
    "http_timeout_secs"
)]
#[case::poll(
    |cfg: &mut CloudConfig| cfg.poll_interval_secs = 0,
    "OS_POLL_INTERVAL_SECS",
    "poll_interval_secs"
)]
#[case::attempts(
    |cfg: &mut CloudConfig| cfg.delete_poll_attempts = 0,
    "OS_DELETE_POLL_ATTEMPTS",
    "delete_poll_attempts"
)]
fn validation_errors_name_their_source(
    valid_config: CloudConfig,
    #[case] mutate: fn(&mut CloudConfig),
    #[case] env_var: &str,
    #[case] toml_key: &str,
) {
    let mut cfg = valid_config;
    mutate(&mut cfg);

    let message = cfg.validate().expect_err("validation should fail").to_string();
    assert!(
        message.contains(env_var),
        "error should mention env var {env_var}: {message}"
    );
    assert!(
        message.contains(toml_key),
        "error should mention TOML key {toml_key}: {message}"
    );
}

#[rstest]
fn non_http_url_is_invalid_rather_than_missing(valid_config: CloudConfig) {
    let cfg = CloudConfig {
        volume_url: String::from("ftp://volume.example"),
        ..valid_config
    };
    assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
}

#[rstest]
fn timings_follow_configured_seconds(valid_config: CloudConfig) {
    let cfg = CloudConfig {
        poll_interval_secs: 4,
        delete_poll_attempts: 12,
        emergency_settle_secs: 9,
        ..valid_config
    };

    let timings = cfg.timings();
    assert_eq!(timings.poll_interval, Duration::from_secs(4));
    assert_eq!(timings.standard_detach_budget, Duration::from_secs(20));
    assert_eq!(timings.force_detach_budget, Duration::from_secs(15));
    assert_eq!(timings.delete_poll_attempts, 12);
    assert_eq!(timings.emergency_settle, Duration::from_secs(9));
    assert_eq!(cfg.http_timeout(), Duration::from_secs(30));
}

#[rstest]
fn default_config_timings_match_library_defaults(valid_config: CloudConfig) {
    assert_eq!(valid_config.timings(), blockwarden::LifecycleTimings::default());
}
