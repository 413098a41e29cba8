//! Error types for the OpenStack client.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while constructing the client or negotiating endpoints.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OpenStackError {
    /// Raised when the configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when the HTTP client cannot be built.
    #[error("failed to build HTTP client: {message}")]
    Http {
        /// Message returned by the HTTP stack.
        message: String,
    },
    /// Raised when the token is rejected while probing a service.
    #[error("{service} service rejected the credentials (HTTP {status})")]
    PermissionDenied {
        /// Service being probed.
        service: String,
        /// HTTP status returned.
        status: u16,
    },
    /// Raised when no candidate version prefix answered.
    #[error("no usable {service} endpoint found: {attempts}")]
    DiscoveryFailed {
        /// Service being probed.
        service: String,
        /// Summary of every candidate tried.
        attempts: String,
    },
}

impl From<ConfigError> for OpenStackError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}
