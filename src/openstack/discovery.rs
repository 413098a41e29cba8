//! One-time API version negotiation.
//!
//! Each service is probed with a cheap listing request under a fixed list of
//! candidate version prefixes. The first prefix that answers 2xx wins and is
//! reused for every later request. A pinned prefix skips probing entirely.

use std::fmt;

use tracing::{debug, info};

use crate::config::CloudConfig;

use super::OpenStackError;

/// Services the client needs endpoints for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Service {
    /// Block-storage service.
    BlockStorage,
    /// Compute service.
    Compute,
}

impl Service {
    /// Version prefixes to try, in preference order.
    #[must_use]
    pub fn candidates(self, project_id: &str) -> Vec<String> {
        match self {
            Self::BlockStorage => vec![
                format!("v3/{project_id}"),
                String::from("v3"),
                format!("v2/{project_id}"),
            ],
            Self::Compute => vec![
                String::from("v2.1"),
                format!("v2.1/{project_id}"),
                format!("v2/{project_id}"),
            ],
        }
    }

    /// Listing path used to check a candidate prefix.
    #[must_use]
    pub const fn probe_path(self) -> &'static str {
        match self {
            Self::BlockStorage => "volumes?limit=1",
            Self::Compute => "servers?limit=1",
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::BlockStorage => "block-storage",
            Self::Compute => "compute",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Versioned base URLs settled during discovery.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedEndpoints {
    /// Block-storage base URL including the version prefix.
    pub volume: String,
    /// Compute base URL including the version prefix.
    pub compute: String,
}

/// Joins a base URL and a relative path with exactly one slash.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

pub(super) async fn resolve(
    http: &reqwest::Client,
    config: &CloudConfig,
) -> Result<ResolvedEndpoints, OpenStackError> {
    let volume = resolve_service(
        http,
        config,
        Service::BlockStorage,
        &config.volume_url,
        config.volume_api_prefix.as_deref(),
    )
    .await?;
    let compute = resolve_service(
        http,
        config,
        Service::Compute,
        &config.compute_url,
        config.compute_api_prefix.as_deref(),
    )
    .await?;
    Ok(ResolvedEndpoints { volume, compute })
}

async fn resolve_service(
    http: &reqwest::Client,
    config: &CloudConfig,
    service: Service,
    base_url: &str,
    pinned: Option<&str>,
) -> Result<String, OpenStackError> {
    if let Some(prefix) = pinned.map(str::trim).filter(|prefix| !prefix.is_empty()) {
        let endpoint = join_url(base_url, prefix);
        info!(%service, %endpoint, "using pinned API prefix");
        return Ok(endpoint);
    }

    let mut attempts = Vec::new();
    for prefix in service.candidates(&config.project_id) {
        let endpoint = join_url(base_url, &prefix);
        let probe = join_url(&endpoint, service.probe_path());
        let sent = http
            .get(&probe)
            .header("X-Auth-Token", &config.auth_token)
            .timeout(config.http_timeout())
            .send()
            .await;
        match sent {
            Ok(response) if response.status().is_success() => {
                info!(%service, %endpoint, "discovered API endpoint");
                return Ok(endpoint);
            }
            Ok(response) if matches!(response.status().as_u16(), 401 | 403) => {
                return Err(OpenStackError::PermissionDenied {
                    service: service.to_string(),
                    status: response.status().as_u16(),
                });
            }
            Ok(response) => {
                debug!(%service, %prefix, status = response.status().as_u16(), "candidate prefix rejected");
                attempts.push(format!("{prefix} -> HTTP {}", response.status().as_u16()));
            }
            Err(err) => {
                debug!(%service, %prefix, error = %err, "candidate prefix unreachable");
                attempts.push(format!("{prefix} -> {err}"));
            }
        }
    }

    Err(OpenStackError::DiscoveryFailed {
        service: service.to_string(),
        attempts: attempts.join("; "),
    })
}
