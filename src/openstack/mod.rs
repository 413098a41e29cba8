//! OpenStack transport for the lifecycle manager.
//!
//! [`OpenStackClient`] implements [`VolumeApi`] over the block-storage and
//! compute REST APIs. Endpoints are negotiated once at construction; every
//! request then carries the configured token and a fresh request ID.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, Url};
use tracing::debug;
use uuid::Uuid;

use crate::api::{ApiError, ApiFuture, StatusReset, VolumeApi};
use crate::config::CloudConfig;
use crate::types::{InstanceId, VolumeId};
use crate::volume::{Snapshot, Volume};

mod discovery;
mod error;
mod wire;

pub use discovery::{join_url, ResolvedEndpoints, Service};
pub use error::OpenStackError;

use wire::{SnapshotsEnvelope, VolumeAction, VolumeEnvelope};

const REQUEST_ID_HEADER: &str = "X-OpenStack-Request-ID";
const AUTH_HEADER: &str = "X-Auth-Token";

/// HTTP client bound to one project and a pair of negotiated endpoints.
#[derive(Clone, Debug)]
pub struct OpenStackClient {
    http: reqwest::Client,
    token: String,
    timeout: Duration,
    endpoints: ResolvedEndpoints,
}

impl OpenStackClient {
    /// Validates the configuration, then negotiates the endpoints for both
    /// services.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Config`] when validation fails,
    /// [`OpenStackError::PermissionDenied`] when a probe is rejected for lack
    /// of rights, and [`OpenStackError::DiscoveryFailed`] when no candidate
    /// prefix answers.
    pub async fn connect(config: &CloudConfig) -> Result<Self, OpenStackError> {
        config.validate()?;
        let http = build_http(config)?;
        let endpoints = discovery::resolve(&http, config).await?;
        Ok(Self::assemble(http, config, endpoints))
    }

    /// Builds a client around endpoints that are already known.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Http`] when the HTTP client cannot be built.
    pub fn with_endpoints(
        config: &CloudConfig,
        endpoints: ResolvedEndpoints,
    ) -> Result<Self, OpenStackError> {
        let http = build_http(config)?;
        Ok(Self::assemble(http, config, endpoints))
    }

    fn assemble(http: reqwest::Client, config: &CloudConfig, endpoints: ResolvedEndpoints) -> Self {
        Self {
            http,
            token: config.auth_token.clone(),
            timeout: config.http_timeout(),
            endpoints,
        }
    }

    /// Endpoints in use.
    #[must_use]
    pub const fn endpoints(&self) -> &ResolvedEndpoints {
        &self.endpoints
    }

    fn volume_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint_url(&self.endpoints.volume, segments)
    }

    fn compute_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        endpoint_url(&self.endpoints.compute, segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let request_id = format!("req-{}", Uuid::new_v4());
        debug!(%method, %url, %request_id, "sending request");
        self.http
            .request(method, url)
            .header(AUTH_HEADER, &self.token)
            .header(REQUEST_ID_HEADER, request_id)
            .timeout(self.timeout)
    }

    async fn send_checked(&self, request: RequestBuilder, resource: &str) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|err| ApiError::Transport {
            message: err.to_string(),
        })?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, resource, body))
    }

    async fn post_action(&self, volume_id: &VolumeId, action: &VolumeAction) -> Result<(), ApiError> {
        let url = self.volume_url(&["volumes", volume_id.as_str(), "action"])?;
        let request = self.request(Method::POST, url).json(action);
        self.send_checked(request, &format!("volume {volume_id}"))
            .await
            .map(drop)
    }

    async fn fetch_volume(&self, volume_id: &VolumeId) -> Result<Volume, ApiError> {
        let url = self.volume_url(&["volumes", volume_id.as_str()])?;
        let response = self
            .send_checked(self.request(Method::GET, url), &format!("volume {volume_id}"))
            .await?;
        let envelope: VolumeEnvelope = response.json().await.map_err(|err| ApiError::Decode {
            message: err.to_string(),
        })?;
        Ok(Volume::from(envelope.volume))
    }

    async fn delete_attachment(&self, instance_id: &InstanceId, volume_id: &VolumeId) -> Result<(), ApiError> {
        let url = self.compute_url(&[
            "servers",
            instance_id.as_str(),
            "os-volume_attachments",
            volume_id.as_str(),
        ])?;
        self.send_checked(
            self.request(Method::DELETE, url),
            &format!("attachment of volume {volume_id} on server {instance_id}"),
        )
        .await
        .map(drop)
    }

    async fn remove_volume(&self, volume_id: &VolumeId) -> Result<(), ApiError> {
        let url = self.volume_url(&["volumes", volume_id.as_str()])?;
        self.send_checked(self.request(Method::DELETE, url), &format!("volume {volume_id}"))
            .await
            .map(drop)
    }

    async fn fetch_snapshots(&self, volume_id: &VolumeId) -> Result<Vec<Snapshot>, ApiError> {
        let url = self.volume_url(&["snapshots", "detail"])?;
        let request = self
            .request(Method::GET, url)
            .query(&[("volume_id", volume_id.as_str())]);
        let response = self.send_checked(request, "snapshot listing").await?;
        let envelope: SnapshotsEnvelope = response.json().await.map_err(|err| ApiError::Decode {
            message: err.to_string(),
        })?;
        Ok(envelope.snapshots.into_iter().map(Snapshot::from).collect())
    }
}

/// Appends `segments` to `base`, each as one percent-encoded path segment, so
/// an opaque id containing `/`, `?` or `#` stays inside its own segment.
fn endpoint_url(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = Url::parse(base).map_err(|err| ApiError::Transport {
        message: format!("invalid endpoint '{base}': {err}"),
    })?;
    url.path_segments_mut()
        .map_err(|()| ApiError::Transport {
            message: format!("endpoint '{base}' cannot carry a path"),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn build_http(config: &CloudConfig) -> Result<reqwest::Client, OpenStackError> {
    reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .map_err(|err| OpenStackError::Http {
            message: err.to_string(),
        })
}

impl VolumeApi for OpenStackClient {
    fn get_volume<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, Volume> {
        Box::pin(self.fetch_volume(volume_id))
    }

    fn remove_server_attachment<'a>(
        &'a self,
        instance_id: &'a InstanceId,
        volume_id: &'a VolumeId,
    ) -> ApiFuture<'a, ()> {
        Box::pin(self.delete_attachment(instance_id, volume_id))
    }

    fn force_detach<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.post_action(volume_id, &VolumeAction::ForceDetach {}).await })
    }

    fn reset_status<'a>(
        &'a self,
        volume_id: &'a VolumeId,
        reset: &'a StatusReset,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            let action = VolumeAction::ResetStatus {
                status: reset.status.as_str().to_owned(),
                attach_status: reset
                    .attach_status
                    .map(|attach_status| attach_status.as_str().to_owned()),
            };
            self.post_action(volume_id, &action).await
        })
    }

    fn delete_volume<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, ()> {
        Box::pin(self.remove_volume(volume_id))
    }

    fn list_snapshots<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, Vec<Snapshot>> {
        Box::pin(self.fetch_snapshots(volume_id))
    }
}
