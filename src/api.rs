//! Transport seam between the lifecycle manager and the remote platform.
//!
//! The lifecycle code only ever talks to a [`VolumeApi`]. Failures come back
//! as a typed [`ApiError`] so callers match on the error kind instead of
//! probing response shapes.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::types::{InstanceId, VolumeId};
use crate::volume::{AttachStatus, Snapshot, Volume, VolumeStatus};

/// Errors raised by a [`VolumeApi`] transport.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// The platform answered 404 for the addressed resource.
    #[error("{resource} not found")]
    NotFound {
        /// Resource that was addressed.
        resource: String,
    },
    /// The platform rejected the credentials (401).
    #[error("authentication rejected: {message}")]
    Unauthorized {
        /// Body returned by the platform.
        message: String,
    },
    /// The caller lacks rights for the action (403).
    #[error("permission denied: {message}")]
    Forbidden {
        /// Body returned by the platform.
        message: String,
    },
    /// The resource is in a state that conflicts with the request (409).
    #[error("conflicting resource state: {message}")]
    Conflict {
        /// Body returned by the platform.
        message: String,
    },
    /// Any other non-success HTTP status.
    #[error("request rejected with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Body returned by the platform.
        message: String,
    },
    /// The request never produced a response.
    #[error("transport failure: {message}")]
    Transport {
        /// Underlying client error.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to decode response: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },
}

impl ApiError {
    /// Maps a non-success HTTP status to its error kind.
    #[must_use]
    pub fn from_status(status: u16, resource: &str, message: String) -> Self {
        match status {
            401 => Self::Unauthorized { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound {
                resource: resource.to_owned(),
            },
            409 => Self::Conflict { message },
            _ => Self::Rejected { status, message },
        }
    }

    /// Returns `true` when the addressed resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` when retrying with another strategy cannot help because
    /// the caller lacks rights.
    #[must_use]
    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Unauthorized { .. } | Self::Forbidden { .. })
    }
}

/// Administrative status rewrite applied by the `reset_status` action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusReset {
    /// Status the platform should record.
    pub status: VolumeStatus,
    /// Attachment status to record, when it should change as well.
    pub attach_status: Option<AttachStatus>,
}

impl StatusReset {
    /// Reset used by the detach ladder and emergency cleanup.
    #[must_use]
    pub const fn available_detached() -> Self {
        Self {
            status: VolumeStatus::Available,
            attach_status: Some(AttachStatus::Detached),
        }
    }
}

/// Future returned by [`VolumeApi`] operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Remote operations the lifecycle manager depends on.
pub trait VolumeApi: Send + Sync {
    /// Reads a single volume (`GET /volumes/{id}`).
    fn get_volume<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, Volume>;

    /// Removes the compute-side attachment of `volume_id` from `instance_id`.
    fn remove_server_attachment<'a>(
        &'a self,
        instance_id: &'a InstanceId,
        volume_id: &'a VolumeId,
    ) -> ApiFuture<'a, ()>;

    /// Issues the storage-side `force_detach` action.
    fn force_detach<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, ()>;

    /// Issues the storage-side `reset_status` action.
    fn reset_status<'a>(
        &'a self,
        volume_id: &'a VolumeId,
        reset: &'a StatusReset,
    ) -> ApiFuture<'a, ()>;

    /// Requests asynchronous deletion of the volume.
    fn delete_volume<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, ()>;

    /// Lists snapshots taken from the volume.
    fn list_snapshots<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, Vec<Snapshot>>;
}
