//! Hard failures surfaced by the lifecycle manager.

use thiserror::Error;

use crate::types::VolumeId;

/// Errors that stop a delete outright. Everything else is absorbed into the
/// tiered retry logic and reported through outcome values.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LifecycleError {
    /// Deletion was requested for a volume that still has attachments.
    #[error("volume {volume_id} is still attached ({attachments} attachment(s)); detach it first")]
    VolumeInUse {
        /// Volume the caller tried to delete.
        volume_id: VolumeId,
        /// Number of attachments observed on the fresh read.
        attachments: usize,
    },
    /// The volume could not be read, so no baseline state exists.
    #[error("state of volume {volume_id} could not be determined")]
    VolumeStateUnknown {
        /// Volume that could not be read.
        volume_id: VolumeId,
    },
    /// The platform refused the request for lack of rights.
    #[error("permission denied for volume {volume_id}: {message}")]
    PermissionDenied {
        /// Volume the request addressed.
        volume_id: VolumeId,
        /// Message returned by the platform.
        message: String,
    },
    /// The platform rejected the delete request; nothing is in flight.
    #[error("delete of volume {volume_id} was rejected: {message}")]
    DeleteRejected {
        /// Volume the request addressed.
        volume_id: VolumeId,
        /// Message returned by the platform.
        message: String,
    },
}
