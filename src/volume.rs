//! Block-storage volume model as observed through the remote API.
//!
//! Every field here is owned by the platform. The client reads these values
//! and requests transitions; it never mutates them locally.

use std::fmt;

use crate::types::{AttachmentId, InstanceId, SnapshotId, VolumeId};

/// Lifecycle status advertised by the platform for a volume.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum VolumeStatus {
    /// The volume is being provisioned.
    Creating,
    /// The volume exists and is not attached to any instance.
    Available,
    /// The volume is attached to at least one instance.
    InUse,
    /// A delete request has been accepted.
    Deleting,
    /// The platform reports the volume as broken.
    Error,
    /// The platform failed while deleting the volume.
    ErrorDeleting,
    /// Any status this client does not model (for example `detaching`).
    Other(String),
}

impl VolumeStatus {
    /// Parses a wire status string. Unknown values map to [`Self::Other`] so
    /// an unfamiliar status never makes a read fail.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "creating" => Self::Creating,
            "available" => Self::Available,
            "in-use" | "in_use" => Self::InUse,
            "deleting" => Self::Deleting,
            "error" => Self::Error,
            "error_deleting" => Self::ErrorDeleting,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns the wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "creating",
            Self::Available => "available",
            Self::InUse => "in-use",
            Self::Deleting => "deleting",
            Self::Error => "error",
            Self::ErrorDeleting => "error_deleting",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Returns `true` for the platform's failure states.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error | Self::ErrorDeleting)
    }
}

impl fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Secondary attachment signal. It may briefly disagree with the attachment
/// list while the platform converges.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AttachStatus {
    /// The platform considers the volume attached.
    Attached,
    /// The platform considers the volume detached.
    Detached,
}

impl AttachStatus {
    /// Parses a wire value; anything other than `attached` counts as detached.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("attached") {
            Self::Attached
        } else {
            Self::Detached
        }
    }

    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attached => "attached",
            Self::Detached => "detached",
        }
    }
}

impl fmt::Display for AttachStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record linking a volume to a compute instance and a device path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attachment {
    /// Identifier of the attachment record.
    pub attachment_id: AttachmentId,
    /// Instance the volume is attached to.
    pub server_id: InstanceId,
    /// Device path on the instance, when reported.
    pub device: Option<String>,
}

/// Full volume record as returned by the block-storage API.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Volume {
    /// Platform-assigned identifier.
    pub id: VolumeId,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// Advertised lifecycle status.
    pub status: VolumeStatus,
    /// Advertised attachment status.
    pub attach_status: AttachStatus,
    /// Attachment records in platform order.
    pub attachments: Vec<Attachment>,
    /// Size in GiB.
    pub size_gb: u64,
    /// Volume type, when reported.
    pub volume_type: Option<String>,
}

impl Volume {
    /// Projects the volume onto the fields the lifecycle manager inspects.
    #[must_use]
    pub fn into_state(self) -> VolumeState {
        VolumeState {
            status: self.status,
            attach_status: self.attach_status,
            attachments: self.attachments,
        }
    }
}

/// Observed volume state used by the probe and convergence checks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeState {
    /// Advertised lifecycle status.
    pub status: VolumeStatus,
    /// Advertised attachment status.
    pub attach_status: AttachStatus,
    /// Attachment records in platform order.
    pub attachments: Vec<Attachment>,
}

impl VolumeState {
    /// A non-empty attachment list means the volume is in use whatever the
    /// advertised status says.
    #[must_use]
    pub fn is_in_use(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Detach confirmation: available, not flagged attached, no attachments.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.status == VolumeStatus::Available
            && self.attach_status != AttachStatus::Attached
            && self.attachments.is_empty()
    }
}

/// Snapshot referencing a volume. Read-only for this crate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    /// Snapshot identifier.
    pub id: SnapshotId,
    /// Volume the snapshot was taken from.
    pub volume_id: VolumeId,
    /// Platform status string.
    pub status: String,
}
