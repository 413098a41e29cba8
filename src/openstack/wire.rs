//! Request and response bodies for the block-storage API.

use serde::{Deserialize, Serialize};

use crate::types::{AttachmentId, InstanceId, SnapshotId, VolumeId};
use crate::volume::{AttachStatus, Attachment, Snapshot, Volume, VolumeStatus};

/// Envelope for `GET /volumes/{id}`.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct VolumeEnvelope {
    pub volume: WireVolume,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct WireVolume {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: String,
    #[serde(default)]
    pub attach_status: Option<String>,
    #[serde(default)]
    pub attachments: Vec<WireAttachment>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub volume_type: Option<String>,
}

/// Attachment entry. Some releases send `attachment_id`, others only `id`,
/// and many send both.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct WireAttachment {
    #[serde(default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    pub server_id: String,
    #[serde(default)]
    pub device: Option<String>,
}

impl From<WireVolume> for Volume {
    fn from(value: WireVolume) -> Self {
        let attachments: Vec<Attachment> = value
            .attachments
            .into_iter()
            .map(|attachment| Attachment {
                attachment_id: AttachmentId::new(
                    attachment
                        .attachment_id
                        .or(attachment.id)
                        .unwrap_or_default(),
                ),
                server_id: InstanceId::new(attachment.server_id),
                device: attachment.device,
            })
            .collect();
        // Older releases omit attach_status; fall back to the attachment list.
        let attach_status = value.attach_status.map_or_else(
            || {
                if attachments.is_empty() {
                    AttachStatus::Detached
                } else {
                    AttachStatus::Attached
                }
            },
            |raw| AttachStatus::parse(&raw),
        );
        Self {
            id: VolumeId::new(value.id),
            name: value.name,
            status: VolumeStatus::parse(&value.status),
            attach_status,
            attachments,
            size_gb: value.size,
            volume_type: value.volume_type,
        }
    }
}

/// Envelope for `GET /snapshots/detail`.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct SnapshotsEnvelope {
    #[serde(default)]
    pub snapshots: Vec<WireSnapshot>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct WireSnapshot {
    pub id: String,
    pub volume_id: String,
    pub status: String,
}

impl From<WireSnapshot> for Snapshot {
    fn from(value: WireSnapshot) -> Self {
        Self {
            id: SnapshotId::new(value.id),
            volume_id: VolumeId::new(value.volume_id),
            status: value.status,
        }
    }
}

/// Body for `POST /volumes/{id}/action`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub(super) enum VolumeAction {
    ForceDetach {},
    ResetStatus {
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        attach_status: Option<String>,
    },
}
