//! Core library for the `blockwarden` volume lifecycle tool.
//!
//! The crate drives block-storage volumes through detach and delete on an
//! OpenStack cloud whose state machine is only eventually consistent. The
//! [`lifecycle`] module holds the orchestration (status probing, convergence
//! waits, the escalating detach ladder, safe deletion, and emergency
//! cleanup). It talks to the platform exclusively through the [`VolumeApi`]
//! seam, which [`OpenStackClient`] implements over HTTP.

pub mod api;
pub mod config;
pub mod lifecycle;
pub mod openstack;
pub mod test_support;
pub mod types;
pub mod volume;

pub use api::{ApiError, StatusReset, VolumeApi};
pub use config::{CloudConfig, ConfigError};
pub use lifecycle::{
    CleanupOutcome, CleanupReport, DeleteOutcome, DeleteReport, DetachOutcome, DetachTier,
    LifecycleError, LifecycleTimings, ProbeResult, SnapshotDecision, VolumeLifecycle, WaitOutcome,
};
pub use openstack::{OpenStackClient, OpenStackError, ResolvedEndpoints};
pub use types::{AttachmentId, InstanceId, SnapshotId, VolumeId};
pub use volume::{AttachStatus, Attachment, Snapshot, Volume, VolumeState, VolumeStatus};
