//! Test support utilities shared across unit and integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::{ApiError, ApiFuture, StatusReset, VolumeApi};
use crate::types::{AttachmentId, InstanceId, SnapshotId, VolumeId};
use crate::volume::{AttachStatus, Attachment, Snapshot, Volume, VolumeStatus};

/// Remote operations recorded by [`ScriptedVolumeApi`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Operation {
    /// `GET /volumes/{id}`.
    GetVolume,
    /// Compute-side attachment removal.
    RemoveServerAttachment,
    /// Storage-side `force_detach`.
    ForceDetach,
    /// Storage-side `reset_status`.
    ResetStatus,
    /// `DELETE /volumes/{id}`.
    DeleteVolume,
    /// Snapshot listing.
    ListSnapshots,
}

impl Operation {
    /// Returns `true` for operations that ask the platform to change state.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        !matches!(self, Self::GetVolume | Self::ListSnapshots)
    }
}

/// Records a single call made through [`ScriptedVolumeApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiCall {
    /// Operation invoked.
    pub operation: Operation,
    /// Volume addressed.
    pub volume_id: VolumeId,
    /// Instance addressed, for compute-side removals.
    pub instance_id: Option<InstanceId>,
}

#[derive(Debug, Default)]
struct PlatformState {
    volume: Option<Volume>,
    converging: Vec<Operation>,
    failures: HashMap<Operation, VecDeque<ApiError>>,
    snapshots: Vec<Snapshot>,
    delete_lag: Option<u32>,
    pending_delete: Option<u32>,
    calls: Vec<ApiCall>,
}

impl PlatformState {
    fn record(&mut self, operation: Operation, volume_id: &VolumeId, instance_id: Option<&InstanceId>) {
        self.calls.push(ApiCall {
            operation,
            volume_id: volume_id.clone(),
            instance_id: instance_id.cloned(),
        });
    }

    fn scripted_failure(&mut self, operation: Operation) -> Option<ApiError> {
        self.failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
    }

    fn converges(&self, operation: Operation) -> bool {
        self.converging.contains(&operation)
    }

    fn volume_mut(&mut self, volume_id: &VolumeId) -> Result<&mut Volume, ApiError> {
        self.volume
            .as_mut()
            .filter(|volume| &volume.id == volume_id)
            .ok_or_else(|| not_found(volume_id))
    }

    fn read(&mut self, volume_id: &VolumeId) -> Result<Volume, ApiError> {
        if let Some(remaining) = self.pending_delete {
            if remaining == 0 {
                self.volume = None;
                self.pending_delete = None;
            } else {
                self.pending_delete = Some(remaining - 1);
            }
        }
        self.volume_mut(volume_id).map(|volume| volume.clone())
    }
}

fn not_found(volume_id: &VolumeId) -> ApiError {
    ApiError::NotFound {
        resource: format!("volume {volume_id}"),
    }
}

fn settle_detached(volume: &mut Volume) {
    if volume.attachments.is_empty() {
        volume.status = VolumeStatus::Available;
        volume.attach_status = AttachStatus::Detached;
    }
}

/// In-memory stand-in for the remote platform.
///
/// Mutations are accepted but leave the volume untouched unless the
/// operation was marked with [`Self::converge_on`], which makes it take the
/// effect a healthy platform would apply. Failures queued with
/// [`Self::fail_next`] are returned in FIFO order before any effect runs.
#[derive(Clone, Debug, Default)]
pub struct ScriptedVolumeApi {
    state: Arc<Mutex<PlatformState>>,
}

impl ScriptedVolumeApi {
    /// Creates a platform that holds a single volume.
    #[must_use]
    pub fn with_volume(volume: Volume) -> Self {
        let api = Self::default();
        api.lock().volume = Some(volume);
        api
    }

    /// Creates a platform on which every volume read returns 404.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes `operation` apply its natural effect when it succeeds.
    pub fn converge_on(&self, operation: Operation) {
        self.lock().converging.push(operation);
    }

    /// Queues a failure for the next call of `operation`.
    pub fn fail_next(&self, operation: Operation, error: ApiError) {
        self.lock()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Sets the snapshots returned by the snapshot listing.
    pub fn set_snapshots(&self, snapshots: Vec<Snapshot>) {
        self.lock().snapshots = snapshots;
    }

    /// After an accepted delete, the next `reads` volume reads still see the
    /// volume as `deleting`; the read after that returns 404.
    pub fn delete_completes_after(&self, reads: u32) {
        self.lock().delete_lag = Some(reads);
    }

    /// Returns the current volume record, if it still exists.
    #[must_use]
    pub fn volume(&self) -> Option<Volume> {
        self.lock().volume.clone()
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Returns how many times `operation` was called.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Returns the distinct operations invoked, in first-call order.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        let mut seen = Vec::new();
        for call in &self.lock().calls {
            if !seen.contains(&call.operation) {
                seen.push(call.operation);
            }
        }
        seen
    }

    fn get(&self, volume_id: &VolumeId) -> Result<Volume, ApiError> {
        let mut state = self.lock();
        state.record(Operation::GetVolume, volume_id, None);
        if let Some(err) = state.scripted_failure(Operation::GetVolume) {
            return Err(err);
        }
        state.read(volume_id)
    }

    fn remove_attachment(&self, instance_id: &InstanceId, volume_id: &VolumeId) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.record(Operation::RemoveServerAttachment, volume_id, Some(instance_id));
        if let Some(err) = state.scripted_failure(Operation::RemoveServerAttachment) {
            return Err(err);
        }
        let converges = state.converges(Operation::RemoveServerAttachment);
        let volume = state.volume_mut(volume_id)?;
        if converges {
            volume
                .attachments
                .retain(|attachment| &attachment.server_id != instance_id);
            settle_detached(volume);
        }
        Ok(())
    }

    fn force(&self, volume_id: &VolumeId) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.record(Operation::ForceDetach, volume_id, None);
        if let Some(err) = state.scripted_failure(Operation::ForceDetach) {
            return Err(err);
        }
        let converges = state.converges(Operation::ForceDetach);
        let volume = state.volume_mut(volume_id)?;
        if converges {
            volume.attachments.clear();
            settle_detached(volume);
        }
        Ok(())
    }

    fn reset(&self, volume_id: &VolumeId, reset: &StatusReset) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.record(Operation::ResetStatus, volume_id, None);
        if let Some(err) = state.scripted_failure(Operation::ResetStatus) {
            return Err(err);
        }
        let converges = state.converges(Operation::ResetStatus);
        let volume = state.volume_mut(volume_id)?;
        if converges {
            volume.status = reset.status.clone();
            if let Some(attach_status) = reset.attach_status {
                volume.attach_status = attach_status;
            }
        }
        Ok(())
    }

    fn delete(&self, volume_id: &VolumeId) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.record(Operation::DeleteVolume, volume_id, None);
        if let Some(err) = state.scripted_failure(Operation::DeleteVolume) {
            return Err(err);
        }
        let lag = state.delete_lag;
        let volume = state.volume_mut(volume_id)?;
        volume.status = VolumeStatus::Deleting;
        state.pending_delete = lag;
        Ok(())
    }

    fn snapshots(&self, volume_id: &VolumeId) -> Result<Vec<Snapshot>, ApiError> {
        let mut state = self.lock();
        state.record(Operation::ListSnapshots, volume_id, None);
        if let Some(err) = state.scripted_failure(Operation::ListSnapshots) {
            return Err(err);
        }
        Ok(state.snapshots.clone())
    }
}

impl VolumeApi for ScriptedVolumeApi {
    fn get_volume<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, Volume> {
        Box::pin(async move { self.get(volume_id) })
    }

    fn remove_server_attachment<'a>(
        &'a self,
        instance_id: &'a InstanceId,
        volume_id: &'a VolumeId,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.remove_attachment(instance_id, volume_id) })
    }

    fn force_detach<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.force(volume_id) })
    }

    fn reset_status<'a>(
        &'a self,
        volume_id: &'a VolumeId,
        reset: &'a StatusReset,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.reset(volume_id, reset) })
    }

    fn delete_volume<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, ()> {
        Box::pin(async move { self.delete(volume_id) })
    }

    fn list_snapshots<'a>(&'a self, volume_id: &'a VolumeId) -> ApiFuture<'a, Vec<Snapshot>> {
        Box::pin(async move { self.snapshots(volume_id) })
    }
}

/// Builds an available volume with no attachments.
#[must_use]
pub fn available_volume(id: &str) -> Volume {
    Volume {
        id: VolumeId::from(id),
        name: Some(format!("{id}-name")),
        status: VolumeStatus::Available,
        attach_status: AttachStatus::Detached,
        attachments: Vec::new(),
        size_gb: 10,
        volume_type: Some(String::from("standard")),
    }
}

/// Builds an in-use volume attached to each of `servers`.
#[must_use]
pub fn attached_volume(id: &str, servers: &[&str]) -> Volume {
    let attachments = servers
        .iter()
        .enumerate()
        .map(|(index, server)| Attachment {
            attachment_id: AttachmentId::new(format!("att-{index}")),
            server_id: InstanceId::from(*server),
            device: Some(format!("/dev/vdb{index}")),
        })
        .collect();
    Volume {
        status: VolumeStatus::InUse,
        attach_status: AttachStatus::Attached,
        attachments,
        ..available_volume(id)
    }
}

/// Builds `count` available snapshots of the volume.
#[must_use]
pub fn snapshots_of(volume_id: &str, count: usize) -> Vec<Snapshot> {
    (0..count)
        .map(|index| Snapshot {
            id: SnapshotId::new(format!("snap-{volume_id}-{index}")),
            volume_id: VolumeId::from(volume_id),
            status: String::from("available"),
        })
        .collect()
}
