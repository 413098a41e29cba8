//! Delete orchestrator: precondition checks, snapshot reporting, deletion,
//! and confirmation polling.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::api::VolumeApi;
use crate::types::VolumeId;
use crate::volume::Snapshot;

use super::{LifecycleError, ProbeResult, VolumeLifecycle};

/// Caller's go/no-go decision once dependent snapshots are known.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SnapshotDecision {
    /// Issue the delete request.
    Proceed,
    /// Stop without deleting.
    Abort,
}

/// How a delete call ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteOutcome {
    /// A later read returned 404: the volume is gone.
    Confirmed,
    /// The request was accepted but disappearance was not observed within the
    /// poll budget. The volume may still exist when the call returns.
    Assumed,
    /// The volume did not exist when the call started, or vanished before the
    /// delete request landed.
    AlreadyGone,
    /// The caller declined to delete after reviewing dependent snapshots.
    Declined,
}

impl DeleteOutcome {
    /// Returns `true` for outcomes where the delete is done or in flight.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Confirmed | Self::Assumed | Self::AlreadyGone)
    }
}

/// Report returned by [`VolumeLifecycle::safe_delete`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeleteReport {
    /// Volume the call addressed.
    pub volume_id: VolumeId,
    /// How the call ended.
    pub outcome: DeleteOutcome,
    /// Snapshots that referenced the volume before deletion.
    pub snapshots: Vec<Snapshot>,
    /// Number of confirmation reads issued after the delete request.
    pub polls: u32,
}

impl<A: VolumeApi> VolumeLifecycle<A> {
    /// Deletes a detached volume, reporting dependent snapshots and always
    /// proceeding past them.
    ///
    /// # Errors
    ///
    /// See [`Self::safe_delete_with`].
    pub async fn safe_delete(
        &self,
        volume_id: &VolumeId,
        label: Option<&str>,
    ) -> Result<DeleteReport, LifecycleError> {
        self.safe_delete_with(volume_id, label, |_| SnapshotDecision::Proceed)
            .await
    }

    /// Deletes a detached volume. `review` receives the dependent snapshots
    /// and decides whether the delete goes ahead.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::VolumeStateUnknown`] when the volume cannot
    /// be read, [`LifecycleError::VolumeInUse`] when it still has attachments,
    /// [`LifecycleError::PermissionDenied`] when the platform refuses the
    /// delete for lack of rights, and [`LifecycleError::DeleteRejected`] when
    /// it rejects the delete request for any other reason.
    pub async fn safe_delete_with<F>(
        &self,
        volume_id: &VolumeId,
        volume_label: Option<&str>,
        review: F,
    ) -> Result<DeleteReport, LifecycleError>
    where
        F: FnOnce(&[Snapshot]) -> SnapshotDecision,
    {
        let label = volume_label.unwrap_or(volume_id.as_str());
        let report = |outcome, snapshots, polls| DeleteReport {
            volume_id: volume_id.clone(),
            outcome,
            snapshots,
            polls,
        };

        let state = match self.check_status(volume_id).await {
            ProbeResult::Observed(state) => state,
            ProbeResult::Gone => {
                info!(%volume_id, label, "volume already gone");
                return Ok(report(DeleteOutcome::AlreadyGone, Vec::new(), 0));
            }
            ProbeResult::Unavailable => {
                return Err(LifecycleError::VolumeStateUnknown {
                    volume_id: volume_id.clone(),
                });
            }
        };

        if state.is_in_use() {
            return Err(LifecycleError::VolumeInUse {
                volume_id: volume_id.clone(),
                attachments: state.attachments.len(),
            });
        }

        let snapshots = self.dependent_snapshots(volume_id).await;
        if !snapshots.is_empty() {
            info!(%volume_id, label, count = snapshots.len(), "volume has dependent snapshots");
        }
        if review(&snapshots) == SnapshotDecision::Abort {
            info!(%volume_id, label, "delete declined by caller");
            return Ok(report(DeleteOutcome::Declined, snapshots, 0));
        }

        match self.api.delete_volume(volume_id).await {
            Ok(()) => info!(%volume_id, label, "delete request accepted"),
            Err(err) if err.is_not_found() => {
                info!(%volume_id, label, "volume vanished before the delete landed");
                return Ok(report(DeleteOutcome::AlreadyGone, snapshots, 0));
            }
            Err(err) if err.is_permission_denied() => {
                return Err(LifecycleError::PermissionDenied {
                    volume_id: volume_id.clone(),
                    message: err.to_string(),
                });
            }
            Err(err) => {
                return Err(LifecycleError::DeleteRejected {
                    volume_id: volume_id.clone(),
                    message: err.to_string(),
                });
            }
        }

        let (outcome, polls) = self.await_disappearance(volume_id, label).await;
        Ok(report(outcome, snapshots, polls))
    }

    /// Lists snapshots taken from the volume. The list is advisory, so a
    /// failed lookup is logged and reported as empty.
    async fn dependent_snapshots(&self, volume_id: &VolumeId) -> Vec<Snapshot> {
        match self.api.list_snapshots(volume_id).await {
            Ok(snapshots) => snapshots
                .into_iter()
                .filter(|snapshot| &snapshot.volume_id == volume_id)
                .collect(),
            Err(err) => {
                warn!(%volume_id, error = %err, "snapshot lookup failed; continuing without it");
                Vec::new()
            }
        }
    }

    async fn await_disappearance(&self, volume_id: &VolumeId, label: &str) -> (DeleteOutcome, u32) {
        let attempts = self.timings.delete_poll_attempts;
        for attempt in 1..=attempts {
            sleep(self.timings.delete_poll_interval).await;
            match self.check_status(volume_id).await {
                ProbeResult::Gone => {
                    info!(%volume_id, label, polls = attempt, "volume deletion confirmed");
                    return (DeleteOutcome::Confirmed, attempt);
                }
                ProbeResult::Observed(state) if state.status.is_error() => warn!(
                    %volume_id,
                    label,
                    status = %state.status,
                    "volume reported an error while deleting; trusting the accepted request"
                ),
                ProbeResult::Observed(state) => {
                    debug!(%volume_id, status = %state.status, attempt, "volume still present");
                }
                ProbeResult::Unavailable => {}
            }
        }

        warn!(
            %volume_id,
            label,
            polls = attempts,
            "deletion not observed within the poll budget; assuming it completes asynchronously"
        );
        (DeleteOutcome::Assumed, attempts)
    }
}
