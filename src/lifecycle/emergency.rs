//! Emergency cleanup: the last-resort repair once the detach ladder is spent.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::{StatusReset, VolumeApi};
use crate::types::VolumeId;
use crate::volume::{Attachment, VolumeStatus};

use super::{ProbeResult, VolumeLifecycle};

/// Final state reached by an emergency cleanup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CleanupOutcome {
    /// The volume reads back as available.
    Restored,
    /// The repair ran but the volume did not read back as available.
    Partial {
        /// Last observed status, when the final read succeeded.
        last_status: Option<VolumeStatus>,
    },
}

impl CleanupOutcome {
    /// Cleanup is the last resort and never reports a hard failure, so both
    /// outcomes count as success. [`Self::Partial`] carries the note.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Restored | Self::Partial { .. })
    }
}

/// Report returned by [`VolumeLifecycle::emergency_cleanup`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CleanupReport {
    /// Volume the cleanup addressed.
    pub volume_id: VolumeId,
    /// Final state reached.
    pub outcome: CleanupOutcome,
    /// Attachment removals issued.
    pub removal_attempts: usize,
    /// Attachment removals the platform rejected.
    pub removal_failures: usize,
    /// Whether the status reset was accepted.
    pub reset_accepted: bool,
}

impl<A: VolumeApi> VolumeLifecycle<A> {
    /// Removes every attachment on record without checking between attempts,
    /// then rewrites the status to `available`/`detached`.
    ///
    /// There is no fallback after this, so the call never reports a hard
    /// failure; a volume that does not read back as available yields
    /// [`CleanupOutcome::Partial`].
    pub async fn emergency_cleanup(
        &self,
        volume_id: &VolumeId,
        volume_label: Option<&str>,
    ) -> CleanupReport {
        let label = volume_label.unwrap_or(volume_id.as_str());
        warn!(%volume_id, label, "starting emergency cleanup");

        let attachments: Vec<Attachment> = match self.check_status(volume_id).await {
            ProbeResult::Observed(state) => state.attachments,
            ProbeResult::Gone | ProbeResult::Unavailable => Vec::new(),
        };

        let mut removal_failures = 0;
        for attachment in &attachments {
            if let Err(err) = self
                .api
                .remove_server_attachment(&attachment.server_id, volume_id)
                .await
            {
                removal_failures += 1;
                warn!(
                    %volume_id,
                    server_id = %attachment.server_id,
                    error = %err,
                    "emergency attachment removal failed; ignoring"
                );
            }
        }

        sleep(self.timings.emergency_settle).await;

        let reset = StatusReset::available_detached();
        let reset_accepted = match self.api.reset_status(volume_id, &reset).await {
            Ok(()) => true,
            Err(err) => {
                warn!(%volume_id, error = %err, "emergency status reset failed");
                false
            }
        };

        let outcome = match self.check_status(volume_id).await {
            ProbeResult::Observed(state) if state.status == VolumeStatus::Available => {
                info!(%volume_id, label, "emergency cleanup restored the volume");
                CleanupOutcome::Restored
            }
            ProbeResult::Observed(state) => {
                warn!(%volume_id, label, status = %state.status, "emergency cleanup only partially succeeded");
                CleanupOutcome::Partial {
                    last_status: Some(state.status),
                }
            }
            ProbeResult::Gone | ProbeResult::Unavailable => {
                warn!(%volume_id, label, "emergency cleanup could not read the final state");
                CleanupOutcome::Partial { last_status: None }
            }
        };

        CleanupReport {
            volume_id: volume_id.clone(),
            outcome,
            removal_attempts: attachments.len(),
            removal_failures,
            reset_accepted,
        }
    }
}
