//! Detach orchestrator: an ordered ladder of escalating detach strategies.
//!
//! Each tier has the same shape, taking the target and returning a
//! [`TierOutcome`]. One driver loop walks the ladder and stops at the first
//! tier that converges, so reordering or dropping tiers is a data change.

use std::fmt;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::api::{ApiError, StatusReset, VolumeApi};
use crate::types::{InstanceId, VolumeId};
use crate::volume::{VolumeState, VolumeStatus};

use super::{ProbeResult, VolumeLifecycle, WaitOutcome};

/// One escalating strategy in the detach ladder.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DetachTier {
    /// Compute-side removal of the instance's attachment.
    Standard,
    /// Storage-side `force_detach`, bypassing the compute service.
    ForceDetach,
    /// Independent compute-side removal of every attachment on record.
    PerAttachment,
    /// Administrative `reset_status` to `available`/`detached`.
    ResetStatus,
}

impl DetachTier {
    /// Default ladder, in escalation order.
    pub const LADDER: [Self; 4] = [
        Self::Standard,
        Self::ForceDetach,
        Self::PerAttachment,
        Self::ResetStatus,
    ];

    /// Short name used in logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ForceDetach => "force-detach",
            Self::PerAttachment => "per-attachment",
            Self::ResetStatus => "reset-status",
        }
    }
}

impl fmt::Display for DetachTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of running a single tier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TierOutcome {
    /// The volume reached the tier's success condition.
    Converged,
    /// The tier's action failed or did not converge within its budget.
    NotConverged,
    /// The volume disappeared during the tier.
    Gone,
    /// The platform refused the action for lack of rights.
    Denied(ApiError),
}

/// Overall result of [`VolumeLifecycle::safe_detach`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DetachOutcome {
    /// The fast path found the volume already detached; nothing was sent.
    AlreadyDetached,
    /// The volume no longer exists, so there is nothing to detach.
    VolumeGone,
    /// The given tier converged; later tiers were not attempted.
    Detached {
        /// Tier that succeeded.
        tier: DetachTier,
    },
    /// The platform denied a tier's action; escalation stopped there.
    PermissionDenied {
        /// Tier whose action was denied.
        tier: DetachTier,
        /// Message returned by the platform.
        message: String,
    },
    /// Every tier ran without converging.
    Exhausted,
}

impl DetachOutcome {
    /// Returns `true` when the volume is known to be free of attachments.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(
            self,
            Self::AlreadyDetached | Self::VolumeGone | Self::Detached { .. }
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct DetachTarget<'a> {
    instance_id: &'a InstanceId,
    volume_id: &'a VolumeId,
    label: &'a str,
}

fn is_converged(state: &VolumeState) -> bool {
    state.is_detached()
}

impl<A: VolumeApi> VolumeLifecycle<A> {
    /// Drives a volume from attached to available, escalating through the
    /// ladder until a tier converges. Never fails: non-convergence and
    /// rejected actions are absorbed and reported through [`DetachOutcome`].
    pub async fn safe_detach(
        &self,
        instance_id: &InstanceId,
        volume_id: &VolumeId,
        label: Option<&str>,
    ) -> DetachOutcome {
        let target = DetachTarget {
            instance_id,
            volume_id,
            label: label.unwrap_or(volume_id.as_str()),
        };

        match self.check_status(volume_id).await {
            // attach_status may lag the attachment list, so only status and
            // attachments decide whether anything needs doing.
            ProbeResult::Observed(state)
                if state.status == VolumeStatus::Available && state.attachments.is_empty() =>
            {
                info!(%volume_id, label = target.label, "volume already detached");
                return DetachOutcome::AlreadyDetached;
            }
            ProbeResult::Gone => {
                info!(%volume_id, label = target.label, "volume no longer exists; nothing to detach");
                return DetachOutcome::VolumeGone;
            }
            ProbeResult::Observed(_) | ProbeResult::Unavailable => {}
        }

        for &tier in &self.ladder {
            info!(%volume_id, %instance_id, label = target.label, %tier, "attempting detach tier");
            match self.run_tier(tier, target).await {
                TierOutcome::Converged => {
                    info!(%volume_id, label = target.label, %tier, "volume detached");
                    return DetachOutcome::Detached { tier };
                }
                TierOutcome::Gone => {
                    info!(%volume_id, label = target.label, %tier, "volume disappeared during detach");
                    return DetachOutcome::VolumeGone;
                }
                TierOutcome::Denied(err) => {
                    warn!(%volume_id, label = target.label, %tier, error = %err, "detach tier denied; not escalating");
                    return DetachOutcome::PermissionDenied {
                        tier,
                        message: err.to_string(),
                    };
                }
                TierOutcome::NotConverged => {
                    warn!(%volume_id, label = target.label, %tier, "detach tier did not converge");
                }
            }
        }

        warn!(%volume_id, label = target.label, "all detach tiers exhausted");
        DetachOutcome::Exhausted
    }

    async fn run_tier(&self, tier: DetachTier, target: DetachTarget<'_>) -> TierOutcome {
        match tier {
            DetachTier::Standard => self.standard_detach(target).await,
            DetachTier::ForceDetach => self.forced_detach(target).await,
            DetachTier::PerAttachment => self.per_attachment_teardown(target).await,
            DetachTier::ResetStatus => self.forced_status_reset(target).await,
        }
    }

    async fn standard_detach(&self, target: DetachTarget<'_>) -> TierOutcome {
        let result = self
            .api
            .remove_server_attachment(target.instance_id, target.volume_id)
            .await;
        // A missing compute-side attachment may mean it is already gone.
        if let Some(outcome) = absorb_action(DetachTier::Standard, target, result, true) {
            return outcome;
        }
        self.await_detached(target, self.timings.standard_detach_budget)
            .await
    }

    async fn forced_detach(&self, target: DetachTarget<'_>) -> TierOutcome {
        let result = self.api.force_detach(target.volume_id).await;
        if let Some(outcome) = absorb_action(DetachTier::ForceDetach, target, result, false) {
            return outcome;
        }
        self.await_detached(target, self.timings.force_detach_budget)
            .await
    }

    async fn per_attachment_teardown(&self, target: DetachTarget<'_>) -> TierOutcome {
        let state = match self.check_status(target.volume_id).await {
            ProbeResult::Observed(state) => state,
            ProbeResult::Gone => return TierOutcome::Gone,
            ProbeResult::Unavailable => return TierOutcome::NotConverged,
        };

        for attachment in &state.attachments {
            let result = self
                .api
                .remove_server_attachment(&attachment.server_id, target.volume_id)
                .await;
            match result {
                Ok(()) => {}
                Err(err) if err.is_permission_denied() => return TierOutcome::Denied(err),
                Err(err) => warn!(
                    volume_id = %target.volume_id,
                    server_id = %attachment.server_id,
                    attachment_id = %attachment.attachment_id,
                    error = %err,
                    "attachment removal failed; continuing"
                ),
            }
        }

        sleep(self.timings.attachment_settle).await;
        match self.check_status(target.volume_id).await {
            ProbeResult::Observed(state) if state.attachments.is_empty() => TierOutcome::Converged,
            ProbeResult::Gone => TierOutcome::Gone,
            ProbeResult::Observed(_) | ProbeResult::Unavailable => TierOutcome::NotConverged,
        }
    }

    async fn forced_status_reset(&self, target: DetachTarget<'_>) -> TierOutcome {
        let reset = StatusReset::available_detached();
        let result = self.api.reset_status(target.volume_id, &reset).await;
        if let Some(outcome) = absorb_action(DetachTier::ResetStatus, target, result, false) {
            return outcome;
        }

        sleep(self.timings.reset_settle).await;
        match self.check_status(target.volume_id).await {
            ProbeResult::Observed(state) if state.status == VolumeStatus::Available => {
                TierOutcome::Converged
            }
            ProbeResult::Gone => TierOutcome::Gone,
            ProbeResult::Observed(_) | ProbeResult::Unavailable => TierOutcome::NotConverged,
        }
    }

    async fn await_detached(&self, target: DetachTarget<'_>, budget: Duration) -> TierOutcome {
        match self.wait_until(target.volume_id, is_converged, budget).await {
            WaitOutcome::Satisfied => TierOutcome::Converged,
            WaitOutcome::Gone => TierOutcome::Gone,
            WaitOutcome::TimedOut => TierOutcome::NotConverged,
        }
    }
}

/// Turns a failed tier action into the tier's outcome. Returns `None` when the
/// tier should go on to wait for convergence.
fn absorb_action(
    tier: DetachTier,
    target: DetachTarget<'_>,
    result: Result<(), ApiError>,
    tolerate_not_found: bool,
) -> Option<TierOutcome> {
    let err = result.err()?;
    if err.is_permission_denied() {
        return Some(TierOutcome::Denied(err));
    }
    if err.is_not_found() {
        if tolerate_not_found {
            return None;
        }
        return Some(TierOutcome::Gone);
    }
    warn!(
        volume_id = %target.volume_id,
        label = target.label,
        %tier,
        error = %err,
        "detach tier action rejected"
    );
    Some(TierOutcome::NotConverged)
}
