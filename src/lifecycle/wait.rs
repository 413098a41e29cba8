//! Convergence waiter: polls the status probe until a predicate holds.

use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::api::VolumeApi;
use crate::types::VolumeId;
use crate::volume::VolumeState;

use super::{ProbeResult, VolumeLifecycle};

/// How a wait ended. Timing out is an ordinary outcome, not an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaitOutcome {
    /// The predicate held on an observed state.
    Satisfied,
    /// The volume disappeared while waiting.
    Gone,
    /// The budget elapsed without the predicate holding.
    TimedOut,
}

impl WaitOutcome {
    /// Boolean view of the outcome.
    #[must_use]
    pub const fn is_satisfied(self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

impl<A: VolumeApi> VolumeLifecycle<A> {
    /// Polls the volume every `poll_interval` until `predicate` holds or
    /// `budget` elapses. The final sleep is clipped to the deadline, so the
    /// wait never overruns the budget by more than one read.
    pub async fn wait_until<P>(
        &self,
        volume_id: &VolumeId,
        predicate: P,
        budget: Duration,
    ) -> WaitOutcome
    where
        P: Fn(&VolumeState) -> bool,
    {
        let deadline = Instant::now() + budget;
        loop {
            match self.check_status(volume_id).await {
                ProbeResult::Observed(state) if predicate(&state) => {
                    return WaitOutcome::Satisfied;
                }
                ProbeResult::Gone => return WaitOutcome::Gone,
                ProbeResult::Observed(state) => debug!(
                    %volume_id,
                    status = %state.status,
                    attachments = state.attachments.len(),
                    "volume has not converged yet"
                ),
                ProbeResult::Unavailable => {}
            }

            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut;
            }
            sleep(self.timings.poll_interval.min(deadline - now)).await;
        }
    }
}
