//! Volume lifecycle manager: safe detach, safe delete, and emergency cleanup.
//!
//! The platform offers no transactions, so every operation here is built from
//! single remote calls followed by polling until the remote record converges.
//! Reads are never cached across steps; each decision is taken on a fresh
//! probe.

use std::time::Duration;

mod delete;
mod detach;
mod emergency;
mod error;
mod probe;
mod wait;

pub use delete::{DeleteOutcome, DeleteReport, SnapshotDecision};
pub use detach::{DetachOutcome, DetachTier, TierOutcome};
pub use emergency::{CleanupOutcome, CleanupReport};
pub use error::LifecycleError;
pub use probe::ProbeResult;
pub use wait::WaitOutcome;

use crate::api::VolumeApi;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const STANDARD_DETACH_BUDGET: Duration = Duration::from_secs(20);
const FORCE_DETACH_BUDGET: Duration = Duration::from_secs(15);
const ATTACHMENT_SETTLE: Duration = Duration::from_secs(3);
const RESET_SETTLE: Duration = Duration::from_secs(1);
const DELETE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DELETE_POLL_ATTEMPTS: u32 = 30;
const EMERGENCY_SETTLE: Duration = Duration::from_secs(5);

/// Polling cadences, convergence budgets, and settle delays.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LifecycleTimings {
    /// Interval between reads while waiting for detach convergence.
    pub poll_interval: Duration,
    /// Budget for the standard compute-side detach to converge.
    pub standard_detach_budget: Duration,
    /// Budget for the storage-side forced detach to converge.
    pub force_detach_budget: Duration,
    /// Delay after per-attachment teardown before re-reading.
    pub attachment_settle: Duration,
    /// Delay after a status reset before re-reading.
    pub reset_settle: Duration,
    /// Interval between reads while confirming a deletion.
    pub delete_poll_interval: Duration,
    /// Number of reads spent confirming a deletion.
    pub delete_poll_attempts: u32,
    /// Delay between attachment removal and status reset in emergency cleanup.
    pub emergency_settle: Duration,
}

impl Default for LifecycleTimings {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            standard_detach_budget: STANDARD_DETACH_BUDGET,
            force_detach_budget: FORCE_DETACH_BUDGET,
            attachment_settle: ATTACHMENT_SETTLE,
            reset_settle: RESET_SETTLE,
            delete_poll_interval: DELETE_POLL_INTERVAL,
            delete_poll_attempts: DELETE_POLL_ATTEMPTS,
            emergency_settle: EMERGENCY_SETTLE,
        }
    }
}

/// Orchestrates detach, delete, and cleanup against a [`VolumeApi`].
///
/// One instance may serve many volumes. Calls for the same volume are not
/// serialised against each other; the platform is the single source of
/// truth and rejects conflicting requests itself.
#[derive(Clone, Debug)]
pub struct VolumeLifecycle<A> {
    api: A,
    timings: LifecycleTimings,
    ladder: Vec<DetachTier>,
}

impl<A: VolumeApi> VolumeLifecycle<A> {
    /// Creates a lifecycle manager with the default four-tier detach ladder.
    #[must_use]
    pub fn new(api: A, timings: LifecycleTimings) -> Self {
        Self {
            api,
            timings,
            ladder: DetachTier::LADDER.to_vec(),
        }
    }

    /// Replaces the detach ladder. Tiers run in the given order and the first
    /// convergent tier ends the attempt.
    #[must_use]
    pub fn with_ladder(mut self, ladder: impl IntoIterator<Item = DetachTier>) -> Self {
        self.ladder = ladder.into_iter().collect();
        self
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Returns the configured timings.
    #[must_use]
    pub const fn timings(&self) -> &LifecycleTimings {
        &self.timings
    }

    /// Returns the detach ladder in execution order.
    #[must_use]
    pub fn ladder(&self) -> &[DetachTier] {
        &self.ladder
    }
}

#[cfg(test)]
mod tests;
