//! Shared fixtures for volume lifecycle BDD scenarios.

use std::time::Duration;

use blockwarden::test_support::ScriptedVolumeApi;
use blockwarden::{
    CleanupReport, DeleteReport, DetachOutcome, InstanceId, LifecycleError, LifecycleTimings,
    VolumeId, VolumeLifecycle,
};
use rstest::fixture;
use thiserror::Error;

/// Scenario state threaded through the steps.
#[derive(Clone, Debug)]
pub struct LifecycleContext {
    pub api: ScriptedVolumeApi,
    pub volume_id: VolumeId,
    pub instance_id: InstanceId,
    pub timings: LifecycleTimings,
    pub detach: Option<DetachOutcome>,
    pub delete: Option<Result<DeleteReport, LifecycleError>>,
    pub cleanup: Option<CleanupReport>,
}

impl LifecycleContext {
    pub fn lifecycle(&self) -> VolumeLifecycle<ScriptedVolumeApi> {
        VolumeLifecycle::new(self.api.clone(), self.timings)
    }
}

#[derive(Clone, Debug, Error)]
pub enum LifecycleTestError {
    #[error("invalid lifecycle fixture: {0}")]
    Fixture(String),
}

pub type LifecycleContextResult = Result<LifecycleContext, LifecycleTestError>;

/// Millisecond timings keep scenarios fast while preserving every budget's
/// ordering relative to the poll interval.
fn scenario_timings() -> LifecycleTimings {
    LifecycleTimings {
        poll_interval: Duration::from_millis(1),
        standard_detach_budget: Duration::from_millis(20),
        force_detach_budget: Duration::from_millis(15),
        attachment_settle: Duration::from_millis(3),
        reset_settle: Duration::from_millis(1),
        delete_poll_interval: Duration::from_millis(1),
        delete_poll_attempts: 30,
        emergency_settle: Duration::from_millis(5),
    }
}

#[fixture]
pub fn lifecycle_context_result() -> LifecycleContextResult {
    build_lifecycle_context()
}

#[fixture]
pub fn lifecycle_context(
    lifecycle_context_result: LifecycleContextResult,
) -> LifecycleContext {
    lifecycle_context_result
        .unwrap_or_else(|err| panic!("lifecycle context fixture should initialise: {err}"))
}

fn build_lifecycle_context() -> LifecycleContextResult {
    let timings = scenario_timings();
    if timings.poll_interval >= timings.force_detach_budget {
        return Err(LifecycleTestError::Fixture(String::from(
            "poll interval must be shorter than the detach budgets",
        )));
    }
    Ok(LifecycleContext {
        api: ScriptedVolumeApi::empty(),
        volume_id: VolumeId::from("vol-unset"),
        instance_id: InstanceId::from("srv-unset"),
        timings,
        detach: None,
        delete: None,
        cleanup: None,
    })
}
