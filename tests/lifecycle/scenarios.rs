//! BDD scenarios for the volume lifecycle.

use rstest_bdd_macros::scenario;

use super::test_helpers::{LifecycleContext, lifecycle_context};

#[scenario(
    path = "tests/features/volume_lifecycle.feature",
    name = "Skip the detach when the volume is already available"
)]
fn scenario_fast_path(lifecycle_context: LifecycleContext) {
    drop(lifecycle_context);
}

#[scenario(
    path = "tests/features/volume_lifecycle.feature",
    name = "Escalate to a forced detach when the compute API conflicts"
)]
fn scenario_forced_detach(lifecycle_context: LifecycleContext) {
    drop(lifecycle_context);
}

#[scenario(
    path = "tests/features/volume_lifecycle.feature",
    name = "Fall through to a status reset when nothing else converges"
)]
fn scenario_status_reset(lifecycle_context: LifecycleContext) {
    drop(lifecycle_context);
}

#[scenario(
    path = "tests/features/volume_lifecycle.feature",
    name = "Report exhaustion when no tier converges"
)]
fn scenario_exhausted(lifecycle_context: LifecycleContext) {
    drop(lifecycle_context);
}

#[scenario(
    path = "tests/features/volume_lifecycle.feature",
    name = "Delete a volume that still has snapshots"
)]
fn scenario_delete_with_snapshots(lifecycle_context: LifecycleContext) {
    drop(lifecycle_context);
}

#[scenario(
    path = "tests/features/volume_lifecycle.feature",
    name = "Refuse to delete a volume that is still attached"
)]
fn scenario_delete_refused(lifecycle_context: LifecycleContext) {
    drop(lifecycle_context);
}

#[scenario(
    path = "tests/features/volume_lifecycle.feature",
    name = "Restore a stuck volume with an emergency cleanup"
)]
fn scenario_emergency_cleanup(lifecycle_context: LifecycleContext) {
    drop(lifecycle_context);
}
