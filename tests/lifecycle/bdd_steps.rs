//! BDD step definitions for the volume lifecycle.

use blockwarden::test_support::{
    Operation, ScriptedVolumeApi, attached_volume, available_volume, snapshots_of,
};
use blockwarden::{
    ApiError, CleanupOutcome, DeleteOutcome, DetachOutcome, DetachTier, InstanceId,
    LifecycleError, VolumeId, VolumeStatus,
};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{LifecycleContext, LifecycleTestError};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Setup(#[from] LifecycleTestError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn runtime() -> Result<Runtime, StepError> {
    Runtime::new().map_err(|err| StepError::Assertion(err.to_string()))
}

#[given("a volume \"{id}\" that is available")]
fn available(mut lifecycle_context: LifecycleContext, id: String) -> Result<LifecycleContext, StepError> {
    lifecycle_context.api = ScriptedVolumeApi::with_volume(available_volume(&id));
    lifecycle_context.volume_id = VolumeId::new(id);
    Ok(lifecycle_context)
}

#[given("a volume \"{id}\" attached to instance \"{instance}\"")]
fn attached(
    mut lifecycle_context: LifecycleContext,
    id: String,
    instance: String,
) -> Result<LifecycleContext, StepError> {
    lifecycle_context.api = ScriptedVolumeApi::with_volume(attached_volume(&id, &[&instance]));
    lifecycle_context.volume_id = VolumeId::new(id);
    lifecycle_context.instance_id = InstanceId::new(instance);
    Ok(lifecycle_context)
}

#[given("the standard detach is rejected with a conflict")]
fn standard_conflicts(lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    lifecycle_context.api.fail_next(
        Operation::RemoveServerAttachment,
        ApiError::Conflict {
            message: String::from("volume is busy"),
        },
    );
    Ok(lifecycle_context)
}

#[given("a forced detach converges")]
fn forced_detach_converges(lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    lifecycle_context.api.converge_on(Operation::ForceDetach);
    Ok(lifecycle_context)
}

#[given("only a status reset converges")]
fn only_reset_converges(lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    lifecycle_context.api.converge_on(Operation::ResetStatus);
    Ok(lifecycle_context)
}

#[given("the volume has \"{count}\" snapshots")]
fn volume_has_snapshots(lifecycle_context: LifecycleContext, count: usize) -> Result<LifecycleContext, StepError> {
    lifecycle_context
        .api
        .set_snapshots(snapshots_of(lifecycle_context.volume_id.as_str(), count));
    Ok(lifecycle_context)
}

#[given("the deletion completes after \"{reads}\" reads")]
fn deletion_lags(lifecycle_context: LifecycleContext, reads: u32) -> Result<LifecycleContext, StepError> {
    lifecycle_context.api.delete_completes_after(reads);
    Ok(lifecycle_context)
}

#[when("I detach it from instance \"{instance}\"")]
fn detach(
    mut lifecycle_context: LifecycleContext,
    instance: String,
) -> Result<LifecycleContext, StepError> {
    let runtime = runtime()?;
    let lifecycle = lifecycle_context.lifecycle();
    let instance_id = InstanceId::new(instance);
    let volume_id = lifecycle_context.volume_id.clone();
    let outcome = runtime.block_on(async move {
        lifecycle
            .safe_detach(&instance_id, &volume_id, Some("scenario"))
            .await
    });
    lifecycle_context.detach = Some(outcome);
    Ok(lifecycle_context)
}

#[when("I delete it")]
fn delete(mut lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let runtime = runtime()?;
    let lifecycle = lifecycle_context.lifecycle();
    let volume_id = lifecycle_context.volume_id.clone();
    let result =
        runtime.block_on(async move { lifecycle.safe_delete(&volume_id, Some("scenario")).await });
    lifecycle_context.delete = Some(result);
    Ok(lifecycle_context)
}

#[when("I run the emergency cleanup")]
fn cleanup(mut lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let runtime = runtime()?;
    let lifecycle = lifecycle_context.lifecycle();
    let volume_id = lifecycle_context.volume_id.clone();
    let report = runtime
        .block_on(async move { lifecycle.emergency_cleanup(&volume_id, Some("scenario")).await });
    lifecycle_context.cleanup = Some(report);
    Ok(lifecycle_context)
}

fn parse_detach_outcome(expected: &str) -> Result<DetachOutcome, StepError> {
    match expected {
        "already-detached" => Ok(DetachOutcome::AlreadyDetached),
        "gone" => Ok(DetachOutcome::VolumeGone),
        "exhausted" => Ok(DetachOutcome::Exhausted),
        tier => DetachTier::LADDER
            .into_iter()
            .find(|candidate| candidate.name() == tier)
            .map(|found| DetachOutcome::Detached { tier: found })
            .ok_or_else(|| StepError::Assertion(format!("unknown detach outcome '{tier}'"))),
    }
}

#[then("the detach outcome is \"{expected}\"")]
fn detach_outcome_is(lifecycle_context: &LifecycleContext, expected: String) -> Result<(), StepError> {
    let wanted = parse_detach_outcome(&expected)?;
    match &lifecycle_context.detach {
        Some(outcome) if *outcome == wanted => Ok(()),
        Some(outcome) => Err(StepError::Assertion(format!(
            "expected {wanted:?}, got {outcome:?}"
        ))),
        None => Err(StepError::Assertion(String::from("missing detach outcome"))),
    }
}

#[then("no mutating call was sent")]
fn no_mutations(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let mutations: Vec<Operation> = lifecycle_context
        .api
        .operations()
        .into_iter()
        .filter(|operation| operation.is_mutation())
        .collect();
    if mutations.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected read-only calls, saw {mutations:?}"
        )))
    }
}

#[then("the volume reads back as available")]
fn reads_back_available(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    match lifecycle_context.api.volume() {
        Some(volume) if volume.status == VolumeStatus::Available && volume.attachments.is_empty() => {
            Ok(())
        }
        other => Err(StepError::Assertion(format!(
            "expected an available volume, got {other:?}"
        ))),
    }
}

#[then("the delete is confirmed after \"{polls}\" polls")]
fn delete_confirmed(lifecycle_context: &LifecycleContext, polls: u32) -> Result<(), StepError> {
    match &lifecycle_context.delete {
        Some(Ok(report)) if report.outcome == DeleteOutcome::Confirmed && report.polls == polls => {
            Ok(())
        }
        Some(Ok(report)) => Err(StepError::Assertion(format!(
            "expected confirmation after {polls} polls, got {:?} after {}",
            report.outcome, report.polls
        ))),
        Some(Err(err)) => Err(StepError::Assertion(format!("delete failed: {err}"))),
        None => Err(StepError::Assertion(String::from("missing delete result"))),
    }
}

#[then("the report lists \"{count}\" snapshots")]
fn report_lists_snapshots(lifecycle_context: &LifecycleContext, count: usize) -> Result<(), StepError> {
    let Some(Ok(report)) = &lifecycle_context.delete else {
        return Err(StepError::Assertion(String::from(
            "expected a delete report",
        )));
    };
    if report.snapshots.len() == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} snapshots, got {}",
            report.snapshots.len()
        )))
    }
}

#[then("the delete is refused because the volume is in use")]
fn delete_refused(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    match &lifecycle_context.delete {
        Some(Err(LifecycleError::VolumeInUse { .. })) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected VolumeInUse, got {other:?}"
        ))),
    }
}

#[then("no delete request was sent")]
fn no_delete_sent(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    if lifecycle_context.api.count(Operation::DeleteVolume) == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "delete must not be issued for an attached volume",
        )))
    }
}

#[then("the volume is restored")]
fn volume_restored(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    match &lifecycle_context.cleanup {
        Some(report) if report.outcome == CleanupOutcome::Restored => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected a restored volume, got {other:?}"
        ))),
    }
}
