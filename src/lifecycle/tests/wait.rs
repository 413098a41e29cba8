//! Tests for the status probe and the convergence waiter.

use std::time::Duration;

use tokio::time::Instant;

use super::{lifecycle, transport, volume_id};
use crate::lifecycle::{ProbeResult, WaitOutcome};
use crate::test_support::{Operation, ScriptedVolumeApi, attached_volume, available_volume};
use crate::volume::VolumeState;

#[tokio::test(start_paused = true)]
async fn probe_reports_observed_state() {
    let api = ScriptedVolumeApi::with_volume(attached_volume("vol-1", &["srv-1"]));
    let probe = lifecycle(&api).check_status(&volume_id("vol-1")).await;
    let state = probe.state().unwrap_or_else(|| panic!("expected observed state, got {probe:?}"));
    assert_eq!(state.attachments.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn probe_reports_gone_on_not_found() {
    let api = ScriptedVolumeApi::empty();
    let probe = lifecycle(&api).check_status(&volume_id("vol-1")).await;
    assert_eq!(probe, ProbeResult::Gone);
}

#[tokio::test(start_paused = true)]
async fn probe_absorbs_transport_failures() {
    let api = ScriptedVolumeApi::with_volume(available_volume("vol-1"));
    api.fail_next(Operation::GetVolume, transport());
    let probe = lifecycle(&api).check_status(&volume_id("vol-1")).await;
    assert_eq!(probe, ProbeResult::Unavailable);
}

#[tokio::test(start_paused = true)]
async fn wait_returns_immediately_when_predicate_holds() {
    let api = ScriptedVolumeApi::with_volume(available_volume("vol-1"));
    let started = Instant::now();
    let outcome = lifecycle(&api)
        .wait_until(&volume_id("vol-1"), VolumeState::is_detached, Duration::from_secs(20))
        .await;
    assert_eq!(outcome, WaitOutcome::Satisfied);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(api.count(Operation::GetVolume), 1);
}

#[tokio::test(start_paused = true)]
async fn wait_times_out_without_overrunning_budget() {
    let api = ScriptedVolumeApi::with_volume(attached_volume("vol-1", &["srv-1"]));
    let manager = lifecycle(&api);
    let budget = Duration::from_secs(20);
    let started = Instant::now();

    let outcome = manager
        .wait_until(&volume_id("vol-1"), VolumeState::is_detached, budget)
        .await;

    let elapsed = started.elapsed();
    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert!(elapsed >= budget, "waited only {elapsed:?}");
    assert!(
        elapsed <= budget + manager.timings().poll_interval,
        "overran budget: {elapsed:?}"
    );
    // One read at start plus one per 2s interval.
    assert_eq!(api.count(Operation::GetVolume), 11);
}

#[tokio::test(start_paused = true)]
async fn wait_clips_final_sleep_to_deadline() {
    let api = ScriptedVolumeApi::with_volume(attached_volume("vol-1", &["srv-1"]));
    let started = Instant::now();
    let outcome = lifecycle(&api)
        .wait_until(
            &volume_id("vol-1"),
            VolumeState::is_detached,
            Duration::from_secs(5),
        )
        .await;
    assert_eq!(outcome, WaitOutcome::TimedOut);
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn wait_keeps_polling_through_unreadable_states() {
    let api = ScriptedVolumeApi::with_volume(available_volume("vol-1"));
    api.fail_next(Operation::GetVolume, transport());
    api.fail_next(Operation::GetVolume, transport());
    let outcome = lifecycle(&api)
        .wait_until(&volume_id("vol-1"), VolumeState::is_detached, Duration::from_secs(20))
        .await;
    assert!(outcome.is_satisfied());
    assert_eq!(api.count(Operation::GetVolume), 3);
}

#[tokio::test(start_paused = true)]
async fn wait_stops_when_volume_disappears() {
    let api = ScriptedVolumeApi::empty();
    let outcome = lifecycle(&api)
        .wait_until(&volume_id("vol-1"), VolumeState::is_detached, Duration::from_secs(20))
        .await;
    assert_eq!(outcome, WaitOutcome::Gone);
    assert!(!outcome.is_satisfied());
}
