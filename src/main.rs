//! Binary entry point for the `blockwarden` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use blockwarden::{
    CleanupOutcome, CleanupReport, CloudConfig, ConfigError, DeleteOutcome, DeleteReport,
    DetachOutcome, InstanceId, LifecycleError, OpenStackClient, OpenStackError, ProbeResult,
    SnapshotDecision, VolumeId, VolumeLifecycle,
};

mod cli;

use cli::{CleanupCommand, Cli, DeleteCommand, DetachCommand, StatusCommand};

const DEFAULT_LOG_FILTER: &str = "blockwarden=info";

/// Exit code for a detach that ran every tier without converging.
const EXIT_EXHAUSTED: i32 = 2;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("connection failed: {0}")]
    Connect(#[from] OpenStackError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error("status of volume {0} could not be read")]
    StatusUnavailable(VolumeId),
}

type Lifecycle = VolumeLifecycle<OpenStackClient>;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn connect() -> Result<Lifecycle, CliError> {
    let config = CloudConfig::load_without_cli_args()?;
    let client = OpenStackClient::connect(&config).await?;
    Ok(VolumeLifecycle::new(client, config.timings()))
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let lifecycle = connect().await?;
    match cli {
        Cli::Status(command) => exec_status(&lifecycle, command).await,
        Cli::Detach(command) => Ok(exec_detach(&lifecycle, command).await),
        Cli::Delete(command) => exec_delete(&lifecycle, command).await,
        Cli::Cleanup(command) => Ok(exec_cleanup(&lifecycle, command).await),
    }
}

async fn exec_status(lifecycle: &Lifecycle, command: StatusCommand) -> Result<i32, CliError> {
    let volume_id = VolumeId::new(command.volume);
    let probe = lifecycle.check_status(&volume_id).await;
    if probe == ProbeResult::Unavailable {
        return Err(CliError::StatusUnavailable(volume_id));
    }
    write_status(io::stdout(), &volume_id, &probe);
    Ok(i32::from(probe == ProbeResult::Gone))
}

async fn exec_detach(lifecycle: &Lifecycle, command: DetachCommand) -> i32 {
    let instance_id = InstanceId::new(command.instance);
    let volume_id = VolumeId::new(command.volume);
    let outcome = lifecycle
        .safe_detach(&instance_id, &volume_id, command.label.as_deref())
        .await;
    write_detach(io::stdout(), &volume_id, &outcome);
    detach_exit_code(&outcome)
}

async fn exec_delete(lifecycle: &Lifecycle, command: DeleteCommand) -> Result<i32, CliError> {
    let volume_id = VolumeId::new(command.volume);
    let label = command.label.as_deref();

    if let Some(instance) = command.detach_first {
        let instance_id = InstanceId::new(instance);
        let outcome = lifecycle.safe_detach(&instance_id, &volume_id, label).await;
        write_detach(io::stdout(), &volume_id, &outcome);
        if !outcome.is_success() {
            return Ok(detach_exit_code(&outcome));
        }
    }

    let refuse = command.refuse_with_snapshots;
    let report = lifecycle
        .safe_delete_with(&volume_id, label, |snapshots| {
            snapshot_decision(refuse, snapshots.len())
        })
        .await?;
    write_delete(io::stdout(), &report);
    Ok(i32::from(!report.outcome.is_success()))
}

async fn exec_cleanup(lifecycle: &Lifecycle, command: CleanupCommand) -> i32 {
    let volume_id = VolumeId::new(command.volume);
    let report = lifecycle
        .emergency_cleanup(&volume_id, command.label.as_deref())
        .await;
    write_cleanup(io::stdout(), &report);
    cleanup_exit_code(&report.outcome)
}

const fn snapshot_decision(refuse: bool, snapshot_count: usize) -> SnapshotDecision {
    if refuse && snapshot_count > 0 {
        SnapshotDecision::Abort
    } else {
        SnapshotDecision::Proceed
    }
}

const fn cleanup_exit_code(outcome: &CleanupOutcome) -> i32 {
    if outcome.is_success() {
        0
    } else {
        1
    }
}

const fn detach_exit_code(outcome: &DetachOutcome) -> i32 {
    match outcome {
        DetachOutcome::AlreadyDetached
        | DetachOutcome::VolumeGone
        | DetachOutcome::Detached { .. } => 0,
        DetachOutcome::PermissionDenied { .. } => 1,
        DetachOutcome::Exhausted => EXIT_EXHAUSTED,
    }
}

fn write_status(mut target: impl Write, volume_id: &VolumeId, probe: &ProbeResult) {
    let Some(state) = probe.state() else {
        writeln!(target, "{volume_id}: not found").ok();
        return;
    };
    writeln!(
        target,
        "{volume_id}: status={} attach_status={} attachments={}",
        state.status,
        state.attach_status.as_str(),
        state.attachments.len()
    )
    .ok();
    for attachment in &state.attachments {
        writeln!(
            target,
            "  server={} attachment={} device={}",
            attachment.server_id,
            attachment.attachment_id,
            attachment.device.as_deref().unwrap_or("-")
        )
        .ok();
    }
}

fn write_detach(mut target: impl Write, volume_id: &VolumeId, outcome: &DetachOutcome) {
    let line = match outcome {
        DetachOutcome::AlreadyDetached => String::from("already detached"),
        DetachOutcome::VolumeGone => String::from("volume no longer exists"),
        DetachOutcome::Detached { tier } => format!("detached by the {tier} tier"),
        DetachOutcome::PermissionDenied { tier, message } => {
            format!("permission denied at the {tier} tier: {message}")
        }
        DetachOutcome::Exhausted => String::from("every detach tier failed to converge"),
    };
    writeln!(target, "{volume_id}: {line}").ok();
}

fn write_delete(mut target: impl Write, report: &DeleteReport) {
    for snapshot in &report.snapshots {
        writeln!(
            target,
            "{}: dependent snapshot {} ({})",
            report.volume_id, snapshot.id, snapshot.status
        )
        .ok();
    }
    let line = match report.outcome {
        DeleteOutcome::Confirmed => format!("deleted (confirmed after {} polls)", report.polls),
        DeleteOutcome::Assumed => format!(
            "delete accepted; not yet observed gone after {} polls",
            report.polls
        ),
        DeleteOutcome::AlreadyGone => String::from("already gone"),
        DeleteOutcome::Declined => String::from("delete declined: dependent snapshots exist"),
    };
    writeln!(target, "{}: {line}", report.volume_id).ok();
}

fn write_cleanup(mut target: impl Write, report: &CleanupReport) {
    let line = match &report.outcome {
        CleanupOutcome::Restored => String::from("restored to available"),
        CleanupOutcome::Partial {
            last_status: Some(status),
        } => format!("partially cleaned; status is {status}"),
        CleanupOutcome::Partial { last_status: None } => {
            String::from("partially cleaned; final status unknown")
        }
    };
    writeln!(
        target,
        "{}: {line} ({} of {} attachment removals failed, reset {})",
        report.volume_id,
        report.removal_failures,
        report.removal_attempts,
        if report.reset_accepted {
            "accepted"
        } else {
            "rejected"
        }
    )
    .ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
