//! Command-line interface definitions for the `blockwarden` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `blockwarden` binary.
#[derive(Debug, Parser)]
#[command(
    name = "blockwarden",
    about = "Detach, delete, and repair OpenStack block-storage volumes safely",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Print the current status of a volume.
    #[command(name = "status", about = "Print the current status of a volume")]
    Status(StatusCommand),
    /// Detach a volume from an instance, escalating until it converges.
    #[command(
        name = "detach",
        about = "Detach a volume from an instance, escalating until it converges"
    )]
    Detach(DetachCommand),
    /// Delete a detached volume and confirm it disappears.
    #[command(name = "delete", about = "Delete a detached volume and confirm it disappears")]
    Delete(DeleteCommand),
    /// Strip every attachment and reset a stuck volume to available.
    #[command(
        name = "cleanup",
        about = "Strip every attachment and reset a stuck volume to available"
    )]
    Cleanup(CleanupCommand),
}

/// Arguments for the `blockwarden status` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct StatusCommand {
    /// Volume identifier.
    #[arg(value_name = "VOLUME")]
    pub(crate) volume: String,
}

/// Arguments for the `blockwarden detach` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DetachCommand {
    /// Instance the volume is attached to.
    #[arg(value_name = "INSTANCE")]
    pub(crate) instance: String,
    /// Volume identifier.
    #[arg(value_name = "VOLUME")]
    pub(crate) volume: String,
    /// Human-readable name used in log output.
    #[arg(long, value_name = "LABEL")]
    pub(crate) label: Option<String>,
}

/// Arguments for the `blockwarden delete` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct DeleteCommand {
    /// Volume identifier.
    #[arg(value_name = "VOLUME")]
    pub(crate) volume: String,
    /// Human-readable name used in log output.
    #[arg(long, value_name = "LABEL")]
    pub(crate) label: Option<String>,
    /// Detach the volume from this instance before deleting it.
    ///
    /// The delete is skipped when the detach does not succeed.
    #[arg(long, value_name = "INSTANCE")]
    pub(crate) detach_first: Option<String>,
    /// Refuse to delete when snapshots still reference the volume.
    #[arg(long)]
    pub(crate) refuse_with_snapshots: bool,
}

/// Arguments for the `blockwarden cleanup` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct CleanupCommand {
    /// Volume identifier.
    #[arg(value_name = "VOLUME")]
    pub(crate) volume: String,
    /// Human-readable name used in log output.
    #[arg(long, value_name = "LABEL")]
    pub(crate) label: Option<String>,
}
