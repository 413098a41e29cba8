//! Build script that renders the `blockwarden(1)` manual page.
//!
//! The clap definitions in `src/cli/mod.rs` are the single source for the
//! `status`, `detach`, `delete`, and `cleanup` subcommands, so the page is
//! regenerated from them into `OUT_DIR` whenever they change.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir =
        PathBuf::from(env::var_os("OUT_DIR").ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR was not set")
        })?);

    let mut page = Vec::new();
    Man::new(Cli::command()).render(&mut page)?;

    let mut file = File::create(out_dir.join("blockwarden.1"))?;
    file.write_all(&page)?;

    Ok(())
}
