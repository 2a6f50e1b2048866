//! Map validated CLI arguments to the action the binary runs.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, backend, flows};
use anyhow::Result;

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

    let backend = backend::Options::parse(matches)?;
    let flows = flows::Options::parse(matches)?.into_config();

    Ok(Action::Server(Args {
        port,
        backend,
        flows,
    }))
}
