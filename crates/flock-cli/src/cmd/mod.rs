//! Command handlers for the `flock` binary.

pub mod doctor;
pub mod fetch;
pub mod list;

use crate::output::{self, CliError, OutputMode};
use flock_core::error::FetchError;

/// Render a fetch failure and convert it into a command error.
pub fn fetch_failure(mode: OutputMode, err: &FetchError) -> anyhow::Error {
    let cli_error = CliError::from_code(err.error_code(), err.to_string());
    // Best-effort: the original error still reaches the exit path.
    let _ = output::render_error(mode, &cli_error);
    anyhow::anyhow!("fetch failed: {err}")
}
