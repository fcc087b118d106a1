//! Shared output layer for pretty/text/JSON parity across CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: pretty output for humans, compact text for pipes, or
//! stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--json` flag
//! 2. `FLOCK_FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-optimized output (labels, visual framing).
    Pretty,
    /// Token-efficient plain text for pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    json_flag: bool,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {} // unknown value — fall through to TTY detection
        }
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from the `--json` flag, environment, and TTY
/// defaults.
pub fn resolve_output_mode(json_flag: bool) -> OutputMode {
    let env_val = std::env::var("FLOCK_FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(json_flag, env_val.as_deref(), is_tty)
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode, the value is serialized with `serde_json`. In
/// pretty/text mode, the provided `human_fn` closure produces the output.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            human_fn(value, &mut out)?;
        }
    }
    Ok(())
}

/// A structured error with optional hint and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional hint for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Machine-readable error code (e.g. "E2001").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create an error carrying a stable [`ErrorCode`] with its hint.
    ///
    /// [`ErrorCode`]: flock_core::error::ErrorCode
    pub fn from_code(code: flock_core::error::ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            message: format!("{}: {}", code.message(), detail.into()),
            hint: code.hint().map(String::from),
            error_code: Some(code.code().to_string()),
        }
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({ "error": error });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            writeln!(out, "error: {}", error.message)?;
            if let Some(ref hint) = error.hint {
                writeln!(out, "  hint: {hint}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::error::ErrorCode;

    #[test]
    fn json_flag_wins_over_env() {
        let mode = resolve_output_mode_inner(true, Some("pretty"), true);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn format_env_json() {
        let mode = resolve_output_mode_inner(false, Some("json"), false);
        assert_eq!(mode, OutputMode::Json);
    }

    #[test]
    fn format_env_pretty_forces_pretty_without_tty() {
        let mode = resolve_output_mode_inner(false, Some("pretty"), false);
        assert_eq!(mode, OutputMode::Pretty);
    }

    #[test]
    fn format_env_case_insensitive() {
        let mode = resolve_output_mode_inner(false, Some("TEXT"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn unknown_env_falls_through_to_tty() {
        assert_eq!(
            resolve_output_mode_inner(false, Some("fancy"), true),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(false, Some("fancy"), false),
            OutputMode::Text
        );
    }

    #[test]
    fn default_tty_is_pretty_piped_is_text() {
        assert_eq!(resolve_output_mode_inner(false, None, true), OutputMode::Pretty);
        assert_eq!(resolve_output_mode_inner(false, None, false), OutputMode::Text);
    }

    #[test]
    fn cli_error_carries_code_and_hint() {
        let err = CliError::from_code(ErrorCode::FetchFailed, "connection refused");
        assert!(err.message.contains("connection refused"));
        assert_eq!(err.error_code.as_deref(), Some("E2001"));
        assert!(err.hint.is_some());
    }

    #[test]
    fn render_json_output_does_not_panic() {
        #[derive(Serialize)]
        struct TestData {
            name: String,
        }
        let data = TestData { name: "test".into() };
        assert!(render(OutputMode::Json, &data, |_, _| Ok(())).is_ok());
    }

    #[test]
    fn render_human_output_uses_closure() {
        #[derive(Serialize)]
        struct TestData {
            count: u32,
        }
        let data = TestData { count: 3 };
        let result = render(OutputMode::Pretty, &data, |d, w| writeln!(w, "count: {}", d.count));
        assert!(result.is_ok());
    }
}
