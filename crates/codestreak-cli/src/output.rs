//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly. Results go to stdout, errors to stderr.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--json` flag
//! 2. `output = "json"` in the user config
//! 3. Default: [`OutputMode::Human`]

use codestreak_core::{ErrorCode, TrackerError};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// Shared width for human separators.
pub const RULE_WIDTH: usize = 60;

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<16} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Resolve the output mode from the `--json` flag and the user config.
pub fn resolve_output_mode(json_flag: bool, configured: Option<&str>) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }
    match configured.map(str::to_ascii_lowercase).as_deref() {
        Some("json") => OutputMode::Json,
        _ => OutputMode::Human,
    }
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (`E####`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Error for a failure that has a code but no [`TrackerError`] behind it.
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(code.hint().unwrap_or(code.message()).to_string()),
            error_code: Some(code.code().to_string()),
        }
    }
}

impl From<&TrackerError> for CliError {
    fn from(err: &TrackerError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: Some(err.suggestion()),
            error_code: Some(err.code().code().to_string()),
        }
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode the value is serialized with `serde_json`; otherwise
/// `human_fn` writes the text form.
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
        OutputMode::Human => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(suggestion) = &error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Context marker for failures already written to stderr.
#[derive(Debug, Clone, Copy)]
pub struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("error already reported")
    }
}

/// Render a core error and turn it into the command's failure.
pub fn fail(mode: OutputMode, err: TrackerError) -> anyhow::Error {
    if let Err(render_err) = render_error(mode, &CliError::from(&err)) {
        return render_err;
    }
    anyhow::Error::new(err).context(Reported)
}

/// Render a coded error that has no [`TrackerError`] behind it.
pub fn fail_with(mode: OutputMode, code: ErrorCode, message: impl Into<String>) -> anyhow::Error {
    let error = CliError::from_code(code, message);
    if let Err(render_err) = render_error(mode, &error) {
        return render_err;
    }
    anyhow::anyhow!("{}", error.message).context(Reported)
}

/// Render an uncoded error with a remediation hint.
pub fn fail_plain(
    mode: OutputMode,
    message: impl Into<String>,
    suggestion: impl Into<String>,
) -> anyhow::Error {
    let error = CliError {
        message: message.into(),
        suggestion: Some(suggestion.into()),
        error_code: None,
    };
    if let Err(render_err) = render_error(mode, &error) {
        return render_err;
    }
    anyhow::anyhow!("{}", error.message).context(Reported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_wins_over_config() {
        assert_eq!(resolve_output_mode(true, Some("human")), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("JSON")), OutputMode::Json);
        assert_eq!(resolve_output_mode(false, Some("fancy")), OutputMode::Human);
        assert_eq!(resolve_output_mode(false, None), OutputMode::Human);
    }

    #[test]
    fn tracker_errors_carry_code_and_suggestion() {
        let err = TrackerError::UnknownProblem("two-sum".into());
        let cli = CliError::from(&err);
        assert_eq!(cli.message, "unknown problem two-sum");
        assert_eq!(cli.error_code.as_deref(), Some("E2002"));
        assert_eq!(
            cli.suggestion.as_deref(),
            Some("Check the problem id against the catalog.")
        );
    }

    #[test]
    fn coded_errors_fall_back_to_the_short_message() {
        let cli = CliError::from_code(ErrorCode::UserNotFound, "user bob not found");
        assert_eq!(cli.suggestion.as_deref(), Some("User not found"));
        assert_eq!(cli.error_code.as_deref(), Some("E2003"));
    }

    #[test]
    fn error_json_shape_is_stable() {
        let cli = CliError::from_code(ErrorCode::Unauthenticated, "no user");
        let json = serde_json::to_value(serde_json::json!({ "error": cli })).expect("json");
        assert_eq!(json["error"]["error_code"], "E1003");
        assert_eq!(json["error"]["message"], "no user");
        assert!(json["error"]["suggestion"].is_string());
    }
}
