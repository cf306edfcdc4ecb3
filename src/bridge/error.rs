//! Bridge error types.

use std::time::Duration;

/// Errors raised by the bridge and codec.
///
/// Every invocation is categorically fallible; callers must handle these the
/// way they would network failures.
#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    /// The configured command vector was empty.
    #[error("cli command cannot be empty")]
    EmptyCommand,

    /// An encoding other than UTF-8 was requested.
    #[error("unsupported encoding '{0}' (only utf-8 is supported)")]
    UnsupportedEncoding(String),

    /// The request carried no messages to send.
    #[error("no prompt or messages provided")]
    EmptyRequest,

    /// A generation option had an unusable value.
    #[error("invalid generation option '{key}': {value}")]
    InvalidOption {
        /// Option key.
        key: String,
        /// Offending value, rendered as JSON text.
        value: String,
    },

    /// The target executable could not be located.
    #[error("CLI command not found: {command}")]
    NotFound {
        /// Shell-escaped command line.
        command: String,
    },

    /// The process exceeded its deadline and was killed.
    #[error(
        "CLI command '{command}' timed out after {} seconds\n{}",
        .timeout.as_secs_f64(),
        render_streams(.stdout, .stderr)
    )]
    Timeout {
        /// Shell-escaped command line.
        command: String,
        /// The configured deadline.
        timeout: Duration,
        /// Partial stdout captured before the kill.
        stdout: String,
        /// Partial stderr captured before the kill.
        stderr: String,
    },

    /// The process exited with a non-zero status.
    #[error(
        "CLI command '{command}' exited with status {code}\n{}",
        render_streams(.stdout, .stderr)
    )]
    ExitStatus {
        /// Shell-escaped command line.
        command: String,
        /// Exit code; -1 when the process died to a signal.
        code: i32,
        /// Full captured stdout.
        stdout: String,
        /// Full captured stderr.
        stderr: String,
    },

    /// Stdout could not be interpreted under the required output dialect.
    #[error("failed to decode CLI output: {reason}\nstdout:\n{stdout}")]
    Decode {
        /// What went wrong.
        reason: String,
        /// The offending stdout, verbatim.
        stdout: String,
    },

    /// Other I/O failure while driving the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Render captured streams for diagnostics. An empty stream is marked
/// explicitly so it can never be confused with missing capture.
fn render_streams(stdout: &str, stderr: &str) -> String {
    format!("{}\n{}", render_block("stdout", stdout), render_block("stderr", stderr))
}

fn render_block(label: &str, text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        format!("{label}: <empty>")
    } else {
        format!("{label}:\n{trimmed}")
    }
}
