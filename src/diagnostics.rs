//! User-facing diagnostics: warnings go through `tracing`, fatal errors are
//! flattened to a single line for the terminal.

use std::fmt::Display;

/// Emit a recoverable problem (the run continues).
pub fn warn(msg: impl Display) {
    tracing::warn!("{}", msg);
}

/// Render an error and its causes as `outer: inner: root`.
pub fn one_line(err: &anyhow::Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}
