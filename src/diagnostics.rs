//! Message helpers shared by the library and the CLI.
//!
//! Errors are returned, never printed here; `error_message` only logs the
//! line so it also shows up in traces. Warnings never stop processing.

use tracing::{error, warn as trace_warn};

/// Log an error line and hand it back for use in an error value.
pub fn error_message(msg: impl Into<String>) -> String {
    let msg = msg.into();
    error!(target: "mapmemory", "{}", msg);
    msg
}

/// Report a recoverable oddity in the input.
pub fn warn(msg: impl Into<String>) {
    let msg = msg.into();
    trace_warn!(target: "mapmemory", "{}", msg);
}
