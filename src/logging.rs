//! Logging setup
//!
//! Console logging through `tracing-subscriber`. `RUST_LOG` takes
//! precedence; otherwise the `-v` count picks the level.

use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Filter directive for a verbosity count.
#[must_use]
pub const fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global console subscriber.
///
/// # Errors
///
/// Returns [`Error::Other`] if a global subscriber is already installed.
pub fn init_logging(verbose: u8) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to initialise logging: {e}")))
}
