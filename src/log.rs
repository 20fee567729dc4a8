//! Structured logging bootstrap, standing in for the teacher's
//! `bevy_log` plugin init (which itself wraps `tracing`).

use tracing_subscriber::{EnvFilter, fmt};

/// Install a global `tracing` subscriber reading its filter from
/// `RUST_LOG` (default: `info`). Safe to call more than once; subsequent
/// calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
