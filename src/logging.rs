use crate::error::{Result, SimError};
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber. Logs go to stderr; stdout carries the snapshot.
///
/// An unparsable `level` falls back to `info`.
pub fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| SimError::Internal(format!("tracing already initialised: {e}")))
}
