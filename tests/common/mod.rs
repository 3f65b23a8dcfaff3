#![allow(dead_code)]

use payments_sim::config::SimulatorConfig;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

pub fn fast_config(step_delay_ms: u64) -> SimulatorConfig {
    SimulatorConfig {
        step_delay: Duration::from_millis(step_delay_ms),
        delivery_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

/// Writes a JSON-lines scenario to a temporary file.
pub fn scenario(lines: &[&str]) -> Result<NamedTempFile, std::io::Error> {
    let mut file = NamedTempFile::new()?;
    for line in lines {
        writeln!(file, "{line}")?;
    }
    file.flush()?;
    Ok(file)
}
