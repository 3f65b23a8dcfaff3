use clap::Parser;
use miette::{IntoDiagnostic, Result};
use payments_sim::application::simulator::Simulator;
use payments_sim::config::{self, SimulatorConfig};
use payments_sim::interfaces::json::command_reader::CommandReader;
use payments_sim::interfaces::json::snapshot_writer::SnapshotWriter;
use payments_sim::logging::init_tracing;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Scenario file with one JSON command per line
    input: PathBuf,

    /// Wait before each status transition step, in milliseconds
    #[arg(long, env = "LIFECYCLE_STEP_DELAY_MS", default_value_t = config::DEFAULT_STEP_DELAY_MS)]
    step_delay_ms: u64,

    /// Capacity of the notification queue
    #[arg(long, env = "WEBHOOK_BUFFER_SIZE", default_value_t = config::DEFAULT_QUEUE_CAPACITY)]
    webhook_buffer_size: usize,

    /// Number of notification delivery workers
    #[arg(long, env = "WEBHOOK_WORKERS", default_value_t = config::DEFAULT_WORKERS)]
    webhook_workers: usize,

    /// Timeout of one callback delivery, in milliseconds
    #[arg(long, env = "WEBHOOK_TIMEOUT_MS", default_value_t = config::DEFAULT_DELIVERY_TIMEOUT_MS)]
    webhook_timeout_ms: u64,

    /// Tracing filter directive, e.g. `info` or `payments_sim=debug`
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> SimulatorConfig {
        SimulatorConfig {
            step_delay: Duration::from_millis(self.step_delay_ms),
            queue_capacity: self.webhook_buffer_size,
            workers: self.webhook_workers,
            delivery_timeout: Duration::from_millis(self.webhook_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level).into_diagnostic()?;

    let simulator = Simulator::with_http_delivery(&cli.config()).into_diagnostic()?;

    // Apply the scenario; a failing line is logged and skipped
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(BufReader::new(file));
    for (line, command) in reader.commands() {
        match command {
            Ok(command) => {
                let op = command.op();
                if let Err(e) = simulator.execute(command).await {
                    warn!(line, op, error = %e, "command failed");
                }
            }
            Err(e) => {
                warn!(line, error = %e, "unreadable command");
            }
        }
    }

    let outcomes = simulator.shutdown().await.into_diagnostic()?;
    let stats = simulator.dispatch_stats();
    info!(
        settled_transitions = outcomes.len(),
        enqueued = stats.enqueued,
        dropped = stats.dropped,
        delivered = stats.delivered,
        failed = stats.failed,
        "simulation finished"
    );

    let snapshot = simulator.snapshot().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = SnapshotWriter::new(stdout.lock());
    writer.write_snapshot(&snapshot).into_diagnostic()?;

    Ok(())
}
