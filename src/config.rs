use std::time::Duration;

pub const DEFAULT_STEP_DELAY_MS: u64 = 500;
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 5000;

/// Settings the simulator core is built with. Loading them is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// Wait before each status transition step.
    pub step_delay: Duration,
    /// Capacity of the notification queue.
    pub queue_capacity: usize,
    /// Number of notification delivery workers.
    pub workers: usize,
    /// Timeout of one outbound delivery call.
    pub delivery_timeout: Duration,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            step_delay: Duration::from_millis(DEFAULT_STEP_DELAY_MS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            workers: DEFAULT_WORKERS,
            delivery_timeout: Duration::from_millis(DEFAULT_DELIVERY_TIMEOUT_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_service_settings() {
        let config = SimulatorConfig::default();
        assert_eq!(config.step_delay, Duration::from_millis(500));
        assert_eq!(config.queue_capacity, 1000);
        assert_eq!(config.workers, 4);
        assert_eq!(config.delivery_timeout, Duration::from_secs(5));
    }
}
