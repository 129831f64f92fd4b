use std::time::Duration;

/// Pause before each automated move request so engine-vs-engine games stay
/// legible and cannot turn into a request storm.
pub const DEFAULT_AUTOMATED_MOVE_DELAY: Duration = Duration::from_millis(250);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_COMMAND_QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub automated_move_delay: Duration,
    pub request_timeout: Duration,
    pub command_queue_depth: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            automated_move_delay: DEFAULT_AUTOMATED_MOVE_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            command_queue_depth: DEFAULT_COMMAND_QUEUE_DEPTH,
        }
    }
}

impl DriverConfig {
    pub fn with_automated_move_delay(mut self, delay: Duration) -> Self {
        self.automated_move_delay = delay;
        self
    }
}
