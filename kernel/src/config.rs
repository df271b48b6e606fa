use std::time::Duration;

use vodca::References;

#[derive(Debug, Clone, Eq, PartialEq, References)]
pub struct LendingConfig {
    max_attempts: u32,
    retry_delay: Duration,
}

impl LendingConfig {
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    /// Linear back-off before the given (1-based) retry.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_millis(10),
        }
    }
}

pub trait DependOnLendingConfig: 'static + Sync + Send {
    fn lending_config(&self) -> &LendingConfig;
}
