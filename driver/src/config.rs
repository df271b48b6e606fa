use std::time::Duration;

use kernel::interface::config::LendingConfig;
use kernel::KernelError;

use crate::env_or;

static LENDING_MAX_ATTEMPTS: &str = "LENDING_MAX_ATTEMPTS";
static LENDING_RETRY_DELAY_MS: &str = "LENDING_RETRY_DELAY_MS";
static LOCK_TIMEOUT_MS: &str = "POSTGRES_LOCK_TIMEOUT_MS";
static SERVER_PORT: &str = "SERVER_PORT";

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads the retry policy from the environment, falling back to defaults.
pub fn lending_config() -> error_stack::Result<LendingConfig, KernelError> {
    let default = LendingConfig::default();
    let max_attempts = env_or(LENDING_MAX_ATTEMPTS, *default.max_attempts())?;
    let delay = env_or(
        LENDING_RETRY_DELAY_MS,
        u64::try_from(default.retry_delay().as_millis()).unwrap_or(u64::MAX),
    )?;
    Ok(LendingConfig::new(
        max_attempts,
        Duration::from_millis(delay),
    ))
}

/// How long a unit of work may wait for an item lock before giving up.
pub fn lock_timeout() -> error_stack::Result<Duration, KernelError> {
    let millis = env_or(
        LOCK_TIMEOUT_MS,
        u64::try_from(DEFAULT_LOCK_TIMEOUT.as_millis()).unwrap_or(u64::MAX),
    )?;
    Ok(Duration::from_millis(millis))
}

pub fn server_port() -> error_stack::Result<u16, KernelError> {
    env_or(SERVER_PORT, 8080)
}
