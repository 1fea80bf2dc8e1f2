use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::error::{ControllerError, DispatchError};

/// Attempts allowed for an action that keeps reporting conflicts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Pause between two attempts, in microseconds.
pub const DEFAULT_RETRY_DELAY_US: u64 = 100;

/// Bounded retry loop for actions that signal [`ControllerError::Conflict`].
///
/// Fixed attempt ceiling and a fixed pause between attempts. There is no backoff and no
/// jitter: conflicts are expected to be rare and to clear quickly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_us: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_us: DEFAULT_RETRY_DELAY_US,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_us: u64) -> Self {
        Self {
            max_attempts,
            delay_us,
        }
    }

    #[inline]
    pub fn delay(&self) -> Duration {
        Duration::from_micros(self.delay_us)
    }

    /// Call `attempt` until it returns something other than a conflict.
    ///
    /// The closure receives the 1-based attempt number. Errors other than
    /// [`ControllerError::Conflict`] are returned immediately. After `max_attempts` conflicts
    /// the loop gives up with [`DispatchError::RetriesExhausted`]. A zero ceiling still makes
    /// one attempt.
    pub fn run<T, F>(&self, mut attempt: F) -> Result<T, DispatchError>
    where
        F: FnMut(u32) -> Result<T, ControllerError>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut n = 1;
        loop {
            match attempt(n) {
                Err(ControllerError::Conflict(reason)) => {
                    if n >= max_attempts {
                        error!(
                            attempts = n,
                            reason = %reason,
                            "Transaction conflict persisted, giving up"
                        );
                        return Err(DispatchError::RetriesExhausted { attempts: n });
                    }
                    info!(attempt = n, reason = %reason, "Retrying transaction");
                    if self.delay_us > 0 {
                        thread::sleep(self.delay());
                    }
                    n += 1;
                }
                other => return other.map_err(DispatchError::from),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_delay(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, 0)
    }

    #[test]
    fn test_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 20);
        assert_eq!(policy.delay(), Duration::from_micros(100));
    }

    #[test]
    fn test_success_after_conflicts() {
        let mut calls = 0;
        let result = no_delay(20).run(|n| {
            calls += 1;
            if n <= 3 {
                Err(ControllerError::conflict("row locked"))
            } else {
                Ok(n)
            }
        });
        assert_eq!(result.unwrap(), 4);
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_exhaustion() {
        let mut calls = 0;
        let result: Result<(), _> = no_delay(20).run(|_| {
            calls += 1;
            Err(ControllerError::conflict("row locked"))
        });
        assert!(matches!(
            result,
            Err(DispatchError::RetriesExhausted { attempts: 20 })
        ));
        assert_eq!(calls, 20);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<(), _> = no_delay(20).run(|_| {
            calls += 1;
            Err(ControllerError::failure("boom"))
        });
        assert_eq!(calls, 1);
        assert_eq!(result.unwrap_err().to_string(), "boom");
    }

    #[test]
    fn test_zero_ceiling_still_attempts_once() {
        let mut calls = 0;
        let result: Result<(), _> = no_delay(0).run(|_| {
            calls += 1;
            Err(ControllerError::conflict("x"))
        });
        assert_eq!(calls, 1);
        assert!(matches!(
            result,
            Err(DispatchError::RetriesExhausted { attempts: 1 })
        ));
    }

    #[test]
    fn test_deserialize_partial() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"max_attempts": 3}"#).unwrap();
        assert_eq!(policy, RetryPolicy::new(3, DEFAULT_RETRY_DELAY_US));
    }
}
