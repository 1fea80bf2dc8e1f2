//! # Runtime Configuration Module
//!
//! Environment overrides applied on top of the file configuration at startup.
//!
//! ## Environment Variables
//!
//! ### `EDGE_DISPATCH_MAX_ATTEMPTS`
//!
//! Total attempts for an action that keeps reporting transaction conflicts.
//!
//! Default: the `retry.max_attempts` value of the configuration file (20 when absent)
//!
//! ### `EDGE_DISPATCH_RETRY_DELAY_US`
//!
//! Pause between two attempts, in microseconds. Accepts decimal (`250`) or hexadecimal
//! (`0xfa`).
//!
//! Default: the `retry.delay_us` value of the configuration file (100 when absent)
//!
//! ## Usage
//!
//! ```rust
//! use edge_router::dispatcher::RetryPolicy;
//! use edge_router::runtime_config::RuntimeConfig;
//!
//! let policy = RuntimeConfig::from_env().apply(RetryPolicy::default());
//! assert!(policy.max_attempts >= 1);
//! ```

use std::env;

use tracing::warn;

use crate::dispatcher::RetryPolicy;

/// Runtime overrides loaded from environment variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub max_attempts: Option<u32>,
    pub retry_delay_us: Option<u64>,
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let max_attempts = lookup("EDGE_DISPATCH_MAX_ATTEMPTS").and_then(|val| {
            match val.trim().parse::<u32>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    warn!(value = %val, "Ignoring invalid EDGE_DISPATCH_MAX_ATTEMPTS");
                    None
                }
            }
        });
        let retry_delay_us = lookup("EDGE_DISPATCH_RETRY_DELAY_US").and_then(|val| {
            let trimmed = val.trim();
            let parsed = match trimmed.strip_prefix("0x") {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => trimmed.parse(),
            };
            parsed
                .map_err(|_| warn!(value = %val, "Ignoring invalid EDGE_DISPATCH_RETRY_DELAY_US"))
                .ok()
        });
        RuntimeConfig {
            max_attempts,
            retry_delay_us,
        }
    }

    /// Overlay the overrides that are set onto `policy`.
    #[must_use]
    pub fn apply(&self, policy: RetryPolicy) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(policy.max_attempts),
            delay_us: self.retry_delay_us.unwrap_or(policy.delay_us),
        }
    }
}
