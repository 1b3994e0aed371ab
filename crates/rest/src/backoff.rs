// SPDX-License-Identifier: MIT

use std::time::Duration;

/// Backoff schedule for a transient failure (5xx status or transport
/// error): retried forever. `attempt` is the control plane's own attempt
/// counter (the initial try is attempt 1); attempts 2..=10 sleep 2s,
/// 11..=50 sleep 5s, everything after settles at 10s.
pub fn transient_delay(attempt: u32) -> Duration {
    match attempt {
        0..=10 => Duration::from_secs(2),
        11..=50 => Duration::from_secs(5),
        _ => Duration::from_secs(10),
    }
}

/// Backoff schedule for a client error (any other non-2xx status):
/// `attempt * 10s`, surfaced to the caller once `attempt` exceeds
/// [`CLIENT_ERROR_MAX_ATTEMPTS`].
pub const CLIENT_ERROR_MAX_ATTEMPTS: u32 = 5;

pub fn client_error_delay(attempt: u32) -> Duration {
    Duration::from_secs(10 * attempt as u64)
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
