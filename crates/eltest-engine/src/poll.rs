//! Bounded sleep-then-check polling.

use std::thread;
use std::time::{Duration, Instant};

/// Why a poll loop ended without a value.
#[derive(Debug)]
pub enum PollError<E> {
    /// The deadline passed.
    TimedOut {
        /// Time spent polling.
        elapsed: Duration,
    },
    /// The check itself failed.
    Failed(E),
}

/// Call `check` every `step` until it yields a value or `timeout` passes.
///
/// The first check runs immediately. A timeout is reported no earlier than
/// `timeout` and at most one check after it, since the last sleep is cut
/// short to land on the deadline.
pub fn poll_until<T, E, F>(step: Duration, timeout: Duration, mut check: F) -> Result<T, PollError<E>>
where
    F: FnMut() -> Result<Option<T>, E>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = check().map_err(PollError::Failed)? {
            return Ok(value);
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(PollError::TimedOut { elapsed });
        }
        thread::sleep(step.min(timeout - elapsed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_immediate_success() {
        let result: Result<u32, PollError<()>> =
            poll_until(Duration::from_millis(10), Duration::ZERO, || Ok(Some(7)));
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn test_success_after_some_checks() {
        let mut calls = 0;
        let result: Result<u32, PollError<()>> =
            poll_until(Duration::from_millis(1), Duration::from_secs(1), || {
                calls += 1;
                Ok((calls == 3).then_some(calls))
            });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_timeout_is_not_early() {
        let step = Duration::from_millis(20);
        let timeout = Duration::from_millis(50);
        let start = Instant::now();
        let result: Result<(), PollError<()>> = poll_until(step, timeout, || Ok(None));
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(PollError::TimedOut { elapsed }) if elapsed >= timeout));
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + step + Duration::from_millis(15), "overshoot {:?}", elapsed);
    }

    #[test]
    fn test_check_error_stops_polling() {
        let mut calls = 0;
        let result: Result<(), PollError<&str>> =
            poll_until(Duration::from_millis(1), Duration::from_secs(1), || {
                calls += 1;
                Err("link down")
            });
        assert!(matches!(result, Err(PollError::Failed("link down"))));
        assert_eq!(calls, 1);
    }
}
