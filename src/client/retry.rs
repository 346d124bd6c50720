use std::time::Duration;

use log::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::ConnectorError;

/// Bounded retry budget for order pickup: one initial attempt plus
/// `max_retries` retries, with a fixed delay between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

/// Polls `poll` until it yields a value or the retry budget is exhausted.
///
/// The closure returns:
/// - `Ok(Some(value))` when the awaited state was reached (terminal success)
/// - `Ok(None)` when the state is not ready yet (retry after the delay)
/// - `Err(_)` for failures that should abort polling immediately
///
/// Returns `Ok(None)` on exhaustion; the caller decides how to report it. The
/// wait between attempts goes through the host cancellation token, so a cancel
/// request aborts the loop with `ConnectorError::Cancelled`.
pub fn poll_until<T, F>(
    policy: &RetryPolicy,
    cancel: &CancelToken,
    operation: &str,
    mut poll: F,
) -> Result<Option<T>, ConnectorError>
where
    F: FnMut(u32) -> Result<Option<T>, ConnectorError>,
{
    if cancel.is_cancelled() {
        return Err(ConnectorError::Cancelled);
    }

    for attempt in 0..=policy.max_retries {
        debug!("[retry] {operation} attempt {} of {}", attempt + 1, policy.max_retries + 1);
        if let Some(value) = poll(attempt)? {
            debug!("[retry] {operation} completed on attempt {}", attempt + 1);
            return Ok(Some(value));
        }
        if attempt == policy.max_retries {
            break;
        }
        debug!(
            "[retry] {operation} not ready, waiting {}s before next attempt",
            policy.delay.as_secs()
        );
        if cancel.wait_timeout(policy.delay) {
            warn!("[retry] {operation} cancelled by host while waiting");
            return Err(ConnectorError::Cancelled);
        }
    }

    warn!(
        "[retry] {operation} exhausted after {} attempts",
        policy.max_retries + 1
    );
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn policy(max_retries: u32, delay_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            delay: Duration::from_millis(delay_ms),
        }
    }

    #[test]
    fn returns_value_on_first_success() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let result = poll_until(&policy(5, 10), &CancelToken::new(), "test", move |_| {
            *counter.lock().unwrap() += 1;
            Ok(Some(42))
        });
        assert_eq!(result.unwrap(), Some(42));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn retries_until_ready() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let result = poll_until(&policy(5, 1), &CancelToken::new(), "test", move |_| {
            let mut count = counter.lock().unwrap();
            *count += 1;
            Ok(if *count >= 3 { Some("done") } else { None })
        });
        assert_eq!(result.unwrap(), Some("done"));
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[test]
    fn exhaustion_makes_initial_plus_max_retries_attempts() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let result: Result<Option<()>, _> =
            poll_until(&policy(2, 1), &CancelToken::new(), "test", move |_| {
                *counter.lock().unwrap() += 1;
                Ok(None)
            });
        assert!(result.unwrap().is_none());
        // PickupRetries = 2 means three polls: the initial one plus two retries.
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[test]
    fn errors_abort_immediately() {
        let calls = Arc::new(Mutex::new(0));
        let counter = calls.clone();
        let result: Result<Option<()>, _> =
            poll_until(&policy(5, 1), &CancelToken::new(), "test", move |_| {
                *counter.lock().unwrap() += 1;
                Err(ConnectorError::Transport("connection reset".into()))
            });
        assert!(matches!(result, Err(ConnectorError::Transport(_))));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn cancellation_between_attempts_aborts_loop() {
        let token = CancelToken::new();
        let canceller = token.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            canceller.cancel();
        });
        let result: Result<Option<()>, _> =
            poll_until(&policy(10, 500), &token, "test", |_| Ok(None));
        handle.join().unwrap();
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }

    #[test]
    fn already_cancelled_token_short_circuits() {
        let token = CancelToken::new();
        token.cancel();
        let result: Result<Option<()>, _> =
            poll_until(&policy(5, 10), &token, "test", |_| Ok(Some(())));
        assert!(matches!(result, Err(ConnectorError::Cancelled)));
    }
}
