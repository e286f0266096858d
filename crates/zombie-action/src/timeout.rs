use crate::{Action, ActionError};
use std::time::Duration;
use tracing::debug;

/// Deadline applied by sessions that were not configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bound `action` by `duration`.
///
/// The inner run and the deadline race inside a single future, so exactly
/// one of them decides the outcome. When the deadline wins the inner run is
/// dropped; a callback-style operation that completes later finds nobody
/// listening and its result is discarded. An inner run that is already
/// finished on first poll wins even against a zero duration.
pub fn with_timeout<T: Send + 'static>(action: Action<T>, duration: Duration) -> Action<T> {
    Action::from_fn(move || {
        let inner = action.clone();
        async move {
            match tokio::time::timeout(duration, inner.run()).await {
                Ok(result) => result,
                Err(_) => {
                    debug!("action abandoned after {:?}", duration);
                    Err(ActionError::timeout(duration))
                }
            }
        }
    })
}

impl<T: Send + 'static> Action<T> {
    /// Fluent form of [`with_timeout`].
    pub fn with_timeout(self, duration: Duration) -> Action<T> {
        with_timeout(self, duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Completion, ErrorKind};

    fn delayed(value: u32, after: Duration) -> Action<u32> {
        Action::from_fn(move || async move {
            tokio::time::sleep(after).await;
            Ok(value)
        })
    }

    #[tokio::test]
    async fn test_fast_action_wins() {
        let action = delayed(42, Duration::from_millis(10)).with_timeout(Duration::from_secs(10));
        assert_eq!(action.run().await, Ok(42));
    }

    #[tokio::test]
    async fn test_slow_action_times_out() {
        let action = delayed(42, Duration::from_secs(5)).with_timeout(Duration::from_millis(10));
        let err = action.run().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_ready_action_beats_zero_deadline() {
        let action = Action::succeed(1u8).with_timeout(Duration::ZERO);
        assert_eq!(action.run().await, Ok(1));
    }

    #[tokio::test]
    async fn test_failure_passes_through_unchanged() {
        let action = Action::<u8>::fail(ActionError::status(502)).with_timeout(Duration::from_secs(1));
        assert_eq!(action.run().await, Err(ActionError::status(502)));
    }

    #[tokio::test]
    async fn test_hung_callback_operation_times_out() {
        let (park_tx, park_rx) = std::sync::mpsc::channel::<Completion<u8>>();
        let park_tx = std::sync::Mutex::new(park_tx);
        let action = Action::new(move |completion: Completion<u8>| {
            let _ = park_tx.lock().unwrap().send(completion);
        });

        let err = action.with_timeout(Duration::from_millis(10)).run().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);

        let parked = park_rx.recv().unwrap();
        assert!(parked.is_abandoned());
        parked.succeed(7);
    }
}
