//! Sequential composition. Every combinator here short-circuits: once a step
//! fails, its error is the outcome and no later step is started.

use crate::{Action, ActionError, ActionResult};
use std::sync::Arc;

impl<T: Send + 'static> Action<T> {
    /// Run `self`, then the action `f` builds from its value.
    pub fn then<U, F>(self, f: F) -> Action<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Action<U> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Action::from_fn(move || {
            let first = self.clone();
            let f = Arc::clone(&f);
            async move {
                let value = first.run().await?;
                (*f)(value).run().await
            }
        })
    }

    /// Run `self`, discard its value, then run `next`.
    pub fn then_action<U>(self, next: Action<U>) -> Action<U>
    where
        U: Send + 'static,
    {
        Action::from_fn(move || {
            let first = self.clone();
            let next = next.clone();
            async move {
                first.run().await?;
                next.run().await
            }
        })
    }

    /// Transform the success value.
    pub fn map<U, F>(self, f: F) -> Action<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Action::from_fn(move || {
            let inner = self.clone();
            let f = Arc::clone(&f);
            async move { inner.run().await.map(|value| (*f)(value)) }
        })
    }

    /// Continue with a fallible, synchronous step.
    pub fn then_result<U, F>(self, f: F) -> Action<U>
    where
        U: Send + 'static,
        F: Fn(T) -> ActionResult<U> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Action::from_fn(move || {
            let inner = self.clone();
            let f = Arc::clone(&f);
            async move { inner.run().await.and_then(|value| (*f)(value)) }
        })
    }

    /// Rewrite a failure. Success values pass through.
    pub fn map_err<F>(self, f: F) -> Action<T>
    where
        F: Fn(ActionError) -> ActionError + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Action::from_fn(move || {
            let inner = self.clone();
            let f = Arc::clone(&f);
            async move { inner.run().await.map_err(|err| (*f)(err)) }
        })
    }
}

/// `a` then `f(value)`.
pub fn chain<T, U, F>(a: Action<T>, f: F) -> Action<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Action<U> + Send + Sync + 'static,
{
    a.then(f)
}

/// `a` then `b`, ignoring `a`'s value.
pub fn chain_discard<T, U>(a: Action<T>, b: Action<U>) -> Action<U>
where
    T: Send + 'static,
    U: Send + 'static,
{
    a.then_action(b)
}

/// Run `actions` one after another, collecting their values.
pub fn sequence<T: Send + 'static>(actions: Vec<Action<T>>) -> Action<Vec<T>> {
    let actions: Arc<[Action<T>]> = actions.into();
    Action::from_fn(move || {
        let actions = Arc::clone(&actions);
        async move {
            let mut values = Vec::with_capacity(actions.len());
            for action in actions.iter() {
                values.push(action.run().await?);
            }
            Ok(values)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn recorded(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Action<()> {
        let log = Arc::clone(log);
        Action::from_fn(move || {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(name);
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_then_action_orders_steps() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let action = recorded(&log, "a")
            .then_action(recorded(&log, "b"))
            .then_action(recorded(&log, "c"));
        action.run().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_then_action_skips_after_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let action = recorded(&log, "a")
            .then_action(Action::<()>::fail(ActionError::status(500)))
            .then_action(recorded(&log, "c"));
        assert_eq!(action.run().await, Err(ActionError::status(500)));
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_map_and_then_result() {
        let action = Action::succeed(4)
            .map(|n| n + 1)
            .then_result(|n| if n == 5 { Ok("five") } else { Err(ActionError::decoding("?")) });
        assert_eq!(action.run().await, Ok("five"));
    }

    #[tokio::test]
    async fn test_map_err_leaves_success() {
        let ok = Action::succeed(1).map_err(|_| ActionError::engine("rewritten"));
        assert_eq!(ok.run().await, Ok(1));

        let failed = Action::<i32>::fail(ActionError::status(404))
            .map_err(|err| ActionError::engine(err.to_string()));
        assert_eq!(failed.run().await.unwrap_err().kind(), ErrorKind::EngineFailure);
    }

    #[tokio::test]
    async fn test_sequence_stops_at_first_failure() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = |value: i32| {
            let runs = Arc::clone(&runs);
            Action::from_fn(move || {
                let runs = Arc::clone(&runs);
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(value)
                }
            })
        };

        let all = sequence(vec![counted(1), counted(2), counted(3)]);
        assert_eq!(all.run().await, Ok(vec![1, 2, 3]));
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        let broken = sequence(vec![
            counted(1),
            Action::fail(ActionError::cancelled("stop")),
            counted(3),
        ]);
        assert_eq!(broken.run().await.unwrap_err().kind(), ErrorKind::Cancelled);
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_chain_free_functions() {
        let doubled = chain(Action::succeed(21), |n| Action::succeed(n * 2));
        assert_eq!(doubled.run().await, Ok(42));

        let second = chain_discard(Action::succeed("ignored"), Action::succeed(7));
        assert_eq!(second.run().await, Ok(7));
    }
}
