use crate::{ActionError, ActionResult};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

/// Boxed, sendable future used to erase operation types.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type Operation<T> = dyn Fn() -> BoxFuture<ActionResult<T>> + Send + Sync;

/// A deferred unit of asynchronous work producing an [`ActionResult`].
///
/// Nothing happens until the action is run. Every run starts the operation
/// again; results are never cached and failures are never retried. Cloning
/// shares the operation, not any result.
pub struct Action<T> {
    operation: Arc<Operation<T>>,
}

impl<T> Clone for Action<T> {
    fn clone(&self) -> Self {
        Self {
            operation: Arc::clone(&self.operation),
        }
    }
}

impl<T> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action<{}>", std::any::type_name::<T>())
    }
}

impl<T: Send + 'static> Action<T> {
    /// Build an action from a callback-style operation.
    ///
    /// The operation receives a [`Completion`] and must eventually consume it.
    /// A completion dropped without a result resolves the action to
    /// [`ActionError::Cancelled`].
    pub fn new<F>(operation: F) -> Self
    where
        F: Fn(Completion<T>) + Send + Sync + 'static,
    {
        let operation = Arc::new(operation);
        Self::from_fn(move || {
            let operation = Arc::clone(&operation);
            async move {
                let (completion, receiver) = Completion::channel();
                (*operation)(completion);
                match receiver.await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!("action operation dropped its completion without a result");
                        Err(ActionError::cancelled("operation dropped its completion"))
                    }
                }
            }
        })
    }

    /// Build an action from a closure returning a future.
    pub fn from_fn<F, Fut>(operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult<T>> + Send + 'static,
    {
        Self {
            operation: Arc::new(move || -> BoxFuture<ActionResult<T>> { Box::pin(operation()) }),
        }
    }

    /// Action that always succeeds with a clone of `value`.
    pub fn succeed(value: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::from_fn(move || {
            let value = value.clone();
            async move { Ok(value) }
        })
    }

    /// Action that always fails with a clone of `error`.
    pub fn fail(error: ActionError) -> Self {
        Self::from_fn(move || {
            let error = error.clone();
            async move { Err(error) }
        })
    }

    /// Run the operation to completion.
    pub async fn run(&self) -> ActionResult<T> {
        (self.operation)().await
    }

    /// Start the operation on the current tokio runtime and hand its result
    /// to `completion` exactly once.
    ///
    /// Must be called from within a tokio runtime.
    pub fn invoke<C>(&self, completion: C) -> JoinHandle<()>
    where
        C: FnOnce(ActionResult<T>) + Send + 'static,
    {
        let future = (self.operation)();
        tokio::spawn(async move {
            let result = future.await;
            completion(result);
        })
    }
}

/// The one-shot completion handed to callback-style operations.
///
/// `complete` consumes the handle, so a second completion does not compile.
pub struct Completion<T> {
    sender: oneshot::Sender<ActionResult<T>>,
}

impl<T> Completion<T> {
    fn channel() -> (Self, oneshot::Receiver<ActionResult<T>>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Deliver the result. If nobody is waiting any more (the action was
    /// abandoned after a timeout), the result is dropped here.
    pub fn complete(self, result: ActionResult<T>) {
        if self.sender.send(result).is_err() {
            trace!("late completion discarded, observer already gone");
        }
    }

    pub fn succeed(self, value: T) {
        self.complete(Ok(value))
    }

    pub fn fail(self, error: ActionError) {
        self.complete(Err(error))
    }

    /// True once the observer stopped waiting; long operations may bail out early.
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}
