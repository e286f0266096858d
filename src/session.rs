use crate::config::SessionConfig;
use crate::page::{Page, Snapshot};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use zombie_action::{Action, ActionError, Engine, PostAction, Request, DEFAULT_TIMEOUT};

/// Delay before a snapshot so late paints land in the image.
pub const DEFAULT_SNAPSHOT_DELAY: Duration = Duration::from_millis(100);

/// Receives every snapshot taken by [`Session::snap`].
pub type SnapshotHandler = Arc<dyn Fn(Snapshot) + Send + Sync>;

/// A browser session: the engine plus the settings every action built from
/// it shares. Cloning is cheap and shares the engine.
pub struct Session<E> {
    name: String,
    engine: Arc<E>,
    timeout: Duration,
    snapshot_handler: Option<SnapshotHandler>,
}

impl<E> Clone for Session<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            engine: Arc::clone(&self.engine),
            timeout: self.timeout,
            snapshot_handler: self.snapshot_handler.clone(),
        }
    }
}

impl<E: Engine> Session<E> {
    pub fn new(name: impl Into<String>, engine: E) -> Self {
        Self {
            name: name.into(),
            engine: Arc::new(engine),
            timeout: DEFAULT_TIMEOUT,
            snapshot_handler: None,
        }
    }

    pub fn from_config(config: &SessionConfig, engine: E) -> Self {
        let mut session = Self::new(config.name.clone(), engine);
        session.set_timeout(config.timeout());
        session
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn into_engine(self) -> Arc<E> {
        self.engine
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Applies to actions built after the call.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_snapshot_handler<F>(&mut self, handler: F)
    where
        F: Fn(Snapshot) + Send + Sync + 'static,
    {
        self.snapshot_handler = Some(Arc::new(handler));
    }

    /// Load `url` and decode it as `P`.
    pub fn open<P: Page>(&self, url: impl Into<String>) -> Action<P> {
        self.load(Request::new(url))
    }

    /// Like [`Session::open`] with a post action, curried for chaining:
    /// `session.open_then(PostAction::Wait(d))(url)`.
    pub fn open_then<P: Page>(
        &self,
        post_action: PostAction,
    ) -> impl Fn(String) -> Action<P> + Send + Sync + 'static {
        let session = self.clone();
        move |url| session.load(Request::new(url).post_action(post_action.clone()))
    }

    fn load<P: Page>(&self, request: Request) -> Action<P> {
        let engine = Arc::clone(&self.engine);
        Action::from_fn(move || {
            let engine = Arc::clone(&engine);
            let request = request.clone();
            async move {
                debug!("open: {}", request.url);
                let response = engine.fetch(&request).await.into_response()?;
                P::decode(&response)
            }
        })
        .with_timeout(self.timeout)
    }

    /// Decode the page currently loaded.
    pub fn inspect<P: Page>(&self) -> Action<P> {
        let engine = Arc::clone(&self.engine);
        Action::from_fn(move || {
            let engine = Arc::clone(&engine);
            async move {
                let response = engine.current_content().await.into_response()?;
                P::decode(&response)
            }
        })
        .with_timeout(self.timeout)
    }

    /// Evaluate `script` in the current page and return its result as text.
    pub fn execute(&self, script: impl Into<String>) -> Action<String> {
        let engine = Arc::clone(&self.engine);
        let script: Arc<str> = script.into().into();
        Action::from_fn(move || {
            let engine = Arc::clone(&engine);
            let script = Arc::clone(&script);
            async move {
                let output = engine
                    .run_script(&script)
                    .await
                    .into_response()
                    .and_then(|response| String::decode(&response));
                debug!("script result:\n{:?}", output);
                output
            }
        })
        .with_timeout(self.timeout)
    }

    /// [`Session::execute`] as a continuation after a page-producing step.
    pub fn execute_on<P: Page>(
        &self,
        script: impl Into<String>,
    ) -> impl Fn(P) -> Action<String> + Send + Sync + 'static {
        let action = self.execute(script);
        move |_page| action.clone()
    }

    /// Take a snapshot without involving the snapshot handler.
    pub fn take_snapshot(&self) -> Action<Snapshot> {
        if !self.engine.supports_snapshots() {
            return Action::fail(ActionError::not_yet_implemented(
                "snapshots are not supported by this engine",
            ));
        }
        let engine = Arc::clone(&self.engine);
        Action::from_fn(move || {
            let engine = Arc::clone(&engine);
            async move {
                let response = engine
                    .snapshot()
                    .await
                    .into_response()
                    .map_err(|e| ActionError::snapshot(e.to_string()))?;
                Ok(Snapshot {
                    data: response.data,
                    url: response.url,
                    taken_at: Utc::now(),
                })
            }
        })
        .with_timeout(self.timeout)
    }

    /// Snapshot the current page, hand it to the snapshot handler, and pass
    /// `element` through unchanged.
    pub fn snap<T>(&self, element: T) -> Action<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let capture = self.take_snapshot();
        if !self.engine.supports_snapshots() {
            return capture.map(move |_| element.clone());
        }
        let handler = self.snapshot_handler.clone();
        Action::from_fn(move || {
            let capture = capture.clone();
            let handler = handler.clone();
            let element = element.clone();
            async move {
                tokio::time::sleep(DEFAULT_SNAPSHOT_DELAY).await;
                let handler =
                    handler.ok_or_else(|| ActionError::snapshot("no snapshot handler registered"))?;
                let snapshot = capture.run().await?;
                handler(snapshot);
                Ok(element)
            }
        })
    }

    /// `a`, then a snapshot, then `f`.
    pub fn then_snap<T, U, F>(&self, a: Action<T>, f: F) -> Action<U>
    where
        T: Clone + Send + Sync + 'static,
        U: Send + 'static,
        F: Fn(T) -> Action<U> + Send + Sync + 'static,
    {
        let session = self.clone();
        a.then(move |value| session.snap(value)).then(f)
    }

    /// Log the current page content.
    pub fn dump(&self) -> Action<()> {
        let engine = Arc::clone(&self.engine);
        Action::from_fn(move || {
            let engine = Arc::clone(&engine);
            async move {
                match engine.current_content().await.into_response() {
                    Ok(response) => info!("{}", String::from_utf8_lossy(&response.data)),
                    Err(_) => info!("No output available."),
                }
                Ok(())
            }
        })
        .with_timeout(self.timeout)
    }

    /// Clear cookies and site storage.
    pub fn clear_cache(&self) -> Action<()> {
        let engine = Arc::clone(&self.engine);
        Action::from_fn(move || {
            let engine = Arc::clone(&engine);
            async move {
                match engine.clear_cache().await.error {
                    Some(message) => Err(ActionError::engine(message)),
                    None => Ok(()),
                }
            }
        })
        .with_timeout(self.timeout)
    }
}
