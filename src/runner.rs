use crate::chrome::ChromeEngine;
use crate::config::{Script, SessionConfig, Step};
use crate::page::HtmlPage;
use crate::session::Session;
use crate::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use zombie_action::{Action, ActionError, Engine};

/// Result of running a script.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Steps that completed in the last attempt.
    pub steps_executed: usize,
    pub duration_ms: u64,
    /// Number of retry attempts made.
    pub retries: u32,
}

/// Compiles scripts into actions and runs them against a session.
pub struct Runner<E> {
    session: Session<E>,
}

impl Runner<ChromeEngine> {
    /// Launch Chrome with the script's session settings.
    pub async fn launch(config: &SessionConfig) -> Result<Self> {
        let engine = ChromeEngine::launch(config).await?;
        Ok(Self::new(Session::from_config(config, engine)))
    }

    /// Close the browser. Fails silently if actions built from this session
    /// are still alive elsewhere.
    pub async fn close(self) -> Result<()> {
        match Arc::try_unwrap(self.session.into_engine()) {
            Ok(engine) => engine.close().await,
            Err(_) => {
                warn!("engine still shared, leaving browser open");
                Ok(())
            }
        }
    }
}

impl<E: Engine> Runner<E> {
    pub fn new(session: Session<E>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    /// Chain every step into one action. `progress` counts completed steps.
    pub fn compile(&self, script: &Script, progress: Arc<AtomicUsize>) -> Action<()> {
        script
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let progress = Arc::clone(&progress);
                let name = step.name();
                Action::from_fn(move || async move {
                    debug!("Executing step {}: {}", i + 1, name);
                    Ok(())
                })
                .then_action(self.step(step))
                .map(move |()| {
                    progress.fetch_add(1, Ordering::SeqCst);
                })
            })
            .fold(Action::succeed(()), |chain, step| chain.then_action(step))
    }

    /// Every step, engine-backed or not, is bounded by the session timeout.
    fn step(&self, step: &Step) -> Action<()> {
        let session = &self.session;
        let action = match step {
            Step::Open(s) => {
                session.open_then::<HtmlPage>(s.post_action())(s.url.clone()).map(|page| {
                    info!("loaded {} ({} bytes)", page.url().unwrap_or("?"), page.html().len());
                })
            }
            Step::Execute(s) => session.execute(s.script.clone()).map(|output| {
                info!("[script] {}", output);
            }),
            Step::Inspect => session.inspect::<HtmlPage>().map(|page| {
                info!("inspect: {} ({} bytes)", page.url().unwrap_or("?"), page.html().len());
            }),
            Step::Snap(s) => {
                let template = s.path.clone();
                session.take_snapshot().then_result(move |snapshot| {
                    let path = snapshot.file_name(&template);
                    info!("snap: {}", path);
                    std::fs::write(&path, &snapshot.data)
                        .map_err(|e| ActionError::snapshot(format!("{}: {}", path, e)))
                })
            }
            Step::Dump => session.dump(),
            Step::ClearCache => session.clear_cache(),
            Step::Wait(s) => {
                let pause = Duration::from_millis(s.ms);
                Action::from_fn(move || async move {
                    tokio::time::sleep(pause).await;
                    Ok(())
                })
            }
            Step::Log(s) => {
                let message = s.message.clone();
                Action::from_fn(move || {
                    info!("[log] {}", message);
                    async { Ok(()) }
                })
            }
            Step::AssertText(s) => {
                let text = s.text.clone();
                session.inspect::<HtmlPage>().then_result(move |page| {
                    if page.contains(&text) {
                        Ok(())
                    } else {
                        Err(ActionError::engine(format!(
                            "assertion failed: text '{}' not found",
                            text
                        )))
                    }
                })
            }
        };
        action.with_timeout(session.timeout())
    }

    /// Run the script, retrying as configured.
    pub async fn run(&self, script: &Script) -> Result<RunResult> {
        let start = Instant::now();
        let retry_config = script.on_failure.as_ref().and_then(|f| f.retry.as_ref());
        let max_attempts = retry_config.map(|r| r.attempts).unwrap_or(1);
        let retry_delay = retry_config.map(|r| r.delay_ms).unwrap_or(0);

        let mut last_error = None;
        let mut steps_executed = 0;
        let mut retries = 0;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                retries += 1;
                info!("Retry attempt {}/{}", attempt, max_attempts);
                if retry_delay > 0 {
                    tokio::time::sleep(Duration::from_millis(retry_delay)).await;
                }
            }

            let progress = Arc::new(AtomicUsize::new(0));
            let outcome = self.compile(script, Arc::clone(&progress)).run().await;
            steps_executed = progress.load(Ordering::SeqCst);

            match outcome {
                Ok(()) => {
                    return Ok(RunResult {
                        success: true,
                        error: None,
                        steps_executed,
                        duration_ms: start.elapsed().as_millis() as u64,
                        retries,
                    });
                }
                Err(e) => {
                    warn!("Attempt {} failed: {}", attempt, e);
                    last_error = Some(e.to_string());
                    if attempt == max_attempts {
                        self.handle_failure(script).await;
                    }
                }
            }
        }

        Ok(RunResult {
            success: false,
            error: last_error,
            steps_executed,
            duration_ms: start.elapsed().as_millis() as u64,
            retries,
        })
    }

    async fn handle_failure(&self, script: &Script) {
        let Some(template) = script.on_failure.as_ref().and_then(|f| f.snapshot.as_ref()) else {
            return;
        };
        match self.session.take_snapshot().run().await {
            Ok(snapshot) => {
                let path = snapshot.file_name(template);
                info!("Saving failure snapshot to: {}", path);
                if let Err(e) = std::fs::write(&path, &snapshot.data) {
                    warn!("Failed to save snapshot: {}", e);
                }
            }
            Err(e) => warn!("Failed to take failure snapshot: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockEngine;
    use zombie_action::EngineReply;

    fn runner(engine: MockEngine) -> Runner<MockEngine> {
        Runner::new(Session::new("test", engine))
    }

    #[tokio::test]
    async fn test_run_all_steps() {
        let script = Script::parse(
            r#"
name: "Search"
steps:
  - open:
      url: "https://example.com"
  - execute:
      script: "document.title"
  - assert_text:
      text: "Welcome"
  - log:
      message: "done"
  - inspect
  - dump
  - clear_cache
"#,
        )
        .unwrap();
        let engine = MockEngine::new()
            .page("https://example.com", "<h1>Welcome</h1>")
            .script("document.title", EngineReply::ok("Example"));
        let runner = runner(engine);

        let result = runner.run(&script).await.unwrap();
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.steps_executed, 7);
        assert_eq!(result.retries, 0);
        assert_eq!(runner.session().engine().cache_clears(), 1);
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_steps() {
        let script = Script::parse(
            r#"
name: "Broken"
steps:
  - open:
      url: "https://example.com"
  - assert_text:
      text: "Missing"
  - clear_cache
"#,
        )
        .unwrap();
        let runner = runner(MockEngine::new().page("https://example.com", "<p>hi</p>"));

        let result = runner.run(&script).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.steps_executed, 1);
        assert!(result.error.unwrap().contains("Missing"));
        assert_eq!(runner.session().engine().cache_clears(), 0);
    }

    #[tokio::test]
    async fn test_retries_until_attempts_exhausted() {
        let script = Script::parse(
            r#"
name: "Flaky"
steps:
  - open:
      url: "https://down.test"
on_failure:
  retry:
    attempts: 3
    delay_ms: 1
"#,
        )
        .unwrap();
        let runner = runner(MockEngine::new());

        let result = runner.run(&script).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.retries, 2);
        assert_eq!(runner.session().engine().requests().len(), 3);
        assert!(result.error.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_step_timeout_from_session() {
        let script = Script::parse(
            r#"
name: "Slow"
steps:
  - open:
      url: "https://slow.test"
"#,
        )
        .unwrap();
        let engine = MockEngine::new()
            .page("https://slow.test", "late")
            .latency(Duration::from_secs(5));
        let mut session = Session::new("test", engine);
        session.set_timeout(Duration::from_millis(20));
        let runner = Runner::new(session);

        let result = runner.run(&script).await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_wait_step_bounded_by_session_timeout() {
        let script = Script::parse(
            r#"
name: "Sleepy"
steps:
  - log:
      message: "before"
  - wait:
      ms: 500
  - clear_cache
"#,
        )
        .unwrap();
        let mut session = Session::new("test", MockEngine::new());
        session.set_timeout(Duration::from_millis(20));
        let runner = Runner::new(session);

        let started = Instant::now();
        let result = runner.run(&script).await.unwrap();
        assert!(!result.success);
        assert!(started.elapsed() < Duration::from_millis(400));
        assert_eq!(result.steps_executed, 1);
        assert!(result.error.unwrap().contains("timed out"));
        assert_eq!(runner.session().engine().cache_clears(), 0);
    }

    #[tokio::test]
    async fn test_snap_step_without_capability_fails() {
        let script = Script::parse(
            r#"
name: "Snap"
steps:
  - snap:
      path: "never-written.png"
"#,
        )
        .unwrap();
        let runner = runner(MockEngine::new());

        let result = runner.run(&script).await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not yet implemented"));
    }

    #[tokio::test]
    async fn test_compile_is_lazy() {
        let script = Script::parse(
            r#"
name: "Lazy"
steps:
  - clear_cache
"#,
        )
        .unwrap();
        let runner = runner(MockEngine::new());
        let progress = Arc::new(AtomicUsize::new(0));

        let action = runner.compile(&script, Arc::clone(&progress));
        assert_eq!(runner.session().engine().cache_clears(), 0);

        action.run().await.unwrap();
        action.run().await.unwrap();
        assert_eq!(runner.session().engine().cache_clears(), 2);
        assert_eq!(progress.load(Ordering::SeqCst), 2);
    }
}
