//! [`Engine`] backed by a real Chrome instance through `eoka`.

use crate::config::SessionConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use eoka::{Browser, Page};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use zombie_action::{Engine, EngineReply, PostAction, Request};

/// Interval between evaluations of a `PostAction::Validate` script.
const VALIDATE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// HTTP status of the last navigation; 0 when the browser has none (data: URLs).
const NAVIGATION_STATUS_JS: &str = "(() => {
    const entry = performance.getEntriesByType('navigation')[0];
    return entry && entry.responseStatus ? entry.responseStatus : 0;
})()";

const CONTENT_TYPE_JS: &str = "document.contentType || ''";

/// Body text of non-HTML documents, e.g. JSON that Chrome wraps in a `<pre>`.
const BODY_TEXT_JS: &str = "(() => {
    const pre = document.querySelector('body > pre');
    if (pre) return pre.textContent;
    return document.body ? document.body.innerText : (document.documentElement ? document.documentElement.textContent : '');
})()";

const CLEAR_STORAGE_JS: &str = r#"(() => {
    try { localStorage.clear(); } catch (e) {}
    try { sessionStorage.clear(); } catch (e) {}
})()"#;

/// One Chrome window driven over CDP.
pub struct ChromeEngine {
    browser: Browser,
    page: Page,
    validate_timeout: Duration,
}

impl ChromeEngine {
    pub async fn launch(config: &SessionConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            extra_args: blink_settings(config).into_iter().collect(),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page,
            validate_timeout: config.timeout(),
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }

    async fn load(&self, request: &Request) -> Result<()> {
        self.page.goto(&request.url).await?;
        match &request.post_action {
            PostAction::None => {}
            PostAction::Wait(duration) => tokio::time::sleep(*duration).await,
            PostAction::Validate(script) => self.wait_until(script).await?,
        }
        Ok(())
    }

    async fn wait_until(&self, script: &str) -> Result<()> {
        let started = Instant::now();
        loop {
            let done: bool = self.page.evaluate(script).await.unwrap_or(false);
            if done {
                return Ok(());
            }
            if started.elapsed() >= self.validate_timeout {
                return Err(Error::Timeout(format!(
                    "validation script never returned true: {}",
                    script
                )));
            }
            tokio::time::sleep(VALIDATE_POLL_INTERVAL).await;
        }
    }

    async fn content(&self) -> Result<EngineReply> {
        let content_type: String = self.page.evaluate(CONTENT_TYPE_JS).await?;
        let body: String = if content_type.is_empty() || content_type.contains("html") {
            self.page.content().await?
        } else {
            self.page.evaluate(BODY_TEXT_JS).await?
        };
        let url = self.page.url().await?;
        Ok(EngineReply::ok(body).url(url))
    }

    async fn navigation_status(&self) -> Option<u16> {
        match self.page.evaluate::<u32>(NAVIGATION_STATUS_JS).await {
            Ok(status) => u16::try_from(status).ok().filter(|s| *s > 0),
            Err(e) => {
                debug!("navigation status unavailable: {}", e);
                None
            }
        }
    }

    async fn evaluate(&self, source: &str) -> Result<EngineReply> {
        let value: serde_json::Value = self.page.evaluate(source).await?;
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(EngineReply::ok(text))
    }
}

fn into_reply(result: Result<EngineReply>) -> EngineReply {
    result.unwrap_or_else(|e| {
        warn!("engine call failed: {}", e);
        EngineReply::failed(e.to_string())
    })
}

#[async_trait]
impl Engine for ChromeEngine {
    async fn fetch(&self, request: &Request) -> EngineReply {
        let reply = match self.load(request).await {
            Ok(()) => self.content().await,
            Err(e) => Err(e),
        };
        let status = match reply {
            Ok(_) => self.navigation_status().await,
            Err(_) => None,
        };
        let reply = into_reply(reply);
        match status {
            Some(status) => reply.status(status),
            None => reply,
        }
    }

    async fn run_script(&self, source: &str) -> EngineReply {
        into_reply(self.evaluate(source).await)
    }

    async fn current_content(&self) -> EngineReply {
        into_reply(self.content().await)
    }

    fn supports_snapshots(&self) -> bool {
        true
    }

    async fn snapshot(&self) -> EngineReply {
        let url = self.page.url().await.ok();
        let reply = self
            .page
            .screenshot()
            .await
            .map(|png| EngineReply {
                url,
                ..EngineReply::ok(png)
            })
            .map_err(Error::from);
        into_reply(reply)
    }

    async fn clear_cache(&self) -> EngineReply {
        if let Err(e) = self.page.clear_all_cookies().await {
            return EngineReply::failed(e.to_string());
        }
        match self.page.execute(CLEAR_STORAGE_JS).await {
            Ok(_) => EngineReply::default(),
            Err(e) => EngineReply::failed(e.to_string()),
        }
    }
}

/// Chrome switches for the media and JavaScript session options.
fn blink_settings(config: &SessionConfig) -> Option<String> {
    let mut settings = Vec::new();
    if !config.load_media_content {
        settings.push("imagesEnabled=false");
    }
    if !config.enable_javascript {
        settings.push("scriptEnabled=false");
    }
    if settings.is_empty() {
        None
    } else {
        Some(format!("--blink-settings={}", settings.join(",")))
    }
}
