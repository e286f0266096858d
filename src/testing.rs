//! Scripted in-memory engine for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use zombie_action::{Engine, EngineReply, Request};

#[derive(Default)]
pub(crate) struct MockEngine {
    pages: HashMap<String, String>,
    scripts: HashMap<String, EngineReply>,
    snapshot: Option<Vec<u8>>,
    latency: Duration,
    current: Mutex<Option<String>>,
    requests: Mutex<Vec<Request>>,
    cache_clears: AtomicUsize,
}

impl MockEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub(crate) fn script(mut self, source: &str, reply: EngineReply) -> Self {
        self.scripts.insert(source.to_string(), reply);
        self
    }

    pub(crate) fn snapshots(mut self, image: Vec<u8>) -> Self {
        self.snapshot = Some(image);
        self
    }

    pub(crate) fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn cache_clears(&self) -> usize {
        self.cache_clears.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn fetch(&self, request: &Request) -> EngineReply {
        self.requests.lock().unwrap().push(request.clone());
        self.delay().await;
        match self.pages.get(&request.url) {
            Some(html) => {
                *self.current.lock().unwrap() = Some(request.url.clone());
                EngineReply::ok(html.as_bytes()).url(request.url.clone())
            }
            None => EngineReply::ok("not found").status(404).url(request.url.clone()),
        }
    }

    async fn run_script(&self, source: &str) -> EngineReply {
        self.delay().await;
        self.scripts
            .get(source)
            .cloned()
            .unwrap_or_else(|| EngineReply::failed(format!("ReferenceError: {}", source)))
    }

    async fn current_content(&self) -> EngineReply {
        let current = self.current.lock().unwrap().clone();
        match current.and_then(|url| self.pages.get(&url).map(|html| (url, html))) {
            Some((url, html)) => EngineReply::ok(html.as_bytes()).url(url),
            None => EngineReply::failed("no page loaded"),
        }
    }

    fn supports_snapshots(&self) -> bool {
        self.snapshot.is_some()
    }

    async fn snapshot(&self) -> EngineReply {
        match &self.snapshot {
            Some(image) => EngineReply::ok(image.clone()),
            None => EngineReply::failed("snapshots disabled"),
        }
    }

    async fn clear_cache(&self) -> EngineReply {
        self.cache_clears.fetch_add(1, Ordering::SeqCst);
        EngineReply::default()
    }
}
