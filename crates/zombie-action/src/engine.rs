use crate::{handle_reply, ActionResult, Response};
use async_trait::async_trait;
use std::time::Duration;

/// What to do once a page has finished loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PostAction {
    /// Return as soon as the load finishes.
    #[default]
    None,
    /// Wait a fixed time, e.g. for scripts that render after load.
    Wait(Duration),
    /// Poll the script until it evaluates to `true`.
    Validate(String),
}

/// A page load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub post_action: PostAction,
}

impl Request {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            post_action: PostAction::None,
        }
    }

    pub fn post_action(mut self, post_action: PostAction) -> Self {
        self.post_action = post_action;
        self
    }
}

/// Raw engine reply: payload, status metadata and error indicator, any of
/// which may be absent. Turn it into a [`Response`] with [`EngineReply::into_response`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineReply {
    pub payload: Option<Vec<u8>>,
    pub status: Option<u16>,
    /// Final URL after redirects, when known.
    pub url: Option<String>,
    pub error: Option<String>,
}

impl EngineReply {
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(payload.into()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn into_response(self) -> ActionResult<Response> {
        handle_reply(self)
    }
}

/// The browser backend actions run against.
///
/// Each call replies exactly once. Snapshots and cache clearing are optional
/// capabilities; the defaults report them as unavailable or do nothing.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    /// Load a page and apply the request's post action.
    async fn fetch(&self, request: &Request) -> EngineReply;

    /// Evaluate a script in the current page.
    async fn run_script(&self, source: &str) -> EngineReply;

    /// Content of the current page.
    async fn current_content(&self) -> EngineReply;

    fn supports_snapshots(&self) -> bool {
        false
    }

    /// Image of the current page.
    async fn snapshot(&self) -> EngineReply {
        EngineReply::failed("snapshots are not supported by this engine")
    }

    /// Clear cookies and cached site data.
    async fn clear_cache(&self) -> EngineReply {
        EngineReply::default()
    }
}
