//! # zombie-tools
//!
//! Headless browser automation built from composable actions. A [`Session`]
//! turns page loads, script runs and snapshots into lazy [`Action`]s that
//! chain with `then`, short-circuit on failure and are bounded by the
//! session timeout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zombie_tools::{ChromeEngine, HtmlPage, Session, SessionConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> zombie_tools::Result<()> {
//! let config = SessionConfig::default();
//! let session = Session::from_config(&config, ChromeEngine::launch(&config).await?);
//!
//! let title = session
//!     .open::<HtmlPage>("https://example.com")
//!     .then(session.execute_on::<HtmlPage>("document.title"))
//!     .run()
//!     .await?;
//! println!("{}", title);
//! # Ok(())
//! # }
//! ```
//!
//! Scripts can also be written in YAML and run with [`Runner`] or the
//! `zombie` binary.

mod chrome;
mod config;
pub mod functions;
mod page;
mod runner;
mod session;
#[cfg(test)]
mod testing;

pub use chrome::ChromeEngine;
pub use config::{
    OnFailure, ParamDef, Params, RetryConfig, Script, SessionConfig, Step, Viewport,
};
pub use page::{HtmlPage, JsonPage, Page, Snapshot};
pub use runner::{RunResult, Runner};
pub use session::{Session, SnapshotHandler, DEFAULT_SNAPSHOT_DELAY};
pub use zombie_action::{
    Action, ActionError, ActionResult, Engine, EngineReply, ErrorKind, PostAction, Request,
};

/// Result type for zombie-tools operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from script loading, browser control and action execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("action failed: {0}")]
    Action(#[from] ActionError),

    #[error("timeout: {0}")]
    Timeout(String),
}
