//! # zombie-action
//!
//! Lazy, single-shot asynchronous actions with typed failures. Actions are
//! built once, composed with [`Action::then`] and friends, bounded with
//! [`Action::with_timeout`], and only start work when run.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use zombie_action::{Action, ActionError};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let fetch = Action::from_fn(|| async { Ok::<_, ActionError>(21) });
//! let doubled = fetch
//!     .then(|n| Action::succeed(n * 2))
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(doubled.run().await, Ok(42));
//! # }
//! ```
//!
//! Real work (page loads, script execution) plugs in through the [`Engine`]
//! trait; this crate never talks to a browser itself.

mod action;
mod compose;
mod engine;
mod error;
mod response;
mod result;
mod timeout;

pub use action::{Action, BoxFuture, Completion};
pub use compose::{chain, chain_discard, sequence};
pub use engine::{Engine, EngineReply, PostAction, Request};
pub use error::{ActionError, Detail, ErrorKind};
pub use response::{handle_reply, Response, DEFAULT_STATUS_ERROR, DEFAULT_STATUS_SUCCESS};
pub use result::{from_parts, ActionResult};
pub use timeout::{with_timeout, DEFAULT_TIMEOUT};
