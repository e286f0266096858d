//! Free-function forms of the [`Session`] operations, for call sites that
//! read better as `open(&session, url)`.

use crate::page::Page;
use crate::session::Session;
use zombie_action::{Action, Engine};

pub fn open<E: Engine, P: Page>(session: &Session<E>, url: impl Into<String>) -> Action<P> {
    session.open(url)
}

pub fn inspect<E: Engine, P: Page>(session: &Session<E>) -> Action<P> {
    session.inspect()
}

pub fn execute<E: Engine>(session: &Session<E>, script: impl Into<String>) -> Action<String> {
    session.execute(script)
}

pub fn snap<E: Engine, T>(session: &Session<E>, element: T) -> Action<T>
where
    T: Clone + Send + Sync + 'static,
{
    session.snap(element)
}

pub fn dump<E: Engine>(session: &Session<E>) -> Action<()> {
    session.dump()
}

pub fn clear_cache<E: Engine>(session: &Session<E>) -> Action<()> {
    session.clear_cache()
}
