use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use crate::{cell::Cell, Error};

/// Resolves once the promise settles.
///
/// This is a passive view: it leaves the callback slots alone and does not
/// count as a rejection handler, so a rejection nobody registered a callback
/// for is still escalated even while a `Settled` is being awaited.
///
/// # Examples
///
/// ```
/// use thread_promise::Promise;
/// use futures::executor::block_on;
/// use std::thread;
///
/// let promise = Promise::new(|resolve, _reject| {
///     resolve.resolve(String::from("🍓"));
/// });
/// let task = thread::spawn({
///     let settled = promise.settled();
///     move || block_on(settled)
/// });
/// let value = task.join().expect("The task thread has panicked");
/// assert_eq!(value.unwrap().as_str(), "🍓");
/// ```
#[must_use = "futures do nothing unless polled"]
pub struct Settled<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Settled<T> {
    pub(crate) fn new(cell: Arc<Cell<T>>) -> Self {
        Self { cell }
    }
}

impl<T> Clone for Settled<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Settled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settled")
            .field("state", &self.cell.state())
            .finish()
    }
}

impl<T> Future for Settled<T> {
    type Output = Result<Arc<T>, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.cell.poll_settled(cx.waker())
    }
}
