//! Runs an executor on its own thread and hands it the two capabilities that
//! settle the promise.

use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
};

use crate::{cell::Cell, Rejection, UnhandledRejection, NON_STANDARD_FAULT};

/// Shared by every resolver and rejecter of one promise. Dropping the last
/// one while the cell is pending abandons the cell.
struct Settler<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Drop for Settler<T> {
    fn drop(&mut self) {
        self.cell.abandon();
    }
}

/// Fulfills the promise it was created for.
///
/// Only the first call to [`Resolver::resolve`] or [`Rejecter::reject`] on a
/// promise has any effect.
pub struct Resolver<T> {
    settler: Arc<Settler<T>>,
}

/// Rejects the promise it was created for.
pub struct Rejecter<T> {
    settler: Arc<Settler<T>>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            settler: self.settler.clone(),
        }
    }
}

impl<T> Clone for Rejecter<T> {
    fn clone(&self) -> Self {
        Self {
            settler: self.settler.clone(),
        }
    }
}

impl<T> Resolver<T> {
    /// Returns whether this call settled the promise.
    pub fn resolve(&self, value: T) -> bool {
        self.settler.cell.resolve(value)
    }
}

impl<T> Rejecter<T> {
    /// Returns whether this call settled the promise.
    ///
    /// # Panics
    ///
    /// Under [`UnhandledPolicy::Panic`](crate::UnhandledPolicy::Panic), panics
    /// with an [`UnhandledRejection`] when no rejection callback is registered.
    pub fn reject(&self, reason: impl Into<Rejection>) -> bool {
        self.settler.cell.reject(reason.into())
    }

    /// Rejects with the `"unspecified reason"` text.
    pub fn reject_unspecified(&self) -> bool {
        self.reject(Rejection::unspecified())
    }
}

impl<T> std::fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}

impl<T> std::fmt::Debug for Rejecter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rejecter").finish_non_exhaustive()
    }
}

pub(crate) fn capabilities<T>(cell: Arc<Cell<T>>) -> (Resolver<T>, Rejecter<T>) {
    let settler = Arc::new(Settler { cell });
    (
        Resolver {
            settler: settler.clone(),
        },
        Rejecter { settler },
    )
}

/// Starts the worker thread. The executor is invoked exactly once, inside a
/// fault boundary that turns a panic into a rejection of the same cell.
pub(crate) fn launch<T, F>(
    builder: thread::Builder,
    cell: Arc<Cell<T>>,
    executor: F,
) -> io::Result<JoinHandle<()>>
where
    T: Send + Sync + 'static,
    F: FnOnce(Resolver<T>, Rejecter<T>) + Send + 'static,
{
    builder.spawn(move || {
        tracing::debug!("promise worker started");
        let (resolve, reject) = capabilities(cell);
        // Held across the boundary so an unwinding executor does not abandon
        // the cell before its panic is turned into a rejection.
        let fallback = reject.clone();
        let fault = match panic::catch_unwind(AssertUnwindSafe(move || executor(resolve, reject))) {
            Ok(()) => return,
            Err(payload) => payload,
        };
        // The reporter's own panic must keep unwinding, not become a second
        // rejection.
        if fault.is::<UnhandledRejection>() {
            panic::resume_unwind(fault);
        }
        let rejection = fault_reason(&*fault);
        let reason = rejection.reason().to_owned();
        if !fallback.reject(rejection) {
            // Already settled: the panic came from a callback or from the
            // executor after settling. Let it bring the worker down.
            tracing::warn!(reason = reason.as_str(), "promise worker panicked after settlement");
            panic::resume_unwind(fault);
        }
        tracing::warn!(reason = reason.as_str(), "promise executor panicked");
    })
}

fn fault_reason(payload: &(dyn Any + Send)) -> Rejection {
    if let Some(message) = payload.downcast_ref::<&str>() {
        Rejection::new(*message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Rejection::new(message.as_str())
    } else {
        Rejection::new(NON_STANDARD_FAULT)
    }
}
