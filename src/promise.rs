use std::{
    any::Any,
    fmt,
    sync::Arc,
    thread::JoinHandle,
};

use crate::{
    cell::{Cell, OnFulfilled, OnRejected, Outcome, State},
    launcher::{Rejecter, Resolver},
    Builder, Error, Rejection, Settled, UnhandledRejection,
};

/// A value produced by an executor running on its own thread.
///
/// The executor starts as soon as the promise is created and settles it by
/// calling its [`Resolver`] or [`Rejecter`]. Callbacks registered with
/// [`then`](Self::then) before settlement run on the worker thread; callbacks
/// registered afterwards run immediately on the registering thread.
///
/// Dropping a `Promise` detaches the worker. The executor keeps running and
/// may still settle the shared state, which stays alive for as long as the
/// worker needs it.
///
/// # Examples
///
/// ```
/// use thread_promise::Promise;
/// use std::{sync::mpsc::channel, thread, time::Duration};
///
/// let (tx, rx) = channel();
/// let promise = Promise::new(|resolve, _reject| {
///     thread::sleep(Duration::from_millis(10));
///     resolve.resolve(69);
/// });
/// promise.then(move |value| tx.send(*value).unwrap());
/// assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(69));
/// ```
pub struct Promise<T> {
    cell: Arc<Cell<T>>,
    worker: Option<JoinHandle<()>>,
}

impl<T> Promise<T>
where
    T: Send + Sync + 'static,
{
    /// Launches `executor` on a new thread with the default [`Builder`].
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to create a thread; use [`Builder::spawn`] to
    /// recover from such errors.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver<T>, Rejecter<T>) + Send + 'static,
    {
        Builder::new()
            .spawn(executor)
            .expect("failed to spawn promise worker")
    }
}

impl<T> Promise<T> {
    pub(crate) fn from_parts(cell: Arc<Cell<T>>, worker: JoinHandle<()>) -> Self {
        Self {
            cell,
            worker: Some(worker),
        }
    }

    /// Registers both callbacks, replacing any pair registered earlier.
    ///
    /// `None` leaves the corresponding slot empty. On a settled promise the
    /// matching callback runs before `observe` returns.
    pub fn observe<F, R>(&self, on_fulfilled: Option<F>, on_rejected: Option<R>) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
        R: FnOnce(&Rejection) + Send + 'static,
    {
        self.cell.observe(
            on_fulfilled.map(|f| Box::new(f) as OnFulfilled<T>),
            on_rejected.map(|r| Box::new(r) as OnRejected),
        );
        self
    }

    /// Registers a fulfillment callback and clears the rejection slot.
    pub fn then<F>(&self, on_fulfilled: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.cell.observe(Some(Box::new(on_fulfilled)), None);
        self
    }

    /// Registers both a fulfillment and a rejection callback.
    pub fn then_or<F, R>(&self, on_fulfilled: F, on_rejected: R) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
        R: FnOnce(&Rejection) + Send + 'static,
    {
        self.cell
            .observe(Some(Box::new(on_fulfilled)), Some(Box::new(on_rejected)));
        self
    }

    /// Registers a rejection callback and clears the fulfillment slot.
    pub fn catch_error<R>(&self, on_rejected: R) -> &Self
    where
        R: FnOnce(&Rejection) + Send + 'static,
    {
        self.cell.observe(None, Some(Box::new(on_rejected)));
        self
    }

    pub fn settled(&self) -> Settled<T> {
        Settled::new(self.cell.clone())
    }

    pub fn state(&self) -> State {
        self.cell.state()
    }

    /// Whether the executor dropped every resolver and rejecter while the
    /// promise was still pending. Such a promise never settles.
    pub fn is_abandoned(&self) -> bool {
        self.cell.is_abandoned()
    }

    pub fn value(&self) -> Option<Arc<T>> {
        match self.cell.outcome()? {
            Outcome::Fulfilled(value) => Some(value),
            Outcome::Rejected(_) => None,
        }
    }

    pub fn reason(&self) -> Option<Rejection> {
        match self.cell.outcome()? {
            Outcome::Fulfilled(_) => None,
            Outcome::Rejected(rejection) => Some(rejection),
        }
    }

    pub fn snapshot(&self) -> Snapshot<T> {
        let (state, value, reason) = match self.cell.outcome() {
            None => (State::Pending, None, None),
            Some(Outcome::Fulfilled(value)) => (State::Fulfilled, Some(value), None),
            Some(Outcome::Rejected(rejection)) => (State::Rejected, None, Some(rejection)),
        };
        Snapshot {
            state,
            value,
            reason,
        }
    }

    /// Prints the current state and value to stdout and returns them.
    pub fn debug(&self) -> Snapshot<T>
    where
        T: fmt::Debug,
    {
        let snapshot = self.snapshot();
        println!("{snapshot}");
        snapshot
    }

    /// Whether the worker thread has finished running the executor.
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the worker thread to exit.
    ///
    /// Settlement may happen before the executor returns, so a settled
    /// promise can still block here until the executor is done.
    ///
    /// # Errors
    ///
    /// [`Error::UnhandledRejection`] if the worker was brought down by an
    /// unhandled rejection, [`Error::WorkerPanicked`] for any other panic.
    pub fn join(mut self) -> Result<(), Error> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        worker.join().map_err(worker_fault)
    }
}

fn worker_fault(payload: Box<dyn Any + Send>) -> Error {
    match payload.downcast::<UnhandledRejection>() {
        Ok(fault) => Error::UnhandledRejection(*fault),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| crate::NON_STANDARD_FAULT.to_owned());
            Error::WorkerPanicked(message)
        }
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        // Detach: the worker owns its own reference to the cell.
        if let Some(worker) = self.worker.take() {
            tracing::debug!(finished = worker.is_finished(), "detaching promise worker");
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("Promise")
            .field("state", &snapshot.state)
            .field("value", &snapshot.value)
            .field("reason", &snapshot.reason)
            .finish()
    }
}

/// A point-in-time copy of a promise's state.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub state: State,
    pub value: Option<Arc<T>>,
    pub reason: Option<Rejection>,
}

impl<T: fmt::Debug> fmt::Display for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, &self.reason) {
            (Some(value), _) => write!(f, "value: {value:?}, state: {}", self.state),
            (None, Some(reason)) => write!(f, "value: none, state: {}, reason: {reason}", self.state),
            (None, None) => write!(f, "value: none, state: {}", self.state),
        }
    }
}
