//! The settlement cell: the state machine shared between a promise handle
//! and the thread settling it.
//!
//! Every field lives behind one mutex. Callbacks and wakers are moved out
//! while the guard is held and run after it is released, so a callback may
//! freely call back into the same cell.

use std::{
    fmt, mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Poll, Waker},
};

use crate::{unhandled::UnhandledPolicy, Error, Rejection};

pub(crate) type OnFulfilled<T> = Box<dyn FnOnce(&T) + Send>;
pub(crate) type OnRejected = Box<dyn FnOnce(&Rejection) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Pending,
    Fulfilled,
    Rejected,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Pending => "pending",
            State::Fulfilled => "fulfilled",
            State::Rejected => "rejected",
        })
    }
}

pub(crate) enum Outcome<T> {
    Fulfilled(Arc<T>),
    Rejected(Rejection),
}

impl<T> Clone for Outcome<T> {
    fn clone(&self) -> Self {
        match self {
            Outcome::Fulfilled(value) => Outcome::Fulfilled(value.clone()),
            Outcome::Rejected(rejection) => Outcome::Rejected(rejection.clone()),
        }
    }
}

impl<T> Outcome<T> {
    fn state(&self) -> State {
        match self {
            Outcome::Fulfilled(_) => State::Fulfilled,
            Outcome::Rejected(_) => State::Rejected,
        }
    }
}

struct Inner<T> {
    outcome: Option<Outcome<T>>,
    on_fulfilled: Option<OnFulfilled<T>>,
    on_rejected: Option<OnRejected>,
    wakers: Vec<Waker>,
    abandoned: bool,
}

pub(crate) struct Cell<T> {
    inner: Mutex<Inner<T>>,
    policy: UnhandledPolicy,
}

impl<T> Cell<T> {
    pub(crate) fn new(policy: UnhandledPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner {
                outcome: None,
                on_fulfilled: None,
                on_rejected: None,
                wakers: Vec::new(),
                abandoned: false,
            }),
            policy,
        }
    }

    // User code never runs under the guard, so a poisoned lock still holds
    // consistent data.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state(&self) -> State {
        self.lock()
            .outcome
            .as_ref()
            .map_or(State::Pending, Outcome::state)
    }

    pub(crate) fn outcome(&self) -> Option<Outcome<T>> {
        self.lock().outcome.clone()
    }

    pub(crate) fn is_abandoned(&self) -> bool {
        self.lock().abandoned
    }

    /// Fulfills the cell. Returns `false` if it had already settled.
    pub(crate) fn resolve(&self, value: T) -> bool {
        let value = Arc::new(value);
        let (callback, wakers, _unused) = {
            let mut inner = self.lock();
            if inner.outcome.is_some() {
                return false;
            }
            inner.outcome = Some(Outcome::Fulfilled(value.clone()));
            (
                inner.on_fulfilled.take(),
                mem::take(&mut inner.wakers),
                inner.on_rejected.take(),
            )
        };
        tracing::debug!(handled = callback.is_some(), "promise fulfilled");
        wake_all(wakers);
        if let Some(callback) = callback {
            callback(&value);
        }
        true
    }

    /// Rejects the cell. Returns `false` if it had already settled.
    ///
    /// When no rejection callback is registered the configured
    /// [`UnhandledPolicy`] is applied, which by default panics.
    pub(crate) fn reject(&self, rejection: Rejection) -> bool {
        let (callback, wakers, _unused) = {
            let mut inner = self.lock();
            if inner.outcome.is_some() {
                return false;
            }
            inner.outcome = Some(Outcome::Rejected(rejection.clone()));
            (
                inner.on_rejected.take(),
                mem::take(&mut inner.wakers),
                inner.on_fulfilled.take(),
            )
        };
        tracing::debug!(
            reason = rejection.reason(),
            handled = callback.is_some(),
            "promise rejected"
        );
        wake_all(wakers);
        match callback {
            Some(callback) => callback(&rejection),
            None => self.policy.report(rejection),
        }
        true
    }

    /// Registers a callback pair, replacing whatever pair was stored before.
    ///
    /// A settled cell stores nothing: the matching callback runs right away on
    /// the calling thread.
    pub(crate) fn observe(
        &self,
        on_fulfilled: Option<OnFulfilled<T>>,
        on_rejected: Option<OnRejected>,
    ) {
        let mut inner = self.lock();
        let Some(outcome) = inner.outcome.clone() else {
            let replaced = (
                mem::replace(&mut inner.on_fulfilled, on_fulfilled),
                mem::replace(&mut inner.on_rejected, on_rejected),
            );
            drop(inner);
            drop(replaced);
            return;
        };
        drop(inner);
        match outcome {
            Outcome::Fulfilled(value) => {
                if let Some(callback) = on_fulfilled {
                    callback(&value);
                }
            }
            Outcome::Rejected(rejection) => {
                if let Some(callback) = on_rejected {
                    callback(&rejection);
                }
            }
        }
    }

    /// Marks a pending cell as never going to settle and releases its waiters.
    pub(crate) fn abandon(&self) {
        let wakers = {
            let mut inner = self.lock();
            if inner.outcome.is_some() {
                return;
            }
            inner.abandoned = true;
            mem::take(&mut inner.wakers)
        };
        tracing::warn!("promise abandoned while pending");
        wake_all(wakers);
    }

    pub(crate) fn poll_settled(&self, waker: &Waker) -> Poll<Result<Arc<T>, Error>> {
        let mut inner = self.lock();
        match inner.outcome.clone() {
            Some(Outcome::Fulfilled(value)) => Poll::Ready(Ok(value)),
            Some(Outcome::Rejected(rejection)) => Poll::Ready(Err(Error::Rejected(rejection))),
            None if inner.abandoned => Poll::Ready(Err(Error::Abandoned)),
            None => {
                if !inner.wakers.iter().any(|w| w.will_wake(waker)) {
                    inner.wakers.push(waker.clone());
                }
                Poll::Pending
            }
        }
    }
}

fn wake_all(wakers: Vec<Waker>) {
    for waker in wakers {
        waker.wake()
    }
}
