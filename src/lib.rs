//! A single-value promise whose executor runs on its own thread.
//!
//! [`Promise::new`] starts the executor immediately, handing it a
//! [`Resolver`] and a [`Rejecter`]. The first of them to be called settles
//! the promise; every later call is a no-op. Consumers register callbacks
//! with [`Promise::then`], [`Promise::catch_error`] or [`Promise::observe`],
//! or await [`Promise::settled`].
//!
//! A panic inside the executor rejects the promise with the panic message.
//! A rejection that finds no rejection callback registered is an
//! [`UnhandledRejection`] and is escalated according to the promise's
//! [`UnhandledPolicy`] (by default, a panic on the settling thread).
//!
//! ```
//! use thread_promise::Promise;
//! use std::{sync::mpsc::channel, time::Duration};
//!
//! let (go, wait) = channel::<()>();
//! let promise = Promise::<i32>::new(move |_resolve, reject| {
//!     wait.recv().unwrap();
//!     reject.reject("I don't want this promise");
//! });
//! let (tx, rx) = channel();
//! promise.catch_error(move |rejection| tx.send(rejection.to_string()).unwrap());
//! go.send(()).unwrap();
//! assert_eq!(
//!     rx.recv_timeout(Duration::from_secs(5)).unwrap(),
//!     "I don't want this promise"
//! );
//! ```

mod builder;
mod cell;
mod error;
mod launcher;
mod promise;
mod settled;
mod unhandled;

pub use builder::{Builder, DEFAULT_WORKER_NAME};
pub use cell::State;
pub use error::{Error, Rejection, UnhandledRejection, NON_STANDARD_FAULT, UNSPECIFIED_REASON};
pub use launcher::{Rejecter, Resolver};
pub use promise::{Promise, Snapshot};
pub use settled::Settled;
pub use unhandled::{UnhandledHook, UnhandledPolicy};
