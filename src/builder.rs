use std::{sync::Arc, thread};

use crate::{
    cell::Cell,
    launcher::{self, Rejecter, Resolver},
    Error, Promise, UnhandledPolicy,
};

pub const DEFAULT_WORKER_NAME: &str = "promise-worker";

/// Configures a promise before its executor is launched.
///
/// # Examples
///
/// ```
/// use futures::executor::block_on;
/// use thread_promise::{Builder, UnhandledPolicy};
///
/// let promise = Builder::new()
///     .name("fetch")
///     .on_unhandled(UnhandledPolicy::Log)
///     .spawn(|resolve, _reject| {
///         resolve.resolve(std::thread::current().name().map(str::to_owned));
///     })
///     .expect("failed to spawn the worker");
/// let name = block_on(promise.settled()).unwrap();
/// assert_eq!(name.as_deref(), Some("fetch"));
/// ```
#[derive(Debug)]
pub struct Builder {
    name: String,
    stack_size: Option<usize>,
    policy: UnhandledPolicy,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            name: DEFAULT_WORKER_NAME.to_owned(),
            stack_size: None,
            policy: UnhandledPolicy::default(),
        }
    }

    /// Names the worker thread.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Chooses how a rejection without a registered handler is escalated.
    pub fn on_unhandled(mut self, policy: UnhandledPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Launches `executor` on a new thread and returns the promise it settles.
    ///
    /// # Errors
    ///
    /// [`Error::Spawn`] if the OS refuses to create the thread.
    pub fn spawn<T, F>(self, executor: F) -> Result<Promise<T>, Error>
    where
        T: Send + Sync + 'static,
        F: FnOnce(Resolver<T>, Rejecter<T>) + Send + 'static,
    {
        let cell = Arc::new(Cell::new(self.policy));
        let mut thread = thread::Builder::new().name(self.name);
        if let Some(size) = self.stack_size {
            thread = thread.stack_size(size);
        }
        let worker = launcher::launch(thread, cell.clone(), executor)?;
        Ok(Promise::from_parts(cell, worker))
    }
}
