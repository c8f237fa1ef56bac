//! Escalation of rejections that nobody was listening for.
//!
//! A fulfilled promise nobody observed is harmless: the value can still be
//! read later. A rejected one is not, so the first rejection that finds the
//! rejection slot empty is reported here, once, outside the cell's guard.

use std::{
    fmt,
    io::{self, Write},
    sync::Arc,
    thread,
};

use crate::{Rejection, UnhandledRejection};

pub type UnhandledHook = Arc<dyn Fn(&UnhandledRejection) + Send + Sync>;

/// What to do after an unhandled rejection has been logged.
#[derive(Clone, Default)]
pub enum UnhandledPolicy {
    /// Panic on the settling thread with the [`UnhandledRejection`] as payload.
    #[default]
    Panic,
    /// Log only.
    Log,
    /// Hand the fault to a caller-supplied reporter.
    Hook(UnhandledHook),
}

impl UnhandledPolicy {
    pub fn hook(hook: impl Fn(&UnhandledRejection) + Send + Sync + 'static) -> Self {
        Self::Hook(Arc::new(hook))
    }

    pub(crate) fn report(&self, rejection: Rejection) {
        let fault = UnhandledRejection::new(rejection);
        tracing::error!(reason = fault.reason(), "unhandled promise rejection");
        match self {
            Self::Panic => {
                // The default panic hook prints a non-text payload as
                // `Box<dyn Any>`, so the reason goes to stderr first.
                let _ = write_fault(&mut io::stderr().lock(), &fault);
                std::panic::panic_any(fault)
            }
            Self::Log => {}
            Self::Hook(hook) => hook(&fault),
        }
    }
}

fn write_fault(out: &mut impl Write, fault: &UnhandledRejection) -> io::Result<()> {
    let current = thread::current();
    writeln!(
        out,
        "thread '{}' raised {fault}",
        current.name().unwrap_or("<unnamed>")
    )
}

impl fmt::Debug for UnhandledPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panic => f.write_str("Panic"),
            Self::Log => f.write_str("Log"),
            Self::Hook(_) => f.write_str("Hook(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_hook_receives_reason() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let policy = UnhandledPolicy::hook(move |fault| {
            sink.lock().unwrap().push(fault.reason().to_owned());
        });
        policy.report("boom".into());
        assert_eq!(*seen.lock().unwrap(), vec!["boom".to_owned()]);
    }

    #[test]
    fn test_panic_payload_is_unhandled_rejection() {
        let payload = std::panic::catch_unwind(|| UnhandledPolicy::Panic.report("boom".into()))
            .expect_err("the panic policy must panic");
        let fault = payload
            .downcast::<UnhandledRejection>()
            .expect("payload should be the fault itself");
        assert_eq!(fault.reason(), "boom");
        assert_eq!(fault.to_string(), "unhandled promise rejection: boom");
    }

    #[test]
    fn test_fault_message_names_thread_and_reason() {
        let written = thread::Builder::new()
            .name("promise-worker".into())
            .spawn(|| {
                let mut out = Vec::new();
                write_fault(&mut out, &UnhandledRejection::new("boom-reason-text".into())).unwrap();
                String::from_utf8(out).unwrap()
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(
            written,
            "thread 'promise-worker' raised unhandled promise rejection: boom-reason-text\n"
        );
    }

    #[test]
    fn test_log_policy_is_quiet() {
        UnhandledPolicy::Log.report(Rejection::unspecified());
    }
}
