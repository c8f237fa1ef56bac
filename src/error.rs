use std::{fmt, sync::Arc};

/// Reason used when a promise is rejected without one.
pub const UNSPECIFIED_REASON: &str = "unspecified reason";

/// Reason used when the executor panics with a payload that is not text.
pub const NON_STANDARD_FAULT: &str = "non-standard fault";

/// The reason a promise was rejected.
///
/// Cloning is cheap: the text is shared.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Rejection {
    reason: Arc<str>,
}

impl Rejection {
    pub fn new(reason: impl Into<String>) -> Self {
        let reason: String = reason.into();
        Self {
            reason: reason.into(),
        }
    }

    pub fn unspecified() -> Self {
        Self::new(UNSPECIFIED_REASON)
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Default for Rejection {
    fn default() -> Self {
        Self::unspecified()
    }
}

impl fmt::Debug for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Rejection").field(&self.reason()).finish()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl From<&str> for Rejection {
    fn from(reason: &str) -> Self {
        Self::new(reason)
    }
}

impl From<String> for Rejection {
    fn from(reason: String) -> Self {
        Self::new(reason)
    }
}

/// A rejection that settled while no rejection callback was registered.
///
/// With the default [`UnhandledPolicy::Panic`](crate::UnhandledPolicy::Panic)
/// this value is the panic payload of the settling thread.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unhandled promise rejection: {rejection}")]
pub struct UnhandledRejection {
    rejection: Rejection,
}

impl UnhandledRejection {
    pub(crate) fn new(rejection: Rejection) -> Self {
        Self { rejection }
    }

    pub fn rejection(&self) -> &Rejection {
        &self.rejection
    }

    pub fn reason(&self) -> &str {
        self.rejection.reason()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OS refused to create the worker thread.
    #[error("failed to spawn promise worker: {0}")]
    Spawn(#[from] std::io::Error),
    /// The promise settled with a rejection.
    #[error("promise rejected: {0}")]
    Rejected(Rejection),
    /// Every resolver and rejecter was dropped before the promise settled.
    #[error("promise abandoned: executor dropped its resolver and rejecter without settling")]
    Abandoned,
    /// The worker was brought down by a rejection nobody handled.
    #[error(transparent)]
    UnhandledRejection(#[from] UnhandledRejection),
    /// The worker panicked for any other reason, such as a callback panicking
    /// after the promise settled.
    #[error("promise worker panicked: {0}")]
    WorkerPanicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rejection_is_unspecified() {
        assert_eq!(Rejection::default().reason(), "unspecified reason");
    }

    #[test]
    fn test_unhandled_rejection_message_carries_reason() {
        let fault = UnhandledRejection::new("boom".into());
        assert_eq!(fault.to_string(), "unhandled promise rejection: boom");
        assert_eq!(fault.reason(), "boom");
        let err: Error = fault.into();
        assert_eq!(err.to_string(), "unhandled promise rejection: boom");
    }
}
