//! Error types raised by the event space and by handlers.
//!
//! Everything fallible in this crate returns [`EventError`]. Handler bodies
//! return it as well, so a handler can use `?` on [`CallHandle::cancel`]
//! and the original variant reaches the caller of `call`/`async_call`.
//!
//! All variants provide [`EventError::as_label`] for logs/metrics.
//!
//! [`CallHandle::cancel`]: crate::CallHandle::cancel

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::handlers::HandlerId;

/// One failed asynchronous handler inside a grouped [`EventError::AsyncDispatch`].
#[derive(Debug)]
pub struct HandlerFailure {
    /// Position of the handler in the ordered dispatch list.
    pub position: usize,
    /// Identity of the failed handler.
    pub handler: HandlerId,
    /// The error it produced.
    pub error: EventError,
}

/// # Errors produced by the event space.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EventError {
    /// `cancel()` was called on a call constructed with `cancellable = false`.
    #[error("{event} is not a cancellable event")]
    UncancellableEvent {
        /// Name of the event being dispatched.
        event: Arc<str>,
    },

    /// A handler's execution requirement did not match the call's keywords.
    #[error("handler {handler} on {event}: requirement {key:?} unfulfilled (expected {expected}, got {actual:?})")]
    UnfulfilledRequirement {
        /// Event the handler is bound to.
        event: Arc<str>,
        /// Handler whose requirement failed.
        handler: HandlerId,
        /// Keyword name of the requirement.
        key: String,
        /// Value the handler requires.
        expected: Value,
        /// Value supplied by the call, if any.
        actual: Option<Value>,
    },

    /// `unregister` was called for a handler that is not in the registry.
    #[error("handler {handler} not registered on {event} (priority {priority})")]
    HandlerNotFound {
        /// Event the handler claims to be bound to.
        event: Arc<str>,
        /// Priority bucket searched.
        priority: i32,
        /// Handler identity.
        handler: HandlerId,
    },

    /// A handler body failed.
    #[error("handler failed: {message}")]
    Handler {
        /// Failure message.
        message: String,
    },

    /// One or more asynchronous handlers failed during `async_call`.
    ///
    /// Raised only after every asynchronous handler of the dispatch finished.
    #[error("{} async handler(s) failed on {event}", failures.len())]
    AsyncDispatch {
        /// Name of the dispatched event.
        event: Arc<str>,
        /// Failed handlers, in dispatch order.
        failures: Vec<HandlerFailure>,
        /// Responses gathered, in dispatch order; failed slots are `None`.
        responses: Vec<Option<Value>>,
    },

    /// `wait_for` gave up before the event was called.
    #[error("timed out after {timeout:?} waiting for {event}")]
    WaitTimeout {
        /// Awaited event.
        event: Arc<str>,
        /// Configured timeout.
        timeout: Duration,
    },

    /// A runtime to drive an async handler from synchronous dispatch could not be built.
    #[error("failed to drive async handler: {message}")]
    Runtime {
        /// Underlying error message.
        message: String,
    },
}

impl EventError {
    /// Builds a [`EventError::Handler`] from any message.
    ///
    /// # Example
    /// ```
    /// use eventspace::EventError;
    ///
    /// let err = EventError::handler("boom");
    /// assert_eq!(err.to_string(), "handler failed: boom");
    /// ```
    pub fn handler(message: impl Into<String>) -> Self {
        EventError::Handler {
            message: message.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventspace::EventError;
    ///
    /// let err = EventError::UncancellableEvent { event: "ping".into() };
    /// assert_eq!(err.as_label(), "event_uncancellable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EventError::UncancellableEvent { .. } => "event_uncancellable",
            EventError::UnfulfilledRequirement { .. } => "handler_requirement_unfulfilled",
            EventError::HandlerNotFound { .. } => "handler_not_found",
            EventError::Handler { .. } => "handler_failed",
            EventError::AsyncDispatch { .. } => "async_dispatch_failed",
            EventError::WaitTimeout { .. } => "wait_timeout",
            EventError::Runtime { .. } => "runtime_unavailable",
        }
    }

    /// True if the error was produced by a handler body rather than by the space.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, EventError::Handler { .. } | EventError::AsyncDispatch { .. })
    }
}
