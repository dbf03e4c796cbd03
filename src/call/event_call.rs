//! # Result record of one dispatch.
//!
//! [`EventCall`] is built fresh by every `call`/`async_call`, collects one
//! response slot per invoked handler and is handed back to the producer.
//! Handlers never see the record itself; they get a [`CallHandle`] sharing
//! its name, flags and state.
//!
//! ## Example
//! ```rust
//! use eventspace::{CallState, EventCall};
//!
//! let call = EventCall::new("save", true);
//! call.handle().cancel().unwrap();
//! assert_eq!(call.state(), CallState::Cancelled);
//! assert!(call.response().is_none());
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::call::state::{CallState, StateCell};
use crate::error::EventError;

/// Handler-facing view of an in-flight dispatch.
///
/// Cheap to clone; every clone observes and mutates the same state.
#[derive(Clone)]
pub struct CallHandle {
    name: Arc<str>,
    cancellable: bool,
    state: Arc<StateCell>,
}

impl CallHandle {
    /// Name of the dispatched event.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether [`cancel`](Self::cancel) is allowed.
    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    /// Current state.
    pub fn state(&self) -> CallState {
        self.state.load()
    }

    /// True once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state().is_cancelled()
    }

    /// True once stopped.
    pub fn is_stopped(&self) -> bool {
        self.state().is_stopped()
    }

    /// Cancels the call. Idempotent.
    ///
    /// Handlers already running are not interrupted; blocking dispatch stops
    /// before the next handler.
    ///
    /// # Errors
    /// [`EventError::UncancellableEvent`] if the call was built with `cancellable = false`.
    pub fn cancel(&self) -> Result<(), EventError> {
        if !self.cancellable {
            return Err(EventError::UncancellableEvent {
                event: Arc::clone(&self.name),
            });
        }
        self.state.set_cancelled();
        Ok(())
    }

    /// Asks dispatch to skip all remaining handlers without cancelling the event.
    pub fn stop(&self) {
        self.state.set_stopped();
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }
}

impl fmt::Debug for CallHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallHandle")
            .field("name", &self.name)
            .field("cancellable", &self.cancellable)
            .field("state", &self.state())
            .finish()
    }
}

/// Record of one dispatch: identity, flags and collected responses.
pub struct EventCall {
    handle: CallHandle,
    responses: Vec<Option<Value>>,
}

impl EventCall {
    /// Creates an empty record in the `Active` state.
    pub fn new(name: impl Into<Arc<str>>, cancellable: bool) -> Self {
        Self {
            handle: CallHandle {
                name: name.into(),
                cancellable,
                state: Arc::new(StateCell::default()),
            },
            responses: Vec::new(),
        }
    }

    /// Returns a handle sharing this call's state.
    pub fn handle(&self) -> CallHandle {
        self.handle.clone()
    }

    /// Name of the dispatched event.
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Whether the call may be cancelled.
    pub fn is_cancellable(&self) -> bool {
        self.handle.is_cancellable()
    }

    /// Current state.
    pub fn state(&self) -> CallState {
        self.handle.state()
    }

    /// True once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    /// True once stopped.
    pub fn is_stopped(&self) -> bool {
        self.handle.is_stopped()
    }

    /// See [`CallHandle::cancel`].
    pub fn cancel(&self) -> Result<(), EventError> {
        self.handle.cancel()
    }

    /// See [`CallHandle::stop`].
    pub fn stop(&self) {
        self.handle.stop()
    }

    /// One slot per invoked handler, in invocation order. `None` = no result.
    pub fn responses(&self) -> &[Option<Value>] {
        &self.responses
    }

    /// First non-empty response, if any handler produced one.
    pub fn response(&self) -> Option<&Value> {
        self.responses.iter().find_map(Option::as_ref)
    }

    /// Consumes the record and returns its responses.
    pub fn into_responses(self) -> Vec<Option<Value>> {
        self.responses
    }

    pub(crate) fn push(&mut self, response: Option<Value>) {
        self.responses.push(response);
    }

    pub(crate) fn extend(&mut self, responses: impl IntoIterator<Item = Option<Value>>) {
        self.responses.extend(responses);
    }
}

impl fmt::Debug for EventCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCall")
            .field("name", &self.handle.name)
            .field("state", &self.state())
            .field("response", &self.response())
            .field("responses", &self.responses.len())
            .finish()
    }
}
