//! # Call protocols.
//!
//! ## Synchronous (`call`)
//! ```text
//! EventCall::new(name, cancellable)
//! for handler in snapshot (priority desc, FIFO):
//!   ├─► response = handler.invoke(call, args)?     (errors abort the dispatch)
//!   ├─► responses.push(response)
//!   ├─► first_response && response.is_some()  ─► return
//!   └─► stopped || (cancelled && blocking)    ─► return
//! ```
//!
//! ## Concurrent (`async_call`)
//! ```text
//! snapshot ──► partition by mode
//!   ├─ sync  ─► invoke in order now                   (error: return, nothing launched)
//!   └─ async ─► all futures polled together (join_all), awaited as a group
//! merge results back into snapshot positions ─► EventCall
//! any async failure ─► EventError::AsyncDispatch after every future finished
//! ```
//!
//! `async_call` has no cancellation or first-response short-circuit: once
//! launched, concurrent handlers cannot be stopped mid-flight.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::Value;

use crate::call::{Arguments, EventCall};
use crate::error::{EventError, HandlerFailure};
use crate::space::EventSpace;

/// Flags controlling a synchronous dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// Whether handlers may cancel the call.
    pub cancellable: bool,
    /// Whether cancellation halts the remaining handlers.
    pub blocking: bool,
    /// Whether the first non-empty response halts the remaining handlers.
    pub first_response: bool,
}

impl CallOptions {
    /// Same as [`CallOptions::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets [`CallOptions::cancellable`].
    #[must_use]
    pub fn cancellable(mut self, cancellable: bool) -> Self {
        self.cancellable = cancellable;
        self
    }

    /// Sets [`CallOptions::blocking`].
    #[must_use]
    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Sets [`CallOptions::first_response`].
    #[must_use]
    pub fn first_response(mut self, first_response: bool) -> Self {
        self.first_response = first_response;
        self
    }
}

impl Default for CallOptions {
    /// Not cancellable, blocking, runs every handler.
    fn default() -> Self {
        Self {
            cancellable: false,
            blocking: true,
            first_response: false,
        }
    }
}

impl EventSpace {
    /// Dispatches `event` synchronously.
    ///
    /// Asynchronous handlers are run to completion before the next handler starts.
    /// Unknown events return an empty call.
    ///
    /// # Errors
    /// The first error raised by a handler (or by its requirement check); the
    /// remaining handlers are not run.
    pub fn call(
        &self,
        event: &str,
        opts: CallOptions,
        args: Arguments,
    ) -> Result<EventCall, EventError> {
        let mut call = EventCall::new(event, opts.cancellable);
        let handlers = self.handlers(event);
        if handlers.is_empty() {
            return Ok(call);
        }

        tracing::debug!(event, handlers = handlers.len(), ?opts, "dispatching event");
        let handle = call.handle();

        for handler in &handlers {
            tracing::trace!(
                event,
                handler = %handler.id(),
                priority = handler.priority(),
                "invoking handler"
            );
            let response = handler.invoke(&handle, &args)?;
            let produced = response.is_some();
            call.push(response);

            if opts.first_response && produced {
                break;
            }
            if handle.state().halts(opts.blocking) {
                tracing::debug!(event, state = ?handle.state(), "dispatch halted");
                break;
            }
        }

        Ok(call)
    }

    /// Dispatches `event` synchronously with [`CallOptions::default`].
    pub fn emit(&self, event: &str, args: Arguments) -> Result<EventCall, EventError> {
        self.call(event, CallOptions::default(), args)
    }

    /// Dispatches `event`, running asynchronous handlers concurrently.
    ///
    /// Synchronous handlers run first, in order. Asynchronous handlers are
    /// then all started and awaited together. Responses keep the dispatch
    /// order regardless of completion order.
    ///
    /// # Errors
    /// - An error from a synchronous handler is returned immediately; no
    ///   asynchronous handler has been started at that point.
    /// - Failures of asynchronous handlers are collected into
    ///   [`EventError::AsyncDispatch`], returned once every handler finished.
    pub async fn async_call(&self, event: &str, args: Arguments) -> Result<EventCall, EventError> {
        let mut call = EventCall::new(event, false);
        let handlers = self.handlers(event);
        if handlers.is_empty() {
            return Ok(call);
        }

        tracing::debug!(event, handlers = handlers.len(), "dispatching event concurrently");
        let handle = call.handle();
        let mut slots: Vec<Option<Value>> = vec![None; handlers.len()];
        let mut pending = Vec::new();

        for (position, handler) in handlers.iter().enumerate() {
            if handler.is_async() {
                pending.push(position);
                continue;
            }
            slots[position] = handler.invoke(&handle, &args)?;
        }

        let futures = pending
            .iter()
            .map(|&position| handlers[position].invoke_async(handle.clone(), &args));
        let results = join_all(futures).await;

        let mut failures = Vec::new();
        for (position, result) in pending.into_iter().zip(results) {
            match result {
                Ok(response) => slots[position] = response,
                Err(error) => failures.push(HandlerFailure {
                    position,
                    handler: handlers[position].id(),
                    error,
                }),
            }
        }

        if !failures.is_empty() {
            tracing::warn!(event, failed = failures.len(), "async handlers failed");
            return Err(EventError::AsyncDispatch {
                event: Arc::clone(handle.name_arc()),
                failures,
                responses: slots,
            });
        }

        call.extend(slots);
        Ok(call)
    }
}
