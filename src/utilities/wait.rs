//! # One-shot waiting for an event.
//!
//! [`EventSpace::wait_for`] and [`EventSpace::wait_for_async`] register a
//! handler that fires once, captures the call's arguments, removes itself
//! from the space and wakes the waiter.
//!
//! ```text
//! waiter ──► register once-handler ──► block / await
//! producer ──► call(event) ──► once-handler: take sink, unregister self, send args
//! waiter ◄── Arguments
//! ```
//!
//! Later calls that still hold the handler in their snapshot see an empty
//! response from it.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::call::Arguments;
use crate::error::EventError;
use crate::handlers::{EventHandler, HandlerHandle};
use crate::space::EventSpace;

impl EventSpace {
    /// Blocks the current thread until `event` is called once; returns the call's arguments.
    ///
    /// `timeout = None` waits forever. Do not call from an async task; use
    /// [`wait_for_async`](Self::wait_for_async) there.
    ///
    /// # Errors
    /// - [`EventError::WaitTimeout`] if the timeout elapsed first.
    /// - [`EventError::HandlerNotFound`] if the waiting handler was removed
    ///   (e.g. by [`clear`](Self::clear)) before the event fired.
    pub fn wait_for(
        &self,
        event: &str,
        timeout: Option<Duration>,
    ) -> Result<Arguments, EventError> {
        let (tx, rx) = mpsc::sync_channel::<Arguments>(1);
        let handle = self.register_once(event, move |args| {
            let _ = tx.send(args);
        });

        let received = match timeout {
            Some(t) => rx.recv_timeout(t),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(args) => Ok(args),
            Err(RecvTimeoutError::Timeout) => {
                match self.expire(&handle, timeout.unwrap_or_default()) {
                    Some(err) => Err(err),
                    None => rx.recv().map_err(|_| not_found(&handle)),
                }
            }
            Err(RecvTimeoutError::Disconnected) => Err(not_found(&handle)),
        }
    }

    /// Waits asynchronously until `event` is called once; returns the call's arguments.
    ///
    /// # Errors
    /// Same as [`wait_for`](Self::wait_for).
    pub async fn wait_for_async(
        &self,
        event: &str,
        timeout: Option<Duration>,
    ) -> Result<Arguments, EventError> {
        let (tx, mut rx) = oneshot::channel::<Arguments>();
        let handle = self.register_once(event, move |args| {
            let _ = tx.send(args);
        });

        let received = match timeout {
            Some(t) => match tokio::time::timeout(t, &mut rx).await {
                Ok(result) => result,
                Err(_) => match self.expire(&handle, t) {
                    Some(err) => return Err(err),
                    None => rx.await,
                },
            },
            None => rx.await,
        };

        received.map_err(|_| not_found(&handle))
    }

    /// Removes a waiting handler whose deadline passed.
    ///
    /// Returns `None` if the handler was already gone: it fired after the
    /// deadline (its sink is sending or done) or was removed by someone else,
    /// so the waiter must drain its channel instead of reporting a timeout.
    fn expire(&self, handle: &HandlerHandle, timeout: Duration) -> Option<EventError> {
        self.unregister(handle).ok()?;
        Some(EventError::WaitTimeout {
            event: Arc::clone(&handle.event),
            timeout,
        })
    }

    /// Registers a handler that passes the first invocation's arguments to `sink`
    /// and unregisters itself.
    ///
    /// Only the returned handle is kept by the caller: dropping the handler
    /// from the registry drops `sink`, which the waiter observes as disconnection.
    fn register_once<S>(&self, event: &str, sink: S) -> HandlerHandle
    where
        S: FnOnce(Arguments) + Send + 'static,
    {
        let sink = Mutex::new(Some(sink));
        let own: Arc<OnceLock<HandlerHandle>> = Arc::new(OnceLock::new());
        let cell = Arc::clone(&own);
        let space = self.downgrade();

        let handler = EventHandler::builder(event)
            .priority(self.config().default_priority)
            .sync(move |_call, args| {
                let taken = sink.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(sink) = taken {
                    if let (Some(space), Some(handle)) = (space.upgrade(), cell.get()) {
                        let _ = space.unregister(handle);
                    }
                    sink(args.clone());
                }
                Ok(None)
            });

        let handle = handler.handle();
        let _ = own.set(handle.clone());
        self.register(&handler);
        handle
    }
}

fn not_found(handle: &HandlerHandle) -> EventError {
    EventError::HandlerNotFound {
        event: Arc::clone(&handle.event),
        priority: handle.priority,
        handler: handle.id,
    }
}
