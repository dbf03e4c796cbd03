//! # Queueing handler: hand calls over to an async consumer.
//!
//! [`EventSpace::queue`] registers a handler that pushes each invocation's
//! [`Arguments`] into a bounded channel and returns immediately.
//!
//! ```text
//! call(event) ──► queue handler ── try_send ──► [bounded queue] ──► EventQueue::recv().await
//!                       │
//!                       └─ full   ─► drop item (warn)
//! ```
//!
//! ## Rules
//! - Dispatch never waits for the consumer.
//! - FIFO per queue.
//! - Dropping the [`EventQueue`] unregisters its handler.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::call::Arguments;
use crate::error::EventError;
use crate::handlers::{EventHandler, HandlerHandle};
use crate::space::{EventSpace, WeakSpace};

/// Consumer side of a queueing handler.
pub struct EventQueue {
    handle: HandlerHandle,
    rx: mpsc::Receiver<Arguments>,
    space: WeakSpace,
}

impl EventQueue {
    /// Next queued arguments; `None` once the handler is gone and the queue drained.
    pub async fn recv(&mut self) -> Option<Arguments> {
        self.rx.recv().await
    }

    /// Next queued arguments without waiting.
    pub fn try_recv(&mut self) -> Option<Arguments> {
        self.rx.try_recv().ok()
    }

    /// Number of items waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// True if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Handle of the queueing handler.
    pub fn handle(&self) -> &HandlerHandle {
        &self.handle
    }

    /// Unregisters the handler; items already queued stay readable.
    ///
    /// # Errors
    /// [`EventError::HandlerNotFound`] if the handler was already removed.
    pub fn close(&mut self) -> Result<(), EventError> {
        match self.space.upgrade() {
            Some(space) => space.unregister(&self.handle),
            None => Ok(()),
        }
    }
}

impl Drop for EventQueue {
    fn drop(&mut self) {
        if let Some(space) = self.space.upgrade() {
            let _ = space.unregister(&self.handle);
        }
    }
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("handle", &self.handle)
            .field("queued", &self.rx.len())
            .finish()
    }
}

impl EventSpace {
    /// Registers a queueing handler for `event` and returns its consumer.
    ///
    /// Capacity comes from [`Config::queue_capacity`](crate::Config::queue_capacity);
    /// when the queue is full, the invocation is dropped for this queue.
    pub fn queue(&self, event: &str) -> EventQueue {
        let (tx, rx) = mpsc::channel::<Arguments>(self.config().queue_capacity_clamped());
        let name: Arc<str> = Arc::from(event);

        let handler = EventHandler::builder(Arc::clone(&name))
            .priority(self.config().default_priority)
            .sync(move |_call, args| {
                match tx.try_send(args.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::warn!(event = &*name, "queue full, dropping call");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        tracing::debug!(event = &*name, "queue closed, dropping call");
                    }
                }
                Ok(None)
            });

        let handle = self.register(&handler);
        EventQueue {
            handle,
            rx,
            space: self.downgrade(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use serde_json::json;

    #[tokio::test]
    async fn queued_calls_arrive_in_order() {
        let space = EventSpace::new();
        let mut queue = space.queue("job");

        for i in 0..3 {
            let call = space.emit("job", Arguments::new().arg(i)).unwrap();
            assert_eq!(call.responses(), &[None]);
        }

        for i in 0..3 {
            let args = queue.recv().await.unwrap();
            assert_eq!(args.get(0), Some(&json!(i)));
        }
        assert!(queue.try_recv().is_none());
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        let space = EventSpace::with_config(Config {
            queue_capacity: 2,
            ..Config::default()
        });
        let mut queue = space.queue("job");

        for i in 0..5 {
            space.emit("job", Arguments::new().arg(i)).unwrap();
        }

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_recv().unwrap().get(0), Some(&json!(0)));
        assert_eq!(queue.try_recv().unwrap().get(0), Some(&json!(1)));
        assert!(queue.is_empty());
    }

    #[test]
    fn dropping_queue_unregisters_handler() {
        let space = EventSpace::new();
        let queue = space.queue("job");
        let handle = queue.handle().clone();
        assert!(space.is_registered(&handle));
        drop(queue);
        assert!(!space.is_registered(&handle));
    }

    #[tokio::test]
    async fn close_keeps_queued_items_then_ends() {
        let space = EventSpace::new();
        let mut queue = space.queue("job");
        space.emit("job", Arguments::new().arg("kept")).unwrap();

        queue.close().unwrap();
        assert!(queue.close().is_err());

        assert_eq!(queue.recv().await.unwrap().get(0), Some(&json!("kept")));
        assert!(queue.recv().await.is_none());
    }
}
