//! # Objects that own a group of handlers.
//!
//! [`EventSupport`] is the extension point for types that offer several
//! handlers at once. The type lists its handlers explicitly in
//! [`handler_specs`](EventSupport::handler_specs), usually built with
//! [`HandlerBuilder::sync_method`](crate::HandlerBuilder::sync_method) so the
//! instance reaches each handler as its first argument.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use eventspace::{Arguments, EventHandler, EventSpace, EventSupport, OwnerToken};
//! use serde_json::json;
//!
//! struct Stats {
//!     hits: AtomicU64,
//! }
//!
//! impl EventSupport for Stats {
//!     fn owner_token(&self) -> OwnerToken {
//!         OwnerToken::from("stats")
//!     }
//!
//!     fn handler_specs(self: Arc<Self>) -> Vec<EventHandler> {
//!         vec![EventHandler::builder("hit").sync_method(self, |this, _call, _args| {
//!             let n = this.hits.fetch_add(1, Ordering::Relaxed) + 1;
//!             Ok(Some(json!(n)))
//!         })]
//!     }
//! }
//!
//! let space = EventSpace::new();
//! let stats = Arc::new(Stats { hits: AtomicU64::new(0) });
//! Arc::clone(&stats).register_events(&space);
//!
//! space.emit("hit", Arguments::new()).unwrap();
//! assert_eq!(stats.hits.load(Ordering::Relaxed), 1);
//!
//! assert_eq!(stats.unregister_events(&space), 1);
//! assert!(space.is_empty());
//! ```

use std::sync::Arc;

use crate::handlers::{EventHandler, HandlerHandle, OwnerToken};
use crate::space::EventSpace;

/// A type that declares a set of handlers and an owner token for them.
pub trait EventSupport: Send + Sync + 'static {
    /// Token identifying this instance's handlers.
    fn owner_token(&self) -> OwnerToken;

    /// Handlers this instance offers.
    fn handler_specs(self: Arc<Self>) -> Vec<EventHandler>;

    /// Tags every handler with [`owner_token`](Self::owner_token) and registers it.
    fn register_events(self: Arc<Self>, space: &EventSpace) -> Vec<HandlerHandle> {
        let owner = self.owner_token();
        let handles: Vec<HandlerHandle> = self
            .handler_specs()
            .into_iter()
            .map(|handler| space.register(&handler.with_owner(owner.clone())))
            .collect();
        tracing::debug!(
            owner = owner.as_str(),
            handlers = handles.len(),
            "owner handlers registered"
        );
        handles
    }

    /// Removes every handler registered under [`owner_token`](Self::owner_token).
    fn unregister_events(&self, space: &EventSpace) -> usize {
        space.unregister_all(&self.owner_token())
    }
}
