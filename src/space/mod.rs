//! # Event space: handler registry and dispatcher.
//!
//! [`EventSpace`] owns the mapping from event names to priority-ordered
//! handlers and implements both call protocols.
//!
//! ## Architecture
//! ```text
//! register(handler) ──► RwLock<Registry>
//!                          event ─► priority (desc) ─► [h1, h2, ...] (FIFO)
//!
//! call(name, opts, args)
//!   ├─► snapshot = registry.read().ordered(name)   (lock released here)
//!   └─► for h in snapshot: invoke ─► push response ─► check first_response / state
//!
//! async_call(name, args)
//!   ├─► snapshot
//!   ├─► sync handlers: invoke in order
//!   └─► async handlers: join_all ─► merge back into snapshot positions
//! ```
//!
//! ## Rules
//! - Registry mutations are visible to the next dispatch only; a running
//!   dispatch iterates its own snapshot.
//! - No lock is held while handler code runs, so handlers may register and
//!   unregister (themselves included).
//! - Cloning an `EventSpace` is cheap; clones share the registry.

mod dispatch;
mod registry;

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::config::Config;
use crate::error::EventError;
use crate::handlers::{EventHandler, HandlerBuilder, HandlerHandle, OwnerToken};

pub use dispatch::CallOptions;
use registry::Registry;

struct Shared {
    cfg: Config,
    registry: RwLock<Registry>,
}

/// Registry of event handlers plus the dispatch entry points.
///
/// ## Example
/// ```rust
/// use eventspace::{Arguments, CallOptions, EventSpace};
/// use serde_json::json;
///
/// let space = EventSpace::new();
/// space.on("ping").priority(10).sync(|_call, _args| Ok(Some(json!("a"))));
/// space.on("ping").priority(5).sync(|_call, _args| Ok(None));
/// space.on("ping").priority(5).sync(|_call, _args| Ok(Some(json!("c"))));
///
/// let call = space.call("ping", CallOptions::default(), Arguments::new()).unwrap();
/// assert_eq!(call.responses(), &[Some(json!("a")), None, Some(json!("c"))]);
/// assert_eq!(call.response(), Some(&json!("a")));
/// ```
#[derive(Clone)]
pub struct EventSpace {
    shared: Arc<Shared>,
}

impl EventSpace {
    /// Creates an empty space with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty space with the given configuration.
    #[must_use]
    pub fn with_config(cfg: Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                cfg,
                registry: RwLock::new(Registry::default()),
            }),
        }
    }

    /// Configuration of this space.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// Starts a handler for `event` that is registered here when finished.
    ///
    /// The builder starts from this space's [`Config`].
    pub fn on(&self, event: impl Into<Arc<str>>) -> HandlerBuilder {
        HandlerBuilder::from_config(event.into(), &self.shared.cfg, Some(self.clone()))
    }

    /// Registers `handler` and returns its handle.
    ///
    /// Registering a handler that is already present (same id) keeps its
    /// position and replaces the stored copy, picking up a later
    /// [`with_owner`](EventHandler::with_owner) or
    /// [`with_additional_kwargs`](EventHandler::with_additional_kwargs).
    pub fn register(&self, handler: &EventHandler) -> HandlerHandle {
        let inserted = self.write().insert(handler);
        if inserted {
            tracing::debug!(
                event = handler.event(),
                priority = handler.priority(),
                handler = %handler.id(),
                is_async = handler.is_async(),
                "handler registered"
            );
        } else {
            tracing::debug!(
                handler = %handler.id(),
                "handler already registered, entry refreshed"
            );
        }
        handler.handle()
    }

    /// True if the handler identified by `handle` is registered.
    pub fn is_registered(&self, handle: &HandlerHandle) -> bool {
        self.read().contains(handle)
    }

    /// Removes one handler.
    ///
    /// # Errors
    /// [`EventError::HandlerNotFound`] if it is not registered.
    pub fn unregister(&self, handle: &HandlerHandle) -> Result<(), EventError> {
        if !self.write().remove(handle) {
            return Err(EventError::HandlerNotFound {
                event: Arc::clone(&handle.event),
                priority: handle.priority,
                handler: handle.id,
            });
        }
        tracing::debug!(event = &*handle.event, handler = %handle.id, "handler unregistered");
        Ok(())
    }

    /// Removes every handler tagged with `owner`; returns how many were removed.
    pub fn unregister_all(&self, owner: &OwnerToken) -> usize {
        let removed = self.write().remove_owned(owner);
        tracing::debug!(owner = owner.as_str(), removed, "owner handlers unregistered");
        removed
    }

    /// Handlers for `event` in dispatch order (descending priority, FIFO within).
    ///
    /// Unknown events yield an empty list.
    pub fn handlers(&self, event: &str) -> Vec<EventHandler> {
        self.read().ordered(event)
    }

    /// Sorted names of events with at least one handler.
    pub fn events(&self) -> Vec<String> {
        self.read().event_names()
    }

    /// Total number of registered handlers.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.write().clear();
    }

    pub(crate) fn downgrade(&self) -> WeakSpace {
        WeakSpace(Arc::downgrade(&self.shared))
    }

    fn read(&self) -> RwLockReadGuard<'_, Registry> {
        self.shared
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Registry> {
        self.shared
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSpace")
            .field("events", &self.events())
            .field("handlers", &self.len())
            .finish()
    }
}

/// Non-owning reference to an [`EventSpace`], held by handlers that unregister themselves.
#[derive(Clone)]
pub(crate) struct WeakSpace(Weak<Shared>);

impl WeakSpace {
    pub(crate) fn upgrade(&self) -> Option<EventSpace> {
        self.0.upgrade().map(|shared| EventSpace { shared })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Arguments;
    use serde_json::json;

    #[test]
    fn unregister_missing_is_an_error() {
        let space = EventSpace::new();
        let h = EventHandler::builder("e").sync(|_c, _a| Ok(None));
        let err = space.unregister(&h.handle()).unwrap_err();
        assert!(matches!(err, EventError::HandlerNotFound { .. }));
    }

    #[test]
    fn register_twice_does_not_duplicate() {
        let space = EventSpace::new();
        let h = EventHandler::builder("e").sync(|_c, _a| Ok(Some(json!(1))));
        space.register(&h);
        space.register(&h);
        assert_eq!(space.len(), 1);
        let call = space.emit("e", Arguments::new()).unwrap();
        assert_eq!(call.responses().len(), 1);
    }

    #[test]
    fn clones_share_registry() {
        let space = EventSpace::new();
        let other = space.clone();
        let h = other.on("e").sync(|_c, _a| Ok(None));
        assert!(space.is_registered(&h.handle()));
        assert_eq!(space.events(), vec!["e".to_string()]);
        space.clear();
        assert!(other.is_empty());
    }

    #[test]
    fn unregister_all_by_owner() {
        let space = EventSpace::new();
        space.on("a").owner("mod").sync(|_c, _a| Ok(None));
        space.on("b").owner("mod").sync(|_c, _a| Ok(None));
        let keep = space.on("a").sync(|_c, _a| Ok(None));

        assert_eq!(space.unregister_all(&OwnerToken::from("mod")), 2);
        assert_eq!(space.len(), 1);
        assert!(space.is_registered(&keep.handle()));
    }

    #[test]
    fn weak_space_does_not_keep_registry_alive() {
        let space = EventSpace::new();
        let weak = space.downgrade();
        assert!(weak.upgrade().is_some());
        drop(space);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn registration_from_many_threads() {
        let space = EventSpace::new();
        std::thread::scope(|scope| {
            for t in 0..4 {
                let space = space.clone();
                scope.spawn(move || {
                    for i in 0..25 {
                        space.on("e").priority(t * 100 + i).sync(|_c, _a| Ok(None));
                    }
                });
            }
        });
        assert_eq!(space.len(), 100);
        let priorities: Vec<i32> = space.handlers("e").iter().map(|h| h.priority()).collect();
        let mut sorted = priorities.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn dispatch_alongside_registration_and_removal() {
        let space = EventSpace::new();
        space.on("e").priority(1000).sync(|_c, _a| Ok(Some(json!("anchor"))));

        std::thread::scope(|scope| {
            for t in 0..2 {
                let space = space.clone();
                scope.spawn(move || {
                    for i in 0..50 {
                        let h = space.on("e").priority(t * 100 + i).sync(|_c, _a| Ok(None));
                        if i % 2 == 0 {
                            space.unregister(&h.handle()).unwrap();
                        }
                    }
                });
            }
            let owned = space.clone();
            scope.spawn(move || {
                for _ in 0..20 {
                    owned.on("e").owner("temp").sync(|_c, _a| Ok(None));
                    owned.unregister_all(&OwnerToken::from("temp"));
                }
            });
            for _ in 0..4 {
                let space = space.clone();
                scope.spawn(move || {
                    for _ in 0..50 {
                        let call = space.emit("e", Arguments::new()).unwrap();
                        assert_eq!(call.response(), Some(&json!("anchor")));
                        assert_eq!(call.responses()[0], Some(json!("anchor")));
                    }
                });
            }
        });

        assert_eq!(space.len(), 1 + 2 * 25);
        let call = space.emit("e", Arguments::new()).unwrap();
        assert_eq!(call.responses().len(), 51);
    }
}
