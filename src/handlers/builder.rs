//! # Fluent construction of [`EventHandler`]s.
//!
//! The execution mode is chosen by the finishing method:
//! [`sync`](HandlerBuilder::sync) or [`asynchronous`](HandlerBuilder::asynchronous)
//! (plus the `*_method` variants that bind an owning instance).
//!
//! A builder obtained from [`EventSpace::on`] starts from the space's
//! [`Config`](crate::Config) and registers the handler when finished.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use eventspace::{Arguments, EventHandler, EventSpace};
//!
//! let space = EventSpace::new();
//!
//! // Built detached, registered explicitly:
//! let greet = EventHandler::builder("greet")
//!     .priority(10)
//!     .sync(|_call, args| Ok(args.get(0).cloned()));
//! space.register(&greet);
//!
//! // Built and registered in one go:
//! space.on("greet").sync(|_call, _args| Ok(Some(json!("fallback"))));
//!
//! let call = space.emit("greet", Arguments::new().arg("hi")).unwrap();
//! assert_eq!(call.responses(), &[Some(json!("hi")), Some(json!("fallback"))]);
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;

use crate::call::{Arguments, CallHandle, Kwargs};
use crate::config::Config;
use crate::handlers::handler::{EventHandler, HandlerFn, HandlerParts, HandlerResult, OwnerToken};
use crate::space::EventSpace;

/// Builder for [`EventHandler`].
#[must_use]
pub struct HandlerBuilder {
    event: Arc<str>,
    priority: i32,
    requirements: Kwargs,
    requirement_exceptions: bool,
    additional_kwargs: Kwargs,
    owner: Option<OwnerToken>,
    space: Option<EventSpace>,
}

impl HandlerBuilder {
    /// Detached builder with default settings.
    pub fn new(event: impl Into<Arc<str>>) -> Self {
        Self::from_config(event.into(), &Config::default(), None)
    }

    pub(crate) fn from_config(event: Arc<str>, cfg: &Config, space: Option<EventSpace>) -> Self {
        Self {
            event,
            priority: cfg.default_priority,
            requirements: Kwargs::new(),
            requirement_exceptions: cfg.requirement_exceptions,
            additional_kwargs: Kwargs::new(),
            owner: None,
            space,
        }
    }

    /// Sets the priority; higher runs first.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Requires the call keyword `key` to equal `value`.
    pub fn requires(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.requirements.insert(key.into(), value.into());
        self
    }

    /// Whether an unmet requirement raises `UnfulfilledRequirement`.
    pub fn requirement_exceptions(mut self, enabled: bool) -> Self {
        self.requirement_exceptions = enabled;
        self
    }

    /// Adds a keyword passed on every invocation unless the call overrides it.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_kwargs.insert(key.into(), value.into());
        self
    }

    /// Tags the handler with an owner for bulk unregistration.
    pub fn owner(mut self, owner: impl Into<OwnerToken>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Finishes with a synchronous function.
    pub fn sync<F>(self, f: F) -> EventHandler
    where
        F: Fn(&CallHandle, &Arguments) -> HandlerResult + Send + Sync + 'static,
    {
        self.finish(HandlerFn::Sync(Arc::new(f)))
    }

    /// Finishes with an asynchronous function.
    ///
    /// The closure creates a fresh future per invocation.
    pub fn asynchronous<F, Fut>(self, f: F) -> EventHandler
    where
        F: Fn(CallHandle, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.finish(HandlerFn::Async(Arc::new(move |call, args| {
            f(call, args).boxed()
        })))
    }

    /// Finishes with a synchronous function receiving `instance` first.
    ///
    /// The handler keeps `instance` alive until it is dropped from every registry.
    pub fn sync_method<T, F>(self, instance: Arc<T>, f: F) -> EventHandler
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &CallHandle, &Arguments) -> HandlerResult + Send + Sync + 'static,
    {
        self.sync(move |call, args| f(&instance, call, args))
    }

    /// Finishes with an asynchronous function receiving `instance` first.
    pub fn async_method<T, F, Fut>(self, instance: Arc<T>, f: F) -> EventHandler
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>, CallHandle, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.asynchronous(move |call, args| f(Arc::clone(&instance), call, args))
    }

    fn finish(self, function: HandlerFn) -> EventHandler {
        let handler = EventHandler::from_parts(HandlerParts {
            event: self.event,
            priority: self.priority,
            function,
            requirements: self.requirements,
            requirement_exceptions: self.requirement_exceptions,
            additional_kwargs: self.additional_kwargs,
            owner: self.owner,
        });
        if let Some(space) = self.space {
            space.register(&handler);
        }
        handler
    }
}

impl EventHandler {
    /// Starts building a detached handler for `event`.
    pub fn builder(event: impl Into<Arc<str>>) -> HandlerBuilder {
        HandlerBuilder::new(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Counter {
        step: i64,
    }

    #[test]
    fn detached_builder_uses_defaults() {
        let h = EventHandler::builder("e").sync(|_c, _a| Ok(None));
        assert_eq!(h.priority(), 0);
        assert!(!h.requirement_exceptions());
        assert!(h.owner().is_none());
        assert!(!h.is_async());
    }

    #[test]
    fn on_uses_space_config_and_registers() {
        let space = EventSpace::with_config(Config {
            default_priority: 7,
            requirement_exceptions: true,
            ..Config::default()
        });
        let h = space.on("e").sync(|_c, _a| Ok(None));
        assert_eq!(h.priority(), 7);
        assert!(h.requirement_exceptions());
        assert!(space.is_registered(&h.handle()));
    }

    #[test]
    fn sync_method_binds_instance() {
        let counter = Arc::new(Counter { step: 3 });
        let h = EventHandler::builder("add").sync_method(counter, |this, _call, args| {
            let base = args.get(0).and_then(Value::as_i64).unwrap_or(0);
            Ok(Some(json!(base + this.step)))
        });
        let call = crate::EventCall::new("add", false);
        assert_eq!(
            h.invoke(&call.handle(), &Arguments::new().arg(4)).unwrap(),
            Some(json!(7))
        );
    }

    #[tokio::test]
    async fn async_method_binds_instance() {
        let counter = Arc::new(Counter { step: 10 });
        let h = EventHandler::builder("add").async_method(counter, |this, _call, _args| async move {
            Ok(Some(json!(this.step)))
        });
        assert!(h.is_async());
        let call = crate::EventCall::new("add", false);
        let out = h.invoke_async(call.handle(), &Arguments::new()).await.unwrap();
        assert_eq!(out, Some(json!(10)));
    }
}
