//! # Handler registration records.
//!
//! An [`EventHandler`] binds a function to an event name together with a
//! priority, keyword requirements, default keywords and an optional owner.
//! It is cheap to clone (`Arc` inside); clones share one [`HandlerId`], which
//! is the identity the registry uses.
//!
//! ## Invocation contract
//! ```text
//! invoke(call, args)
//!   ├─► merge: additional kwargs, then call kwargs on top (call wins)
//!   ├─► every requirement key present and equal?
//!   │      ├─ no, requirement_exceptions = true  ─► Err(UnfulfilledRequirement)
//!   │      └─ no, requirement_exceptions = false ─► Ok(None), function not called
//!   └─► run function(call, merged)
//!          ├─ Sync  ─► direct call
//!          └─ Async ─► awaited (async path) or driven to completion (sync path)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;

use crate::call::{Arguments, CallHandle, Kwargs};
use crate::error::EventError;
use crate::handlers::blocking;

/// What a handler body returns: `Ok(None)` means "no result".
pub type HandlerResult = Result<Option<Value>, EventError>;

pub(crate) type SyncFn = dyn Fn(&CallHandle, &Arguments) -> HandlerResult + Send + Sync;
pub(crate) type AsyncFn =
    dyn Fn(CallHandle, Arguments) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// Global handler id counter.
static HANDLER_SEQ: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub(crate) fn next() -> Self {
        Self(HANDLER_SEQ.fetch_add(1, Ordering::Relaxed))
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of whoever registered a group of handlers (module, component, object).
///
/// Used by [`EventSpace::unregister_all`](crate::EventSpace::unregister_all).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerToken(Arc<str>);

impl OwnerToken {
    /// Creates a token from any name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Token name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OwnerToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for OwnerToken {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lightweight reference to a registered handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerHandle {
    /// Handler identity.
    pub id: HandlerId,
    /// Event the handler is bound to.
    pub event: Arc<str>,
    /// Priority bucket.
    pub priority: i32,
}

/// Function behind a handler, with its declared execution mode.
#[derive(Clone)]
pub(crate) enum HandlerFn {
    Sync(Arc<SyncFn>),
    Async(Arc<AsyncFn>),
}

#[derive(Clone)]
struct Inner {
    id: HandlerId,
    event: Arc<str>,
    priority: i32,
    function: HandlerFn,
    requirements: Kwargs,
    requirement_exceptions: bool,
    additional_kwargs: Kwargs,
    owner: Option<OwnerToken>,
}

/// A function bound to an event, ready to be registered in an [`EventSpace`](crate::EventSpace).
///
/// Build one with [`EventHandler::builder`] or [`EventSpace::on`](crate::EventSpace::on).
#[derive(Clone)]
pub struct EventHandler {
    inner: Arc<Inner>,
}

pub(crate) struct HandlerParts {
    pub(crate) event: Arc<str>,
    pub(crate) priority: i32,
    pub(crate) function: HandlerFn,
    pub(crate) requirements: Kwargs,
    pub(crate) requirement_exceptions: bool,
    pub(crate) additional_kwargs: Kwargs,
    pub(crate) owner: Option<OwnerToken>,
}

impl EventHandler {
    pub(crate) fn from_parts(parts: HandlerParts) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: HandlerId::next(),
                event: parts.event,
                priority: parts.priority,
                function: parts.function,
                requirements: parts.requirements,
                requirement_exceptions: parts.requirement_exceptions,
                additional_kwargs: parts.additional_kwargs,
                owner: parts.owner,
            }),
        }
    }

    /// Identity shared by all clones.
    pub fn id(&self) -> HandlerId {
        self.inner.id
    }

    /// Event name the handler listens to.
    pub fn event(&self) -> &str {
        &self.inner.event
    }

    /// Priority (higher runs first).
    pub fn priority(&self) -> i32 {
        self.inner.priority
    }

    /// True if the function was declared asynchronous.
    pub fn is_async(&self) -> bool {
        matches!(self.inner.function, HandlerFn::Async(_))
    }

    /// Keyword values a call must carry for the function to run.
    pub fn requirements(&self) -> &Kwargs {
        &self.inner.requirements
    }

    /// Whether unmet requirements raise instead of yielding no result.
    pub fn requirement_exceptions(&self) -> bool {
        self.inner.requirement_exceptions
    }

    /// Keywords merged under every call's keywords.
    pub fn additional_kwargs(&self) -> &Kwargs {
        &self.inner.additional_kwargs
    }

    /// Owner, if the handler belongs to a group.
    pub fn owner(&self) -> Option<&OwnerToken> {
        self.inner.owner.as_ref()
    }

    /// Handle identifying this handler in a registry.
    pub fn handle(&self) -> HandlerHandle {
        HandlerHandle {
            id: self.inner.id,
            event: Arc::clone(&self.inner.event),
            priority: self.inner.priority,
        }
    }

    /// Returns the same handler (same id) tagged with `owner`.
    #[must_use]
    pub fn with_owner(mut self, owner: OwnerToken) -> Self {
        Arc::make_mut(&mut self.inner).owner = Some(owner);
        self
    }

    /// Returns the same handler (same id) with `extra` merged into its additional kwargs.
    ///
    /// Existing keys are overwritten by `extra`.
    #[must_use]
    pub fn with_additional_kwargs(mut self, extra: Kwargs) -> Self {
        let inner = Arc::make_mut(&mut self.inner);
        for (k, v) in extra {
            inner.additional_kwargs.insert(k, v);
        }
        self
    }

    pub(crate) fn is_owned_by(&self, owner: &OwnerToken) -> bool {
        self.inner.owner.as_ref() == Some(owner)
    }

    /// Merges keywords and checks requirements.
    ///
    /// `Ok(None)` means the function must be skipped.
    fn prepare(&self, args: &Arguments) -> Result<Option<Arguments>, EventError> {
        let merged = args.merged_over(&self.inner.additional_kwargs);

        for (key, expected) in &self.inner.requirements {
            let actual = merged.keywords.get(key);
            if actual == Some(expected) {
                continue;
            }
            if self.inner.requirement_exceptions {
                tracing::warn!(
                    event = %self.inner.event,
                    handler = %self.inner.id,
                    key = key.as_str(),
                    "handler requirement unfulfilled"
                );
                return Err(EventError::UnfulfilledRequirement {
                    event: Arc::clone(&self.inner.event),
                    handler: self.inner.id,
                    key: key.clone(),
                    expected: expected.clone(),
                    actual: actual.cloned(),
                });
            }
            tracing::trace!(
                event = %self.inner.event,
                handler = %self.inner.id,
                key = key.as_str(),
                "requirement not met, skipping handler"
            );
            return Ok(None);
        }

        Ok(Some(merged))
    }

    /// Invokes the handler, blocking until it finishes.
    ///
    /// Asynchronous functions are driven to completion on the calling thread.
    pub fn invoke(&self, call: &CallHandle, args: &Arguments) -> HandlerResult {
        let Some(merged) = self.prepare(args)? else {
            return Ok(None);
        };
        match &self.inner.function {
            HandlerFn::Sync(f) => f(call, &merged),
            HandlerFn::Async(f) => blocking::drive(f(call.clone(), merged))?,
        }
    }

    /// Invokes the handler as a future.
    ///
    /// Synchronous functions run when the future is first polled.
    pub fn invoke_async(
        &self,
        call: CallHandle,
        args: &Arguments,
    ) -> BoxFuture<'static, HandlerResult> {
        let merged = match self.prepare(args) {
            Ok(Some(merged)) => merged,
            Ok(None) => return future::ready(Ok(None)).boxed(),
            Err(e) => return future::ready(Err(e)).boxed(),
        };
        match &self.inner.function {
            HandlerFn::Async(f) => f(call, merged),
            HandlerFn::Sync(f) => {
                let f = Arc::clone(f);
                async move { f(&call, &merged) }.boxed()
            }
        }
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("id", &self.inner.id)
            .field("event", &self.inner.event)
            .field("priority", &self.inner.priority)
            .field("is_async", &self.is_async())
            .field("requirements", &self.inner.requirements)
            .field("owner", &self.inner.owner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::EventCall;
    use serde_json::json;
    use std::time::Duration;

    fn echo_role() -> EventHandler {
        EventHandler::builder("act")
            .kwarg("role", "guest")
            .sync(|_call, args| Ok(args.kwarg_value("role").cloned()))
    }

    #[test]
    fn ids_are_unique_and_shared_by_clones() {
        let a = echo_role();
        let b = echo_role();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
        assert_eq!(a.handle().event.as_ref(), "act");
    }

    #[test]
    fn call_kwargs_override_additional_kwargs() {
        let h = echo_role();
        let call = EventCall::new("act", false);

        let out = h.invoke(&call.handle(), &Arguments::new()).unwrap();
        assert_eq!(out, Some(json!("guest")));

        let out = h
            .invoke(&call.handle(), &Arguments::new().kwarg("role", "admin"))
            .unwrap();
        assert_eq!(out, Some(json!("admin")));
    }

    #[test]
    fn unmet_requirement_yields_no_result() {
        let h = EventHandler::builder("act")
            .requires("role", "admin")
            .sync(|_call, _args| Ok(Some(json!("ran"))));
        let call = EventCall::new("act", false);

        let out = h
            .invoke(&call.handle(), &Arguments::new().kwarg("role", "guest"))
            .unwrap();
        assert_eq!(out, None);

        let out = h.invoke(&call.handle(), &Arguments::new()).unwrap();
        assert_eq!(out, None);

        let out = h
            .invoke(&call.handle(), &Arguments::new().kwarg("role", "admin"))
            .unwrap();
        assert_eq!(out, Some(json!("ran")));
    }

    #[test]
    fn unmet_requirement_raises_when_enabled() {
        let h = EventHandler::builder("act")
            .requires("role", "admin")
            .requirement_exceptions(true)
            .sync(|_call, _args| Ok(Some(json!("ran"))));
        let call = EventCall::new("act", false);

        let err = h
            .invoke(&call.handle(), &Arguments::new().kwarg("role", "guest"))
            .unwrap_err();
        match err {
            EventError::UnfulfilledRequirement {
                key,
                expected,
                actual,
                ..
            } => {
                assert_eq!(key, "role");
                assert_eq!(expected, json!("admin"));
                assert_eq!(actual, Some(json!("guest")));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn requirement_can_be_met_by_additional_kwargs() {
        let h = EventHandler::builder("act")
            .kwarg("role", "admin")
            .requires("role", "admin")
            .sync(|_call, _args| Ok(Some(json!(true))));
        let call = EventCall::new("act", false);
        assert_eq!(
            h.invoke(&call.handle(), &Arguments::new()).unwrap(),
            Some(json!(true))
        );
    }

    #[test]
    fn with_additional_kwargs_keeps_id_and_overrides_defaults() {
        let h = echo_role();
        let mut extra = Kwargs::new();
        extra.insert("role".to_string(), json!("staff"));
        extra.insert("team".to_string(), json!("ops"));

        let tuned = h.clone().with_additional_kwargs(extra);
        assert_eq!(tuned.id(), h.id());
        assert_eq!(tuned.additional_kwargs().get("team"), Some(&json!("ops")));
        assert_eq!(h.additional_kwargs().get("team"), None);

        let call = EventCall::new("act", false);
        let out = tuned.invoke(&call.handle(), &Arguments::new()).unwrap();
        assert_eq!(out, Some(json!("staff")));
    }

    #[test]
    fn registering_a_retagged_handler_stores_the_new_kwargs() {
        let space = crate::EventSpace::new();
        let h = space
            .on("act")
            .kwarg("role", "guest")
            .sync(|_call, args| Ok(args.kwarg_value("role").cloned()));

        let mut extra = Kwargs::new();
        extra.insert("role".to_string(), json!("staff"));
        space.register(&h.with_additional_kwargs(extra));

        assert_eq!(space.len(), 1);
        let call = space.emit("act", Arguments::new()).unwrap();
        assert_eq!(call.responses(), &[Some(json!("staff"))]);
    }

    #[test]
    fn async_handler_runs_to_completion_when_invoked_blocking() {
        let h = EventHandler::builder("slow").asynchronous(|_call, _args| async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok(Some(json!("late")))
        });
        assert!(h.is_async());
        let call = EventCall::new("slow", false);
        assert_eq!(
            h.invoke(&call.handle(), &Arguments::new()).unwrap(),
            Some(json!("late"))
        );
    }

    #[tokio::test]
    async fn sync_handler_invoked_as_future() {
        let h = EventHandler::builder("x").sync(|call, _args| Ok(Some(json!(call.name()))));
        let call = EventCall::new("x", false);
        let out = h.invoke_async(call.handle(), &Arguments::new()).await.unwrap();
        assert_eq!(out, Some(json!("x")));
    }

    #[test]
    fn with_owner_keeps_identity() {
        let h = echo_role();
        let id = h.id();
        let tagged = h.with_owner(OwnerToken::from("plugin"));
        assert_eq!(tagged.id(), id);
        assert!(tagged.is_owned_by(&OwnerToken::from("plugin")));
        assert!(!tagged.is_owned_by(&OwnerToken::from("other")));
    }
}
