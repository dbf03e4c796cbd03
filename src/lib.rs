//! # eventspace
//!
//! **eventspace** is an in-process publish/subscribe event dispatcher.
//!
//! Producers *call* a named event with positional and keyword data; consumers
//! register *handlers* for that name with a priority, optional keyword
//! requirements and a synchronous or asynchronous execution mode.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   EventHandler      EventHandler      EventHandler
//!  (prio 10, sync)   (prio 5, async)   (prio 5, sync)
//!         │                 │                 │
//!         ▼                 ▼                 ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  EventSpace                                               │
//! │  RwLock<Registry>: event ─► priority (desc) ─► [FIFO]     │
//! └──────┬──────────────────────────────────────┬─────────────┘
//!        │ call(name, opts, args)               │ async_call(name, args)
//!        ▼                                      ▼
//!  snapshot ─► invoke one by one          snapshot ─► sync now, async joined
//!        │     (cancel/stop/first hit)          │     (merged in order)
//!        ▼                                      ▼
//!   EventCall { responses, state }        EventCall { responses, state }
//! ```
//!
//! ### Dispatch loop
//! ```text
//! for handler in snapshot {
//!   ├─► merge kwargs (handler defaults < call kwargs)
//!   ├─► requirements met?  no ─► None (or UnfulfilledRequirement)
//!   ├─► run handler ─► push response
//!   ├─► first_response && Some(_)       ─► return
//!   └─► stopped || cancelled && blocking ─► return
//! }
//! ```
//!
//! ## Features
//! | Area             | Description                                                  | Key types                                  |
//! |------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Registry**     | Priority-ordered handler sets, owner-based bulk removal.     | [`EventSpace`], [`HandlerHandle`]          |
//! | **Handlers**     | Sync or async functions with requirements and default kwargs.| [`EventHandler`], [`HandlerBuilder`]       |
//! | **Dispatch**     | Blocking walk with cancellation, concurrent async fan-out.   | [`CallOptions`], [`EventCall`]             |
//! | **Utilities**    | Wait for one call; queue calls for an async consumer.        | [`EventQueue`]                             |
//! | **Owners**       | Objects that register and remove a group of handlers.        | [`EventSupport`], [`OwnerToken`]           |
//! | **Errors**       | Typed errors with stable labels.                             | [`EventError`]                             |
//! | **Configuration**| Defaults applied by a space.                                 | [`Config`]                                 |
//!
//! ## Example
//! ```rust
//! use eventspace::{Arguments, CallOptions, EventSpace};
//! use serde_json::json;
//!
//! let space = EventSpace::new();
//!
//! space.on("save").priority(10).sync(|call, args| {
//!     if args.kwarg_value("readonly") == Some(&json!(true)) {
//!         call.cancel()?;
//!     }
//!     Ok(None)
//! });
//! space.on("save").sync(|_call, _args| Ok(Some(json!("saved"))));
//!
//! let opts = CallOptions::new().cancellable(true);
//! let call = space.call("save", opts, Arguments::new().kwarg("readonly", true)).unwrap();
//! assert!(call.is_cancelled());
//! assert!(call.response().is_none());
//!
//! let call = space.call("save", opts, Arguments::new()).unwrap();
//! assert_eq!(call.response(), Some(&json!("saved")));
//! ```

mod call;
mod config;
mod error;
mod handlers;
mod space;
mod support;
mod utilities;

// ---- Public re-exports ----

pub use call::{Arguments, CallHandle, CallState, EventCall, Kwargs};
pub use config::Config;
pub use error::{EventError, HandlerFailure};
pub use handlers::{
    EventHandler, HandlerBuilder, HandlerHandle, HandlerId, HandlerResult, OwnerToken,
};
pub use space::{CallOptions, EventSpace};
pub use support::EventSupport;
pub use utilities::EventQueue;
