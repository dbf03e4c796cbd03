//! # Handlers and their construction.
//!
//! - [`EventHandler`] function bound to an event with priority and requirements
//! - [`HandlerBuilder`] fluent construction, sync or async
//! - [`HandlerHandle`], [`HandlerId`] registry identity
//! - [`OwnerToken`] group identity for bulk unregistration

mod blocking;
mod builder;
mod handler;

pub use builder::HandlerBuilder;
pub use handler::{EventHandler, HandlerHandle, HandlerId, HandlerResult, OwnerToken};
