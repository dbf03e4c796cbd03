//! Dispatch records: per-call state, arguments and responses.
//!
//! ## Contents
//! - [`EventCall`] record returned by every dispatch
//! - [`CallHandle`] the view of that record handed to handlers
//! - [`CallState`] cancelled/stopped latch state
//! - [`Arguments`], [`Kwargs`] data passed to handlers

mod arguments;
mod event_call;
mod state;

pub use arguments::{Arguments, Kwargs};
pub use event_call::{CallHandle, EventCall};
pub use state::CallState;
