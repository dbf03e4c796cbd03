//! Ready-made handlers built on top of [`EventSpace`](crate::EventSpace).
//!
//! - `wait_for` / `wait_for_async`: block until one call happens
//! - [`EventQueue`]: hand each call's arguments to an async consumer

mod queue;
mod wait;

pub use queue::EventQueue;
