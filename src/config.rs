//! # Event space configuration.
//!
//! Provides [`Config`], the settings an [`EventSpace`](crate::EventSpace) applies
//! to handlers it builds through [`EventSpace::on`](crate::EventSpace::on) and to
//! the queues it creates.
//!
//! ## Sentinel values
//! - `queue_capacity = 0` → clamped to 1 (a channel needs room for one item)

/// Settings shared by every handler built through one event space.
///
/// ## Field semantics
/// - `default_priority`: Priority given to handlers that do not set one
/// - `requirement_exceptions`: Whether unmet requirements raise by default
/// - `queue_capacity`: Buffer size of queues created by [`EventSpace::queue`](crate::EventSpace::queue)
#[derive(Clone, Debug)]
pub struct Config {
    /// Priority of handlers that do not set one explicitly.
    pub default_priority: i32,

    /// Default for [`HandlerBuilder::requirement_exceptions`](crate::HandlerBuilder::requirement_exceptions).
    ///
    /// - `false` = an unmet requirement yields an empty response
    /// - `true` = an unmet requirement raises `UnfulfilledRequirement`
    pub requirement_exceptions: bool,

    /// Capacity of each queueing handler's buffer.
    ///
    /// When a queue is full, further invocations are dropped for that queue
    /// (dispatch never blocks on a consumer).
    pub queue_capacity: usize,
}

impl Config {
    /// Returns the queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn queue_capacity_clamped(&self) -> usize {
        self.queue_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `default_priority = 0`
    /// - `requirement_exceptions = false` (unmet requirements are silent)
    /// - `queue_capacity = 1024`
    fn default() -> Self {
        Self {
            default_priority: 0,
            requirement_exceptions: false,
            queue_capacity: 1024,
        }
    }
}
