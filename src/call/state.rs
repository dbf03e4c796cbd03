//! # Lifecycle state of one dispatch.
//!
//! A call is either running normally or has been cancelled, stopped, or both.
//! Both flags are one-way latches:
//!
//! ```text
//!                 cancel()                       stop()
//!   Active ────────────────► Cancelled ───────────────────┐
//!     │                                                   ▼
//!     └──────────────► Stopped ─────────────────► CancelledAndStopped
//!         stop()                  cancel()
//! ```
//!
//! ## Rules
//! - No transition ever clears a flag.
//! - `cancel()` is only legal on cancellable calls (checked by [`CallHandle`](crate::CallHandle)).
//! - Repeating a transition is a no-op.
//! - `Stopped` halts dispatch unconditionally; `Cancelled` halts only blocking dispatch.

use std::sync::atomic::{AtomicU8, Ordering};

const CANCELLED: u8 = 0b01;
const STOPPED: u8 = 0b10;

/// Observable state of an [`EventCall`](crate::EventCall).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// Neither cancelled nor stopped.
    Active,
    /// Cancelled; blocking dispatch halts after the current handler.
    Cancelled,
    /// Stopped without being cancelled; dispatch halts after the current handler.
    Stopped,
    /// Both latches set.
    CancelledAndStopped,
}

impl CallState {
    fn from_bits(bits: u8) -> Self {
        match bits & (CANCELLED | STOPPED) {
            0 => CallState::Active,
            CANCELLED => CallState::Cancelled,
            STOPPED => CallState::Stopped,
            _ => CallState::CancelledAndStopped,
        }
    }

    /// True for `Cancelled` and `CancelledAndStopped`.
    #[inline]
    pub fn is_cancelled(self) -> bool {
        matches!(self, CallState::Cancelled | CallState::CancelledAndStopped)
    }

    /// True for `Stopped` and `CancelledAndStopped`.
    #[inline]
    pub fn is_stopped(self) -> bool {
        matches!(self, CallState::Stopped | CallState::CancelledAndStopped)
    }

    /// Whether a dispatch loop must stop before the next handler.
    #[inline]
    pub fn halts(self, blocking: bool) -> bool {
        self.is_stopped() || (blocking && self.is_cancelled())
    }
}

/// Shared atomic storage behind [`CallState`].
#[derive(Debug, Default)]
pub(crate) struct StateCell {
    bits: AtomicU8,
}

impl StateCell {
    pub(crate) fn load(&self) -> CallState {
        CallState::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub(crate) fn set_cancelled(&self) -> CallState {
        CallState::from_bits(self.bits.fetch_or(CANCELLED, Ordering::AcqRel) | CANCELLED)
    }

    pub(crate) fn set_stopped(&self) -> CallState {
        CallState::from_bits(self.bits.fetch_or(STOPPED, Ordering::AcqRel) | STOPPED)
    }
}
