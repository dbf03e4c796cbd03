//! Drives an async handler to completion from synchronous code.
//!
//! Synchronous dispatch never leaves async work in flight, so a future
//! reached through `call` is run here until it finishes:
//!
//! ```text
//! tokio multi-thread runtime  ─► block_in_place + Handle::block_on
//! tokio current-thread runtime ─► scoped helper thread + private runtime
//! no runtime                   ─► private current-thread runtime
//! ```

use std::future::Future;

use tokio::runtime::{Builder, Handle, RuntimeFlavor};

use crate::error::EventError;

/// Runs `fut` to completion, blocking the calling thread.
pub(crate) fn drive<F>(fut: F) -> Result<F::Output, EventError>
where
    F: Future + Send,
    F::Output: Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            Ok(tokio::task::block_in_place(|| handle.block_on(fut)))
        }
        Ok(_) => std::thread::scope(|scope| {
            match scope.spawn(|| run_private(fut)).join() {
                Ok(out) => out,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }),
        Err(_) => run_private(fut),
    }
}

fn run_private<F: Future>(fut: F) -> Result<F::Output, EventError> {
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| EventError::Runtime {
            message: e.to_string(),
        })?;
    Ok(rt.block_on(fut))
}
