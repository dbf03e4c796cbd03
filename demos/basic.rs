//! # Example: basic
//!
//! Synchronous dispatch with priorities, requirements and cancellation.
//!
//! Demonstrates how to:
//! - Register handlers with [`EventSpace::on`].
//! - Call an event and read `responses` / `response`.
//! - Cancel a cancellable call from a high-priority handler.
//!
//! ## Flow
//! ```text
//! call("save")
//!     ├─► guard   (prio 100) ─► cancel() if readonly
//!     ├─► backup  (prio 10)  ─► requires mode=full
//!     └─► writer  (prio 0)   ─► "saved <file>"
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=eventspace=debug cargo run --example basic
//! ```

use eventspace::{Arguments, CallOptions, EventSpace};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. One space for the whole program, passed around by handle
    let space = EventSpace::new();

    // 2. Handlers
    space.on("save").priority(100).sync(|call, args| {
        if args.kwarg_value("readonly") == Some(&json!(true)) {
            println!("[guard] readonly, cancelling");
            call.cancel()?;
        }
        Ok(None)
    });
    space
        .on("save")
        .priority(10)
        .requires("mode", "full")
        .sync(|_call, _args| {
            println!("[backup] taking backup");
            Ok(Some(json!("backup taken")))
        });
    space.on("save").sync(|_call, args| {
        let file = args.get(0).and_then(Value::as_str).unwrap_or("?");
        Ok(Some(json!(format!("saved {file}"))))
    });

    // 3. Calls
    let opts = CallOptions::new().cancellable(true);

    let call = space.call("save", opts, Arguments::new().arg("a.txt"))?;
    println!("plain:    {:?}", call.responses());

    let call = space.call("save", opts, Arguments::new().arg("b.txt").kwarg("mode", "full"))?;
    println!("full:     {:?} first={:?}", call.responses(), call.response());

    let call = space.call("save", opts, Arguments::new().arg("c.txt").kwarg("readonly", true))?;
    println!("readonly: cancelled={} responses={:?}", call.is_cancelled(), call.responses());

    // 4. Unknown events are a no-op
    let call = space.emit("unknown", Arguments::new())?;
    println!("unknown:  {:?}", call.response());
    Ok(())
}
