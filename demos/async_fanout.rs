//! # Example: async_fanout
//!
//! Concurrent dispatch of asynchronous handlers with ordered results, plus a
//! queueing handler drained by a separate task.
//!
//! ## Flow
//! ```text
//! async_call("fetch")
//!     ├─► cache   (sync,  prio 10) ─► runs first
//!     ├─► slow    (async, prio 5)  ─┐
//!     └─► fast    (async, prio 1)  ─┴─► joined ─► responses in priority order
//!
//! emit("audit") ─► queue handler ─► [queue] ─► consumer task
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example async_fanout
//! ```

use std::time::{Duration, Instant};

use eventspace::{Arguments, EventSpace};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let space = EventSpace::new();

    space.on("fetch").priority(10).sync(|_call, _args| Ok(Some(json!("cache miss"))));
    space.on("fetch").priority(5).asynchronous(|_call, _args| async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(Some(json!("slow source")))
    });
    space.on("fetch").priority(1).asynchronous(|_call, _args| async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(Some(json!("fast source")))
    });

    let started = Instant::now();
    let call = space.async_call("fetch", Arguments::new()).await?;
    println!("responses={:?} in {:?}", call.responses(), started.elapsed());

    // Queue: dispatch returns at once, the consumer drains later.
    let mut queue = space.queue("audit");
    let consumer = tokio::spawn(async move {
        let mut seen = 0;
        while let Some(args) = queue.recv().await {
            println!("[audit] {:?}", args.positional);
            seen += 1;
            if seen == 3 {
                break;
            }
        }
    });

    for user in ["ann", "bob", "cid"] {
        space.emit("audit", Arguments::new().arg(user))?;
    }
    consumer.await?;
    Ok(())
}
