//! # Example: support
//!
//! A type that owns a group of handlers via [`EventSupport`], and waits for
//! a single event from another thread.
//!
//! ## Run
//! ```bash
//! cargo run --example support
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use eventspace::{Arguments, EventHandler, EventSpace, EventSupport, OwnerToken};
use serde_json::json;

struct Counter {
    name: &'static str,
    total: AtomicU64,
}

impl EventSupport for Counter {
    fn owner_token(&self) -> OwnerToken {
        OwnerToken::from(self.name)
    }

    fn handler_specs(self: Arc<Self>) -> Vec<EventHandler> {
        vec![
            EventHandler::builder("add").sync_method(Arc::clone(&self), |this, _call, args| {
                let n = args.get(0).and_then(|v| v.as_u64()).unwrap_or(1);
                let total = this.total.fetch_add(n, Ordering::Relaxed) + n;
                Ok(Some(json!(total)))
            }),
            EventHandler::builder("reset").sync_method(self, |this, _call, _args| {
                this.total.store(0, Ordering::Relaxed);
                Ok(None)
            }),
        ]
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let space = EventSpace::new();
    let counter = Arc::new(Counter {
        name: "counter",
        total: AtomicU64::new(0),
    });
    Arc::clone(&counter).register_events(&space);

    space.emit("add", Arguments::new().arg(5))?;
    let call = space.emit("add", Arguments::new().arg(2))?;
    println!("total after two adds: {:?}", call.response());

    // Another thread waits for "shutdown"; this thread fires it.
    let waiter = std::thread::spawn({
        let space = space.clone();
        move || space.wait_for("shutdown", Some(Duration::from_secs(2)))
    });
    while space.handlers("shutdown").is_empty() {
        std::thread::sleep(Duration::from_millis(1));
    }
    space.emit("shutdown", Arguments::new().kwarg("reason", "demo over"))?;
    let args = waiter.join().map_err(|_| "waiter panicked")??;
    println!("waiter got {:?}", args.keywords);

    let removed = counter.unregister_events(&space);
    println!("unregistered {removed} handlers, events left: {:?}", space.events());
    Ok(())
}
