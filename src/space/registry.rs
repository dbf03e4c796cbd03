//! Event name → priority bucket → handlers.
//!
//! Not synchronized by itself; [`EventSpace`](crate::EventSpace) wraps it in a
//! `RwLock` and only ever hands out cloned snapshots.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::handlers::{EventHandler, HandlerHandle, OwnerToken};

/// Priority buckets for one event; FIFO within a bucket.
type Buckets = BTreeMap<i32, Vec<EventHandler>>;

#[derive(Default)]
pub(crate) struct Registry {
    events: HashMap<Arc<str>, Buckets>,
}

impl Registry {
    /// Appends `handler` to its bucket. Returns `false` if it was already there.
    ///
    /// An entry with the same id is replaced in place, so owner and default
    /// kwargs set after the first registration are stored.
    pub(crate) fn insert(&mut self, handler: &EventHandler) -> bool {
        let event: Arc<str> = Arc::from(handler.event());
        let bucket = self
            .events
            .entry(event)
            .or_default()
            .entry(handler.priority())
            .or_default();
        if let Some(slot) = bucket.iter_mut().find(|h| h.id() == handler.id()) {
            *slot = handler.clone();
            return false;
        }
        bucket.push(handler.clone());
        true
    }

    pub(crate) fn contains(&self, handle: &HandlerHandle) -> bool {
        self.events
            .get(&*handle.event)
            .and_then(|buckets| buckets.get(&handle.priority))
            .is_some_and(|bucket| bucket.iter().any(|h| h.id() == handle.id))
    }

    /// Removes the handler. Returns `false` if it was not registered.
    pub(crate) fn remove(&mut self, handle: &HandlerHandle) -> bool {
        let Some(buckets) = self.events.get_mut(&*handle.event) else {
            return false;
        };
        let Some(bucket) = buckets.get_mut(&handle.priority) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|h| h.id() == handle.id) else {
            return false;
        };
        bucket.remove(pos);
        if bucket.is_empty() {
            buckets.remove(&handle.priority);
        }
        if buckets.is_empty() {
            self.events.remove(&*handle.event);
        }
        true
    }

    /// Removes every handler owned by `owner`. Returns how many were removed.
    pub(crate) fn remove_owned(&mut self, owner: &OwnerToken) -> usize {
        let mut count = 0;
        for buckets in self.events.values_mut() {
            for bucket in buckets.values_mut() {
                let before = bucket.len();
                bucket.retain(|h| !h.is_owned_by(owner));
                count += before - bucket.len();
            }
            buckets.retain(|_, bucket| !bucket.is_empty());
        }
        self.events.retain(|_, buckets| !buckets.is_empty());
        count
    }

    /// Handlers for `event`, highest priority first, registration order within a priority.
    pub(crate) fn ordered(&self, event: &str) -> Vec<EventHandler> {
        let Some(buckets) = self.events.get(event) else {
            return Vec::new();
        };
        buckets
            .values()
            .rev()
            .flat_map(|bucket| bucket.iter().cloned())
            .collect()
    }

    /// Sorted names of events with at least one handler.
    pub(crate) fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.events.keys().map(|k| k.to_string()).collect();
        names.sort_unstable();
        names
    }

    pub(crate) fn len(&self) -> usize {
        self.events
            .values()
            .flat_map(|buckets| buckets.values())
            .map(Vec::len)
            .sum()
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(event: &str, priority: i32) -> EventHandler {
        EventHandler::builder(event)
            .priority(priority)
            .sync(|_call, _args| Ok(None))
    }

    fn ids(handlers: &[EventHandler]) -> Vec<u64> {
        handlers.iter().map(|h| h.id().as_u64()).collect()
    }

    #[test]
    fn ordered_is_descending_priority_then_fifo() {
        let mut reg = Registry::default();
        let low = handler("e", -5);
        let mid_a = handler("e", 5);
        let high = handler("e", 10);
        let mid_b = handler("e", 5);
        for h in [&low, &mid_a, &high, &mid_b] {
            assert!(reg.insert(h));
        }

        assert_eq!(
            ids(&reg.ordered("e")),
            ids(&[high.clone(), mid_a.clone(), mid_b.clone(), low.clone()])
        );
    }

    #[test]
    fn unknown_event_is_empty() {
        let reg = Registry::default();
        assert!(reg.ordered("missing").is_empty());
    }

    #[test]
    fn insert_is_idempotent() {
        let mut reg = Registry::default();
        let h = handler("e", 0);
        assert!(reg.insert(&h));
        assert!(!reg.insert(&h.clone()));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_prunes_empty_containers() {
        let mut reg = Registry::default();
        let h = handler("e", 3);
        reg.insert(&h);
        assert!(reg.remove(&h.handle()));
        assert!(!reg.remove(&h.handle()));
        assert!(reg.event_names().is_empty());
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn reinsert_goes_to_back_of_bucket() {
        let mut reg = Registry::default();
        let a = handler("e", 1);
        let b = handler("e", 1);
        reg.insert(&a);
        reg.insert(&b);
        reg.remove(&a.handle());
        reg.insert(&a);
        assert_eq!(ids(&reg.ordered("e")), ids(&[b, a]));
    }

    #[test]
    fn remove_owned_only_touches_owner() {
        let mut reg = Registry::default();
        let owner = OwnerToken::from("plugin");
        let owned_a = handler("a", 0).with_owner(owner.clone());
        let owned_b = handler("b", 9).with_owner(owner.clone());
        let free = handler("a", 0);
        for h in [&owned_a, &owned_b, &free] {
            reg.insert(h);
        }

        assert_eq!(reg.remove_owned(&owner), 2);
        assert_eq!(reg.event_names(), vec!["a".to_string()]);
        assert!(reg.contains(&free.handle()));
        assert_eq!(reg.remove_owned(&owner), 0);
    }

    #[test]
    fn reinsert_of_same_id_refreshes_entry_in_place() {
        let mut reg = Registry::default();
        let first = handler("e", 1);
        let plain = handler("e", 1);
        let second = handler("e", 1);
        for h in [&first, &plain, &second] {
            reg.insert(h);
        }

        let owner = OwnerToken::from("late");
        assert!(!reg.insert(&plain.clone().with_owner(owner.clone())));
        assert_eq!(reg.len(), 3);
        assert_eq!(ids(&reg.ordered("e")), ids(&[first, plain.clone(), second]));
        assert_eq!(reg.ordered("e")[1].owner(), Some(&owner));

        assert_eq!(reg.remove_owned(&owner), 1);
        assert!(!reg.contains(&plain.handle()));
    }
}
