//! Change-notification fan-out.
//!
//! One registry holds every subscriber callback. Notifications fire after
//! each refresh cycle (success or failure) and after each watch-list
//! mutation. A panicking subscriber is isolated: it is logged and the
//! remaining subscribers still run.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::warn;

/// Handle returned by [`SubscriberRegistry::subscribe`], used to remove
/// the subscription later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Registry of change-notification callbacks.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<SubscriptionId, Callback>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it fires on every data or configuration change.
    pub fn subscribe(&self, callback: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .insert(id, Arc::new(callback));
        id
    }

    /// Remove a subscription. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .remove(&id);
    }

    /// Invoke every subscriber, outside the registry lock.
    ///
    /// A panic in one handler must not reach the scheduler or starve the
    /// other handlers, so each call is wrapped individually.
    pub fn notify_all(&self) {
        let callbacks: Vec<Callback> = {
            let guard = self.subscribers.lock().expect("subscriber lock poisoned");
            guard.values().cloned().collect()
        };

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                warn!("change-notification subscriber panicked; continuing");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribers_receive_notifications() {
        let registry = SubscriberRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        registry.subscribe(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all();
        registry.notify_all();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let registry = SubscriberRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        let id = registry.subscribe(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all();
        registry.unsubscribe(id);
        registry.notify_all();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let registry = SubscriberRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        registry.subscribe(|| panic!("subscriber bug"));
        let h = hits.clone();
        registry.subscribe(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_id_unsubscribe_is_noop() {
        let registry = SubscriberRegistry::new();
        let id = registry.subscribe(|| {});
        registry.unsubscribe(id);
        registry.unsubscribe(id);
        assert!(registry.is_empty());
    }
}
