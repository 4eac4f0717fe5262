// SPDX-License-Identifier: GPL-3.0-only
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::models::SyncEvent;

type Filter = dyn Fn(&SyncEvent) -> bool + Send + Sync;
type Handler = dyn Fn(&SyncEvent) + Send + Sync;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct Subscriber {
    id: u64,
    filter: Arc<Filter>,
    handler: Arc<Handler>,
}

/// Synchronous publish/subscribe for [`SyncEvent`]s.
///
/// Handlers run on the publishing task, in subscription order. Events are
/// not stored: only subscribers present at publish time see an event.
#[derive(Default)]
pub struct SyncEventBus {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl SyncEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for every event accepted by `filter`
    pub fn subscribe<P, F>(&self, filter: P, handler: F) -> SubscriptionHandle
    where
        P: Fn(&SyncEvent) -> bool + Send + Sync + 'static,
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push(Subscriber {
            id,
            filter: Arc::new(filter),
            handler: Arc::new(handler),
        });
        debug!(subscription = id, "Event subscriber registered");
        SubscriptionHandle(id)
    }

    pub fn subscribe_all<F>(&self, handler: F) -> SubscriptionHandle
    where
        F: Fn(&SyncEvent) + Send + Sync + 'static,
    {
        self.subscribe(|_| true, handler)
    }

    /// Forward matching events into a channel, for consumers living on another task
    pub fn channel<P>(&self, filter: P) -> (SubscriptionHandle, mpsc::UnboundedReceiver<SyncEvent>)
    where
        P: Fn(&SyncEvent) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.subscribe(filter, move |event| {
            if tx.send(event.clone()).is_err() {
                warn!("Event receiver dropped before unsubscribing");
            }
        });
        (handle, rx)
    }

    /// Returns false if the handle was not (or no longer) subscribed
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != handle.0);
        let removed = subscribers.len() != before;
        if removed {
            debug!(subscription = handle.0, "Event subscriber removed");
        }
        removed
    }

    /// Deliver `event` to current subscribers; returns how many handlers ran
    pub fn publish(&self, event: SyncEvent) -> usize {
        // Snapshot so handlers may (un)subscribe without deadlocking
        let targets: Vec<(Arc<Filter>, Arc<Handler>)> = self
            .subscribers
            .read()
            .iter()
            .map(|s| (Arc::clone(&s.filter), Arc::clone(&s.handler)))
            .collect();

        let mut delivered = 0;
        for (filter, handler) in targets {
            if filter(&event) {
                handler(&event);
                delivered += 1;
            }
        }
        debug!(delivered, "Event published");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl std::fmt::Debug for SyncEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::models::MembershipChange;
    use crate::store::models::{MembershipKey, SetName};
    use parking_lot::Mutex;

    fn changed(key: MembershipKey, is_member: bool) -> SyncEvent {
        SyncEvent::MembershipChanged(MembershipChange::new(&key, is_member))
    }

    fn recorder(bus: &SyncEventBus) -> (SubscriptionHandle, Arc<Mutex<Vec<SyncEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = bus.subscribe_all(move |event| sink.lock().push(event.clone()));
        (handle, seen)
    }

    #[test]
    fn test_late_subscriber_gets_no_backlog() {
        let bus = SyncEventBus::new();
        bus.publish(changed(MembershipKey::like("a"), true));
        bus.publish(changed(MembershipKey::like("b"), true));

        let (_handle, seen) = recorder(&bus);
        assert!(seen.lock().is_empty());

        bus.publish(changed(MembershipKey::like("c"), false));
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].membership().unwrap().item_id, "c");
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let bus = SyncEventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe_all(move |_| order.lock().push(label));
        }

        assert_eq!(bus.publish(changed(MembershipKey::cart("n1"), true)), 3);
        assert_eq!(*order.lock(), ["first", "second", "third"]);
    }

    #[test]
    fn test_filter_limits_delivery() {
        let bus = SyncEventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(|e| e.is_set(SetName::Cart), move |e| sink.lock().push(e.clone()));

        bus.publish(changed(MembershipKey::like("a"), true));
        bus.publish(changed(MembershipKey::cart("n1"), true));

        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_set(SetName::Cart));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus = SyncEventBus::new();
        let (handle, seen) = recorder(&bus);

        assert!(bus.unsubscribe(handle));
        assert!(!bus.unsubscribe(handle));
        assert_eq!(bus.subscriber_count(), 0);

        bus.publish(changed(MembershipKey::like("a"), true));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_handler_can_subscribe_during_delivery() {
        let bus = Arc::new(SyncEventBus::new());
        let inner_bus = Arc::clone(&bus);
        bus.subscribe_all(move |_| {
            inner_bus.subscribe_all(|_| {});
        });

        bus.publish(changed(MembershipKey::like("a"), true));
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_channel_forwards_events() {
        let bus = SyncEventBus::new();
        let (handle, mut rx) = bus.channel(|_| true);

        bus.publish(changed(MembershipKey::cart("n2"), false));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.membership().unwrap().item_id, "n2");

        bus.unsubscribe(handle);
        assert!(rx.recv().await.is_none());
    }
}
