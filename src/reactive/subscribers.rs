//! Commit subscribers: callbacks run after every published change.
//!
//! Adapted from an effect registry: each subscriber lives in a slot, the
//! callback is taken out while it runs, and disposing a subscription only
//! deactivates its slot so ids stay stable.

use std::fmt;

/// Identifies a subscriber slot inside a [`Subscribers`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

struct Slot<E> {
    callback: Option<Box<dyn FnMut(&E)>>,
    active: bool,
}

/// Registry of callbacks notified with each event `E`.
pub struct Subscribers<E> {
    slots: Vec<Slot<E>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<E> fmt::Debug for Subscribers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("active", &self.len())
            .finish()
    }
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It runs for every later [`notify`](Self::notify).
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.slots.len());
        self.slots.push(Slot {
            callback: Some(Box::new(callback)),
            active: true,
        });
        id
    }

    /// Deactivate a subscription. Returns `false` if it was not active.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.slots.get_mut(id.0) {
            Some(slot) if slot.active => {
                slot.active = false;
                slot.callback = None;
                true
            }
            _ => false,
        }
    }

    /// Run every active callback with `event`, in subscription order.
    pub fn notify(&mut self, event: &E) {
        for slot in self.slots.iter_mut().filter(|slot| slot.active) {
            if let Some(callback) = slot.callback.as_mut() {
                callback(event);
            }
        }
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn notify_runs_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Subscribers::new();
        let first = log.clone();
        subs.subscribe(move |n: &i32| first.borrow_mut().push(("first", *n)));
        let second = log.clone();
        subs.subscribe(move |n: &i32| second.borrow_mut().push(("second", *n)));

        subs.notify(&7);
        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut subs = Subscribers::new();
        let c = count.clone();
        let id = subs.subscribe(move |_: &()| *c.borrow_mut() += 1);

        subs.notify(&());
        assert!(subs.unsubscribe(id));
        subs.notify(&());
        assert_eq!(*count.borrow(), 1);
        assert!(subs.is_empty());
    }

    #[test]
    fn unsubscribe_twice_is_a_no_op() {
        let mut subs: Subscribers<()> = Subscribers::new();
        let id = subs.subscribe(|_| {});
        assert!(subs.unsubscribe(id));
        assert!(!subs.unsubscribe(id));
    }

    #[test]
    fn ids_stay_stable_after_unsubscribe() {
        let mut subs: Subscribers<()> = Subscribers::new();
        let a = subs.subscribe(|_| {});
        subs.unsubscribe(a);
        let b = subs.subscribe(|_| {});
        assert_ne!(a, b);
        assert_eq!(subs.len(), 1);
    }
}
