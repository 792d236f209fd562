//! Synchronous, single-threaded publish/subscribe.
//!
//! Handlers run in subscription order on the caller's stack. The handler list
//! is snapshotted before each dispatch, so a handler may subscribe or
//! unsubscribe (including itself) without affecting the dispatch in flight.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Handler<E> = Rc<dyn Fn(&E)>;

pub struct Notifier<E> {
    handlers: RefCell<Vec<(SubscriptionId, Handler<E>)>>,
    next_id: Cell<u64>,
}

impl<E> Notifier<E> {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Returns false if the id was not subscribed (or already removed).
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(sid, _)| *sid != id);
        handlers.len() != before
    }

    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Handler<E>> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        for handler in snapshot {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_subscription_order() {
        let notifier: Notifier<u32> = Notifier::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = Rc::clone(&seen);
            notifier.subscribe(move |value: &u32| seen.borrow_mut().push(format!("{tag}{value}")));
        }

        notifier.notify(&1);
        assert_eq!(*seen.borrow(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let notifier: Notifier<()> = Notifier::new();
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        let id = notifier.subscribe(move |_| counter.set(counter.get() + 1));

        notifier.notify(&());
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.notify(&());

        assert_eq!(count.get(), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn handler_may_subscribe_during_dispatch() {
        let notifier: Rc<Notifier<()>> = Rc::new(Notifier::new());
        let count = Rc::new(Cell::new(0));

        let inner = Rc::clone(&notifier);
        let inner_count = Rc::clone(&count);
        notifier.subscribe(move |_| {
            let c = Rc::clone(&inner_count);
            inner.subscribe(move |_| c.set(c.get() + 1));
        });

        // New handler is not invoked by the dispatch that registered it.
        notifier.notify(&());
        assert_eq!(count.get(), 0);

        notifier.notify(&());
        assert_eq!(count.get(), 1);
    }
}
