//! Observer registry for controller event streams.
//!
//! The controller exposes two streams (state-changed, timer-complete) as
//! plain observer lists rather than an event bus: subscribing returns a
//! handle, and callbacks run synchronously inside the command that caused
//! the change, always against a snapshot copy.

use std::fmt;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<T> = Box<dyn FnMut(&T)>;

pub struct Observers<T> {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
}

impl<T> Observers<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns true if the subscription existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, value: &T) {
        for (_, listener) in &mut self.listeners {
            listener(value);
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<T> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn emit_reaches_every_listener() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut observers: Observers<u32> = Observers::new();
        for tag in 0..3 {
            let seen = Rc::clone(&seen);
            observers.subscribe(move |v| seen.borrow_mut().push((tag, *v)));
        }
        observers.emit(&7);
        assert_eq!(*seen.borrow(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut observers: Observers<()> = Observers::new();
        let id = {
            let count = Rc::clone(&count);
            observers.subscribe(move |_| *count.borrow_mut() += 1)
        };
        observers.emit(&());
        assert!(observers.unsubscribe(id));
        assert!(!observers.unsubscribe(id));
        observers.emit(&());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn clear_drops_all_listeners() {
        let mut observers: Observers<()> = Observers::new();
        observers.subscribe(|_| {});
        observers.subscribe(|_| {});
        assert_eq!(observers.len(), 2);
        observers.clear();
        assert!(observers.is_empty());
    }
}
