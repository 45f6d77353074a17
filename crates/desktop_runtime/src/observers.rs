//! Change listeners for session components.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
};

type Listener<E> = Rc<dyn Fn(&E)>;

/// Unsubscribes its listener when dropped.
#[must_use = "dropping the handle unsubscribes immediately"]
pub struct SubscriptionHandle {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

/// Listener registry for events of type `E`.
pub(crate) struct Observers<E> {
    listeners: Rc<RefCell<BTreeMap<u64, Listener<E>>>>,
    next_id: Cell<u64>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(BTreeMap::new())),
            next_id: Cell::new(0),
        }
    }
}

impl<E: 'static> Observers<E> {
    pub(crate) fn subscribe(&self, listener: impl Fn(&E) + 'static) -> SubscriptionHandle {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.listeners.borrow_mut().insert(id, Rc::new(listener));

        let listeners = Rc::downgrade(&self.listeners);
        SubscriptionHandle {
            unsubscribe: Some(Box::new(move || {
                if let Some(listeners) = listeners.upgrade() {
                    listeners.borrow_mut().remove(&id);
                }
            })),
        }
    }

    /// Delivers `event` in subscription order. Listeners may subscribe or unsubscribe while
    /// being notified.
    pub(crate) fn emit(&self, event: &E) {
        let listeners: Vec<Listener<E>> = self.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            listener(event);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }
}
