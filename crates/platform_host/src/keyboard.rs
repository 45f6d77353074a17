//! Global keyboard listener contracts.
//!
//! A [`KeyboardHost`] attaches a handler to the host's global key-down stream and returns a
//! [`KeyListenerGuard`]; dropping the guard detaches the handler. Handlers report whether they
//! consumed the key so the host can suppress its default action.

use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Host-neutral key-down event.
pub struct KeyInput {
    /// Key value (`"Escape"`, `"ArrowRight"`, `" "`, `"f"`, ...).
    pub key: String,
    /// Meta/Command modifier held.
    pub meta: bool,
    /// Control modifier held.
    pub ctrl: bool,
    /// Alt/Option modifier held.
    pub alt: bool,
    /// Shift modifier held.
    pub shift: bool,
}

impl KeyInput {
    /// Unmodified key press.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// Key press with the meta modifier held.
    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Key press with the control modifier held.
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Whether a handler acted on a key.
pub enum KeyOutcome {
    /// The key was handled; the host must prevent its default action.
    Consumed,
    /// The key was not handled.
    Ignored,
}

/// Shared key-down handler.
pub type KeyHandler = Rc<dyn Fn(&KeyInput) -> KeyOutcome>;

/// Detaches a key listener when dropped.
#[must_use = "dropping the guard detaches the listener immediately"]
pub struct KeyListenerGuard {
    detach: Option<Box<dyn FnOnce()>>,
}

impl KeyListenerGuard {
    /// Creates a guard that runs `detach` on drop.
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Guard with nothing to detach.
    pub fn inert() -> Self {
        Self { detach: None }
    }
}

impl Drop for KeyListenerGuard {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

/// Host service for global key-down listeners.
pub trait KeyboardHost {
    /// Attaches `handler` until the returned guard is dropped.
    fn attach(&self, handler: KeyHandler) -> KeyListenerGuard;
}

#[derive(Debug, Clone, Copy, Default)]
/// Keyboard host for targets without a global key stream.
pub struct NoopKeyboardHost;

impl KeyboardHost for NoopKeyboardHost {
    fn attach(&self, _handler: KeyHandler) -> KeyListenerGuard {
        KeyListenerGuard::inert()
    }
}

#[derive(Clone, Default)]
/// In-memory keyboard host; tests dispatch keys with [`MemoryKeyboardHost::dispatch`].
pub struct MemoryKeyboardHost {
    listeners: Rc<RefCell<BTreeMap<u64, KeyHandler>>>,
    next_id: Rc<RefCell<u64>>,
}

impl MemoryKeyboardHost {
    /// Delivers `input` to every attached listener.
    ///
    /// Returns [`KeyOutcome::Consumed`] when any listener consumed the key.
    pub fn dispatch(&self, input: &KeyInput) -> KeyOutcome {
        let handlers: Vec<KeyHandler> = self.listeners.borrow().values().cloned().collect();
        let mut outcome = KeyOutcome::Ignored;
        for handler in handlers {
            if handler(input) == KeyOutcome::Consumed {
                outcome = KeyOutcome::Consumed;
            }
        }
        outcome
    }

    /// Number of currently attached listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl KeyboardHost for MemoryKeyboardHost {
    fn attach(&self, handler: KeyHandler) -> KeyListenerGuard {
        let id = {
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            *next
        };
        self.listeners.borrow_mut().insert(id, handler);
        let listeners = Rc::downgrade(&self.listeners);
        KeyListenerGuard::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().remove(&id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn dropping_guard_detaches_listener() {
        let host = MemoryKeyboardHost::default();
        let hits = Rc::new(Cell::new(0));
        let guard = {
            let hits = hits.clone();
            host.attach(Rc::new(move |_input: &KeyInput| {
                hits.set(hits.get() + 1);
                KeyOutcome::Consumed
            }))
        };

        assert_eq!(host.listener_count(), 1);
        assert_eq!(host.dispatch(&KeyInput::key("Escape")), KeyOutcome::Consumed);
        drop(guard);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.dispatch(&KeyInput::key("Escape")), KeyOutcome::Ignored);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn inert_guard_drops_cleanly() {
        let guard = NoopKeyboardHost.attach(Rc::new(|_: &KeyInput| KeyOutcome::Ignored));
        drop(guard);
    }
}
