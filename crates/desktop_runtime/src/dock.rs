//! Dock order store: the persisted, user-arranged list of dock items.
//!
//! After every mutation `order` is exactly `0..n` in list position, and `finder` is present and
//! pinned. Loading merges persisted state with the built-in defaults: persisted items keep their
//! arrangement and any default id they lack is appended.

use std::{cell::RefCell, rc::Rc};

use leptos::logging::warn;
use platform_host::KeyValueStore;
use serde::{Deserialize, Serialize};

use crate::{
    config::FINDER_ID,
    error::PersistenceError,
    persistence::{load_persisted, persist_or_warn},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One dock entry.
pub struct DockItem {
    /// App or folder id.
    pub id: String,
    /// Kept in the dock when not running.
    pub is_pinned: bool,
    /// Dense zero-based position.
    pub order: usize,
}

impl DockItem {
    fn new(id: impl Into<String>, is_pinned: bool) -> Self {
        Self {
            id: id.into(),
            is_pinned,
            order: 0,
        }
    }
}

/// Persisted dock arrangement.
pub struct DockStore {
    items: RefCell<Vec<DockItem>>,
    defaults: Vec<String>,
    store: Rc<dyn KeyValueStore>,
    key: String,
    last_recovery: RefCell<Option<PersistenceError>>,
}

impl DockStore {
    /// Loads the dock from `store[key]`, merged with `defaults`.
    ///
    /// Unreadable or corrupt state is logged, kept in [`DockStore::last_recovery`], and replaced
    /// by the defaults.
    pub fn load(
        store: Rc<dyn KeyValueStore>,
        key: impl Into<String>,
        defaults: Vec<String>,
    ) -> Self {
        let key = key.into();
        let (persisted, recovery) = match load_persisted::<Vec<DockItem>>(store.as_ref(), &key) {
            Ok(persisted) => (persisted, None),
            Err(err) => {
                warn!("dock state load failed, using defaults: {err}");
                (None, Some(err))
            }
        };

        let items = merge_with_defaults(persisted.clone().unwrap_or_default(), &defaults);
        let dock = Self {
            items: RefCell::new(items),
            defaults,
            store,
            key,
            last_recovery: RefCell::new(recovery),
        };
        if persisted.as_ref() != Some(&*dock.items.borrow()) {
            dock.persist();
        }
        dock
    }

    /// Moves `drag_id` to sit immediately before `drop_id`.
    ///
    /// No-op when the ids are equal or either is absent.
    pub fn reorder_items(&self, drag_id: &str, drop_id: &str) -> bool {
        if drag_id == drop_id {
            return false;
        }
        {
            let mut items = self.items.borrow_mut();
            let Some(from) = items.iter().position(|item| item.id == drag_id) else {
                return false;
            };
            if !items.iter().any(|item| item.id == drop_id) {
                return false;
            }
            let dragged = items.remove(from);
            let to = items
                .iter()
                .position(|item| item.id == drop_id)
                .unwrap_or(items.len());
            items.insert(to, dragged);
            densify(&mut items);
        }
        self.persist();
        true
    }

    /// Removes `id`. `finder` cannot be removed.
    pub fn remove_from_dock(&self, id: &str) -> bool {
        if id == FINDER_ID {
            return false;
        }
        {
            let mut items = self.items.borrow_mut();
            let before = items.len();
            items.retain(|item| item.id != id);
            if items.len() == before {
                return false;
            }
            densify(&mut items);
        }
        self.persist();
        true
    }

    /// Appends `id` unpinned. No-op when already present.
    pub fn add_to_dock(&self, id: &str) -> bool {
        if id.is_empty() || self.is_item_in_dock(id) {
            return false;
        }
        {
            let mut items = self.items.borrow_mut();
            let order = items.len();
            items.push(DockItem {
                id: id.to_string(),
                is_pinned: false,
                order,
            });
        }
        self.persist();
        true
    }

    /// Pins `id`.
    pub fn pin_item(&self, id: &str) -> bool {
        self.set_pinned(id, true)
    }

    /// Unpins `id`. `finder` stays pinned.
    pub fn unpin_item(&self, id: &str) -> bool {
        if id == FINDER_ID {
            return false;
        }
        self.set_pinned(id, false)
    }

    /// Returns whether `id` is in the dock.
    pub fn is_item_in_dock(&self, id: &str) -> bool {
        self.items.borrow().iter().any(|item| item.id == id)
    }

    /// Returns whether `id` is in the dock and pinned.
    pub fn is_item_pinned(&self, id: &str) -> bool {
        self.items
            .borrow()
            .iter()
            .any(|item| item.id == id && item.is_pinned)
    }

    /// Dock items in order.
    pub fn items(&self) -> Vec<DockItem> {
        self.items.borrow().clone()
    }

    /// Pinned dock items in order.
    pub fn pinned_items(&self) -> Vec<DockItem> {
        self.items
            .borrow()
            .iter()
            .filter(|item| item.is_pinned)
            .cloned()
            .collect()
    }

    /// Discards the user's arrangement and restores the defaults.
    pub fn reset_to_defaults(&self) {
        *self.items.borrow_mut() = merge_with_defaults(Vec::new(), &self.defaults);
        self.persist();
    }

    /// Most recent load or write failure recovered by this store.
    pub fn last_recovery(&self) -> Option<PersistenceError> {
        self.last_recovery.borrow().clone()
    }

    fn set_pinned(&self, id: &str, pinned: bool) -> bool {
        {
            let mut items = self.items.borrow_mut();
            let Some(item) = items.iter_mut().find(|item| item.id == id) else {
                return false;
            };
            if item.is_pinned == pinned {
                return false;
            }
            item.is_pinned = pinned;
        }
        self.persist();
        true
    }

    fn persist(&self) {
        let items = self.items.borrow();
        if let Some(err) = persist_or_warn(self.store.as_ref(), &self.key, &*items, "dock state") {
            *self.last_recovery.borrow_mut() = Some(err);
        }
    }
}

fn merge_with_defaults(mut items: Vec<DockItem>, defaults: &[String]) -> Vec<DockItem> {
    items.sort_by_key(|item| item.order);

    let mut merged: Vec<DockItem> = Vec::with_capacity(items.len() + defaults.len());
    for item in items {
        if !item.id.is_empty() && !merged.iter().any(|existing| existing.id == item.id) {
            merged.push(item);
        }
    }
    for id in defaults {
        if !merged.iter().any(|existing| &existing.id == id) {
            merged.push(DockItem::new(id.clone(), true));
        }
    }

    match merged.iter_mut().find(|item| item.id == FINDER_ID) {
        Some(finder) => finder.is_pinned = true,
        None => merged.insert(0, DockItem::new(FINDER_ID, true)),
    }

    densify(&mut merged);
    merged
}

fn densify(items: &mut [DockItem]) {
    for (order, item) in items.iter_mut().enumerate() {
        item.order = order;
    }
}

#[cfg(test)]
mod tests {
    use platform_host::MemoryKeyValueStore;
    use pretty_assertions::assert_eq;

    use super::*;

    const KEY: &str = "desktop.dock.v1";

    fn defaults(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn dock(store: &MemoryKeyValueStore, ids: &[&str]) -> DockStore {
        DockStore::load(Rc::new(store.clone()), KEY, defaults(ids))
    }

    fn ids(dock: &DockStore) -> Vec<String> {
        dock.items().into_iter().map(|item| item.id).collect()
    }

    fn assert_dense(dock: &DockStore) {
        let orders: Vec<usize> = dock.items().iter().map(|item| item.order).collect();
        assert_eq!(orders, (0..orders.len()).collect::<Vec<_>>());
    }

    #[test]
    fn fresh_dock_seeds_pinned_defaults_and_persists() {
        let store = MemoryKeyValueStore::default();
        let dock = dock(&store, &["finder", "safari", "notes"]);

        assert_eq!(ids(&dock), vec!["finder", "safari", "notes"]);
        assert!(dock.is_item_pinned("safari"));
        assert_dense(&dock);
        assert!(store.raw(KEY).is_some());
        assert_eq!(dock.last_recovery(), None);
    }

    #[test]
    fn reorder_inserts_before_drop_target() {
        let store = MemoryKeyValueStore::default();
        let dock = dock(&store, &["finder", "a", "b", "c", "d"]);

        assert!(dock.reorder_items("d", "a"));
        assert_eq!(ids(&dock), vec!["finder", "d", "a", "b", "c"]);
        assert!(dock.reorder_items("a", "c"));
        assert_eq!(ids(&dock), vec!["finder", "d", "b", "a", "c"]);
        assert_dense(&dock);

        assert!(!dock.reorder_items("b", "b"));
        assert!(!dock.reorder_items("ghost", "b"));
        assert!(!dock.reorder_items("b", "ghost"));
        assert_eq!(ids(&dock), vec!["finder", "d", "b", "a", "c"]);
    }

    #[test]
    fn finder_can_move_but_never_unpins_or_leaves() {
        let store = MemoryKeyValueStore::default();
        let dock = dock(&store, &["finder", "a", "b"]);

        assert!(dock.reorder_items("finder", "b"));
        assert_eq!(ids(&dock), vec!["a", "finder", "b"]);
        assert!(dock.is_item_pinned("finder"));

        assert!(!dock.remove_from_dock("finder"));
        assert!(!dock.unpin_item("finder"));
        assert!(dock.is_item_in_dock("finder"));
        assert!(dock.is_item_pinned("finder"));
    }

    #[test]
    fn add_remove_and_pin_keep_order_dense() {
        let store = MemoryKeyValueStore::default();
        let dock = dock(&store, &["finder", "a", "b"]);

        assert!(dock.add_to_dock("weather"));
        assert!(!dock.add_to_dock("weather"));
        let added = dock.items().into_iter().last().expect("added item");
        assert_eq!(added, DockItem { id: "weather".to_string(), is_pinned: false, order: 3 });

        assert!(dock.pin_item("weather"));
        assert!(!dock.pin_item("weather"));
        assert!(dock.unpin_item("a"));
        assert_eq!(
            dock.pinned_items().into_iter().map(|item| item.id).collect::<Vec<_>>(),
            vec!["finder", "b", "weather"]
        );

        assert!(dock.remove_from_dock("a"));
        assert!(!dock.remove_from_dock("a"));
        assert_eq!(ids(&dock), vec!["finder", "b", "weather"]);
        assert_dense(&dock);
    }

    #[test]
    fn reload_keeps_arrangement_and_appends_new_defaults() {
        let store = MemoryKeyValueStore::default();
        {
            let dock = dock(&store, &["finder", "a", "b"]);
            dock.add_to_dock("weather");
            dock.reorder_items("b", "finder");
            dock.unpin_item("a");
        }
        let persisted_before = ids(&dock(&store, &["finder", "a", "b"]));

        let upgraded = dock(&store, &["finder", "a", "b", "mail"]);

        let mut expected = persisted_before.clone();
        expected.push("mail".to_string());
        assert_eq!(ids(&upgraded), expected);
        assert_eq!(persisted_before, vec!["b", "finder", "a", "weather"]);
        assert!(!upgraded.is_item_pinned("a"));
        assert!(upgraded.is_item_pinned("mail"));
        assert_dense(&upgraded);
    }

    #[test]
    fn corrupt_state_falls_back_to_defaults_and_is_observable() {
        let store = MemoryKeyValueStore::with_entries([(KEY, "[{\"id\": 7}")]);

        let dock = dock(&store, &["finder", "a"]);

        assert_eq!(ids(&dock), vec!["finder", "a"]);
        assert!(matches!(
            dock.last_recovery(),
            Some(PersistenceError::Corrupt { ref key, .. }) if key == KEY
        ));
        let rewritten: Vec<DockItem> =
            serde_json::from_str(&store.raw(KEY).expect("rewritten")).expect("valid json");
        assert_eq!(rewritten, dock.items());
    }

    #[test]
    fn persisted_state_missing_finder_is_repaired() {
        let store = MemoryKeyValueStore::with_entries([(
            KEY,
            r#"[{"id":"a","isPinned":true,"order":0},{"id":"a","isPinned":false,"order":1}]"#,
        )]);

        let dock = dock(&store, &["a"]);

        assert_eq!(ids(&dock), vec!["finder", "a"]);
        assert!(dock.is_item_pinned("finder"));
        assert!(dock.is_item_pinned("a"));
    }

    #[test]
    fn reset_restores_defaults() {
        let store = MemoryKeyValueStore::default();
        let dock = dock(&store, &["finder", "a", "b"]);
        dock.add_to_dock("weather");
        dock.remove_from_dock("a");

        dock.reset_to_defaults();

        assert_eq!(ids(&dock), vec!["finder", "a", "b"]);
    }
}
