//! Window stacking and focus.
//!
//! Focus is never stored: the focused window is the non-minimized window with the highest
//! z-index, with the most recent focus winning a tie. Z-indices come from a counter that only
//! moves forward, so a value is never issued twice in a session.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Stacking state of one open window.
pub struct WindowStackEntry {
    /// Shell-assigned window id.
    pub id: String,
    /// Stacking order; higher renders above lower.
    pub z_index: u64,
    /// Hidden from the desktop, kept in the stack.
    pub minimized: bool,
    /// Filling the viewport.
    pub maximized: bool,
    /// Order of the last focus, used to break z-index ties.
    #[serde(default)]
    pub focus_sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Persisted form of a [`WindowStack`].
pub struct WindowStackSnapshot {
    /// Windows ordered bottom to top.
    pub windows: Vec<WindowStackEntry>,
    /// Last z-index issued before the snapshot was taken.
    #[serde(default)]
    pub last_z_index: u64,
}

#[derive(Debug)]
/// Open windows and their stacking order.
pub struct WindowStack {
    windows: Vec<WindowStackEntry>,
    last_z_index: AtomicU64,
    last_focus: u64,
}

impl WindowStack {
    /// Empty stack whose first z-index is `z_index_floor + 1`.
    pub fn new(z_index_floor: u64) -> Self {
        Self {
            windows: Vec::new(),
            last_z_index: AtomicU64::new(z_index_floor),
            last_focus: 0,
        }
    }

    /// Rebuilds a stack from a snapshot. The counter resumes above every restored z-index.
    ///
    /// Duplicate ids keep their first occurrence.
    pub fn from_snapshot(snapshot: WindowStackSnapshot, z_index_floor: u64) -> Self {
        let mut windows: Vec<WindowStackEntry> = Vec::with_capacity(snapshot.windows.len());
        for entry in snapshot.windows {
            if !windows.iter().any(|existing| existing.id == entry.id) {
                windows.push(entry);
            }
        }

        let highest_z = windows.iter().map(|w| w.z_index).max().unwrap_or(0);
        let last_focus = windows.iter().map(|w| w.focus_sequence).max().unwrap_or(0);
        Self {
            windows,
            last_z_index: AtomicU64::new(z_index_floor.max(snapshot.last_z_index).max(highest_z)),
            last_focus,
        }
    }

    /// Issues the next z-index. Every call returns a value greater than all earlier ones.
    pub fn next_z_index(&self) -> u64 {
        self.last_z_index.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Opens `id` on top of the stack, or raises it when already open.
    ///
    /// Returns the window's z-index.
    pub fn open_window(&mut self, id: &str) -> u64 {
        if !self.windows.iter().any(|w| w.id == id) {
            self.windows.push(WindowStackEntry {
                id: id.to_string(),
                z_index: 0,
                minimized: false,
                maximized: false,
                focus_sequence: 0,
            });
        }
        self.raise(id);
        self.window(id).map(|w| w.z_index).unwrap_or_default()
    }

    /// Raises and un-minimizes `id` with a fresh z-index, even when it already has focus.
    ///
    /// Returns `false` only for unknown ids.
    pub fn focus_window(&mut self, id: &str) -> bool {
        self.raise(id)
    }

    /// Brings a minimized window back; restoring raises it like a focus.
    pub fn restore_window(&mut self, id: &str) -> bool {
        self.focus_window(id)
    }

    /// Minimizes `id` without touching its z-index.
    pub fn minimize_window(&mut self, id: &str) -> bool {
        match self.windows.iter_mut().find(|w| w.id == id) {
            Some(window) if !window.minimized => {
                window.minimized = true;
                true
            }
            _ => false,
        }
    }

    /// Removes `id` from the stack.
    pub fn close_window(&mut self, id: &str) -> bool {
        let before = self.windows.len();
        self.windows.retain(|w| w.id != id);
        self.windows.len() != before
    }

    /// Flips `maximized` without affecting stacking.
    pub fn toggle_maximize(&mut self, id: &str) -> bool {
        let Some(window) = self.windows.iter_mut().find(|w| w.id == id) else {
            return false;
        };
        window.maximized = !window.maximized;
        true
    }

    /// The non-minimized window with the highest z-index.
    pub fn focused_window(&self) -> Option<&str> {
        self.windows
            .iter()
            .filter(|w| !w.minimized)
            .max_by_key(|w| (w.z_index, w.focus_sequence))
            .map(|w| w.id.as_str())
    }

    /// Looks up a window by id.
    pub fn window(&self, id: &str) -> Option<&WindowStackEntry> {
        self.windows.iter().find(|w| w.id == id)
    }

    /// Open windows in the order they were opened.
    pub fn windows(&self) -> &[WindowStackEntry] {
        &self.windows
    }

    /// Returns whether no windows are open.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Snapshot with windows ordered bottom to top.
    pub fn snapshot(&self) -> WindowStackSnapshot {
        let mut windows = self.windows.clone();
        windows.sort_by_key(|w| (w.z_index, w.focus_sequence));
        WindowStackSnapshot {
            windows,
            last_z_index: self.last_z_index.load(Ordering::SeqCst),
        }
    }

    fn raise(&mut self, id: &str) -> bool {
        let Some(index) = self.windows.iter().position(|w| w.id == id) else {
            return false;
        };
        let z_index = self.next_z_index();
        self.last_focus += 1;
        let window = &mut self.windows[index];
        window.z_index = z_index;
        window.focus_sequence = self.last_focus;
        window.minimized = false;
        true
    }
}
