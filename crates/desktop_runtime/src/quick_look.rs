//! Quick Look navigator: the file-preview overlay state machine and its keyboard bindings.
//!
//! While open, `current_index` indexes `file_list` and `current_file` is that entry. The global
//! key listener exists only while the overlay is open.

mod file_type;

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use leptos::logging::warn;
use platform_host::{KeyInput, KeyListenerGuard, KeyOutcome, KeyboardHost};
use serde::{Deserialize, Serialize};

pub use file_type::{file_type, FileType};

use crate::{
    config::PlatformModifier,
    observers::{Observers, SubscriptionHandle},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Pixel dimensions of an image or video.
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// A previewable file. `id` is unique within one preview session.
pub struct QuickLookFile {
    /// Session-scoped id.
    pub id: String,
    /// File name with extension.
    pub name: String,
    /// Virtual path.
    pub path: String,
    /// MIME type when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    /// Image or video dimensions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    /// Media duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Inline text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl QuickLookFile {
    /// File with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            mime_type: None,
            size: None,
            modified: None,
            dimensions: None,
            duration: None,
            content: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Overlay state.
pub struct QuickLookState {
    /// Overlay visible.
    pub is_open: bool,
    /// File being previewed.
    pub current_file: Option<QuickLookFile>,
    /// Siblings navigable with the arrow keys.
    pub file_list: Vec<QuickLookFile>,
    /// Position of `current_file` in `file_list`.
    pub current_index: usize,
    /// Preview fills the screen.
    pub is_fullscreen: bool,
}

struct NavigatorInner {
    state: RefCell<QuickLookState>,
    listener: RefCell<Option<KeyListenerGuard>>,
    keyboard: Rc<dyn KeyboardHost>,
    modifier: PlatformModifier,
    observers: Observers<QuickLookState>,
}

/// Drives the Quick Look overlay. Clones share state.
#[derive(Clone)]
pub struct QuickLookNavigator {
    inner: Rc<NavigatorInner>,
}

impl QuickLookNavigator {
    /// Closed navigator that attaches key bindings through `keyboard` while open.
    pub fn new(keyboard: Rc<dyn KeyboardHost>, modifier: PlatformModifier) -> Self {
        Self {
            inner: Rc::new(NavigatorInner {
                state: RefCell::new(QuickLookState::default()),
                listener: RefCell::new(None),
                keyboard,
                modifier,
                observers: Observers::default(),
            }),
        }
    }

    /// Opens the overlay on `file`.
    ///
    /// `file_list` defaults to `[file]`, as does an empty list. When `file` is not in the list
    /// the overlay opens on the first entry.
    pub fn show_quick_look(&self, file: QuickLookFile, file_list: Option<Vec<QuickLookFile>>) {
        let file_list = match file_list {
            Some(list) if !list.is_empty() => list,
            _ => vec![file.clone()],
        };
        let current_index = match file_list.iter().position(|candidate| candidate.id == file.id) {
            Some(index) => index,
            None => {
                warn!(
                    "quick look file `{}` is not in its file list; opening `{}`",
                    file.id, file_list[0].id
                );
                0
            }
        };

        *self.inner.state.borrow_mut() = QuickLookState {
            is_open: true,
            current_file: file_list.get(current_index).cloned(),
            file_list,
            current_index,
            is_fullscreen: false,
        };
        self.attach_keyboard();
        self.inner.notify();
    }

    /// Moves to the next file; no-op at the end or while closed.
    pub fn next_file(&self) -> bool {
        self.inner.step(1)
    }

    /// Moves to the previous file; no-op at the start or while closed.
    pub fn prev_file(&self) -> bool {
        self.inner.step(-1)
    }

    /// Closes the overlay, keeping the file list and index.
    pub fn hide_quick_look(&self) -> bool {
        self.inner.hide()
    }

    /// Flips fullscreen while open.
    pub fn toggle_fullscreen(&self) -> bool {
        self.inner.toggle_fullscreen()
    }

    /// Current overlay state.
    pub fn state(&self) -> QuickLookState {
        self.inner.state.borrow().clone()
    }

    /// Returns whether the overlay is open.
    pub fn is_open(&self) -> bool {
        self.inner.state.borrow().is_open
    }

    /// Classifies `file` for preview.
    pub fn file_type(&self, file: &QuickLookFile) -> FileType {
        file_type(file)
    }

    /// Calls `listener` with the new state after every change, including key-driven ones.
    pub fn subscribe(
        &self,
        listener: impl Fn(&QuickLookState) + 'static,
    ) -> SubscriptionHandle {
        self.inner.observers.subscribe(listener)
    }

    fn attach_keyboard(&self) {
        if self.inner.listener.borrow().is_some() {
            return;
        }
        let weak: Weak<NavigatorInner> = Rc::downgrade(&self.inner);
        let guard = self.inner.keyboard.attach(Rc::new(move |input: &KeyInput| {
            weak.upgrade()
                .map(|inner| inner.handle_key(input))
                .unwrap_or(KeyOutcome::Ignored)
        }));
        *self.inner.listener.borrow_mut() = Some(guard);
    }
}

impl NavigatorInner {
    fn step(&self, delta: isize) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if !state.is_open {
                return false;
            }
            let Some(target) = state.current_index.checked_add_signed(delta) else {
                return false;
            };
            let Some(file) = state.file_list.get(target).cloned() else {
                return false;
            };
            state.current_index = target;
            state.current_file = Some(file);
        }
        self.notify();
        true
    }

    fn hide(&self) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if !state.is_open {
                return false;
            }
            state.is_open = false;
            state.is_fullscreen = false;
        }
        let guard = self.listener.borrow_mut().take();
        drop(guard);
        self.notify();
        true
    }

    fn toggle_fullscreen(&self) -> bool {
        {
            let mut state = self.state.borrow_mut();
            if !state.is_open {
                return false;
            }
            state.is_fullscreen = !state.is_fullscreen;
        }
        self.notify();
        true
    }

    fn handle_key(&self, input: &KeyInput) -> KeyOutcome {
        if !self.state.borrow().is_open {
            return KeyOutcome::Ignored;
        }
        match input.key.as_str() {
            "Escape" | " " | "Spacebar" => {
                self.hide();
            }
            "ArrowRight" | "ArrowDown" => {
                self.step(1);
            }
            "ArrowLeft" | "ArrowUp" => {
                self.step(-1);
            }
            "f" | "F" if modifier_held(self.modifier, input) => {
                self.toggle_fullscreen();
            }
            _ => return KeyOutcome::Ignored,
        }
        KeyOutcome::Consumed
    }

    fn notify(&self) {
        let state = self.state.borrow().clone();
        self.observers.emit(&state);
    }
}

fn modifier_held(modifier: PlatformModifier, input: &KeyInput) -> bool {
    match modifier {
        PlatformModifier::Meta => input.meta,
        PlatformModifier::Control => input.ctrl,
        PlatformModifier::Any => input.meta || input.ctrl,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use platform_host::MemoryKeyboardHost;
    use pretty_assertions::assert_eq;

    use super::*;

    fn file(id: &str) -> QuickLookFile {
        QuickLookFile::new(id, format!("{id}.png"), format!("/Pictures/{id}.png"))
    }

    fn files() -> Vec<QuickLookFile> {
        vec![file("a"), file("b"), file("c")]
    }

    fn navigator() -> (MemoryKeyboardHost, QuickLookNavigator) {
        let host = MemoryKeyboardHost::default();
        let navigator = QuickLookNavigator::new(Rc::new(host.clone()), PlatformModifier::Any);
        (host, navigator)
    }

    fn assert_open_invariant(navigator: &QuickLookNavigator) {
        let state = navigator.state();
        assert!(state.is_open);
        assert_eq!(
            state.current_file.as_ref(),
            state.file_list.get(state.current_index)
        );
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let (_host, navigator) = navigator();
        navigator.show_quick_look(file("b"), Some(files()));
        assert_eq!(navigator.state().current_index, 1);

        assert!(navigator.next_file());
        assert_eq!(navigator.state().current_index, 2);
        assert!(!navigator.next_file());
        assert_eq!(navigator.state().current_index, 2);

        for _ in 0..3 {
            navigator.prev_file();
        }
        assert_eq!(navigator.state().current_index, 0);
        assert_eq!(navigator.state().current_file, Some(file("a")));
        assert_open_invariant(&navigator);
    }

    #[test]
    fn omitted_or_empty_list_previews_single_file() {
        let (_host, navigator) = navigator();
        navigator.show_quick_look(file("solo"), None);
        assert_eq!(navigator.state().file_list, vec![file("solo")]);

        navigator.show_quick_look(file("other"), Some(Vec::new()));
        assert_eq!(navigator.state().file_list, vec![file("other")]);
        assert_open_invariant(&navigator);
    }

    #[test]
    fn file_missing_from_list_opens_first_entry() {
        let (_host, navigator) = navigator();
        navigator.show_quick_look(file("zzz"), Some(files()));

        let state = navigator.state();
        assert_eq!(state.current_index, 0);
        assert_eq!(state.current_file, Some(file("a")));
        assert_open_invariant(&navigator);
    }

    #[test]
    fn hide_keeps_list_and_resets_flags() {
        let (host, navigator) = navigator();
        navigator.show_quick_look(file("c"), Some(files()));
        navigator.toggle_fullscreen();

        assert!(navigator.hide_quick_look());

        let state = navigator.state();
        assert!(!state.is_open);
        assert!(!state.is_fullscreen);
        assert_eq!(state.current_index, 2);
        assert_eq!(state.file_list.len(), 3);
        assert_eq!(host.listener_count(), 0);
        assert!(!navigator.hide_quick_look());
        assert!(!navigator.toggle_fullscreen());
        assert!(!navigator.next_file());
    }

    #[test]
    fn key_bindings_are_consumed_only_while_open() {
        let (host, navigator) = navigator();
        assert_eq!(host.listener_count(), 0);

        navigator.show_quick_look(file("a"), Some(files()));
        navigator.show_quick_look(file("a"), Some(files()));
        assert_eq!(host.listener_count(), 1);

        assert_eq!(host.dispatch(&KeyInput::key("ArrowRight")), KeyOutcome::Consumed);
        assert_eq!(host.dispatch(&KeyInput::key("ArrowDown")), KeyOutcome::Consumed);
        assert_eq!(navigator.state().current_index, 2);
        assert_eq!(host.dispatch(&KeyInput::key("ArrowUp")), KeyOutcome::Consumed);
        assert_eq!(navigator.state().current_index, 1);

        assert_eq!(host.dispatch(&KeyInput::key("f")), KeyOutcome::Ignored);
        assert_eq!(host.dispatch(&KeyInput::key("f").with_meta()), KeyOutcome::Consumed);
        assert!(navigator.state().is_fullscreen);
        assert_eq!(host.dispatch(&KeyInput::key("Enter")), KeyOutcome::Ignored);

        assert_eq!(host.dispatch(&KeyInput::key(" ")), KeyOutcome::Consumed);
        assert!(!navigator.is_open());
        assert!(!navigator.state().is_fullscreen);
        assert_eq!(host.listener_count(), 0);
        assert_eq!(host.dispatch(&KeyInput::key("Escape")), KeyOutcome::Ignored);
    }

    #[test]
    fn meta_only_modifier_ignores_control() {
        let host = MemoryKeyboardHost::default();
        let navigator = QuickLookNavigator::new(Rc::new(host.clone()), PlatformModifier::Meta);
        navigator.show_quick_look(file("a"), None);

        assert_eq!(host.dispatch(&KeyInput::key("f").with_ctrl()), KeyOutcome::Ignored);
        assert_eq!(host.dispatch(&KeyInput::key("F").with_meta()), KeyOutcome::Consumed);
        assert!(navigator.state().is_fullscreen);
    }

    #[test]
    fn subscribers_see_key_driven_changes() {
        let (host, navigator) = navigator();
        let changes = Rc::new(Cell::new(0));
        let _subscription = {
            let changes = Rc::clone(&changes);
            navigator.subscribe(move |_state| changes.set(changes.get() + 1))
        };

        navigator.show_quick_look(file("a"), Some(files()));
        host.dispatch(&KeyInput::key("ArrowRight"));
        host.dispatch(&KeyInput::key("Escape"));

        assert_eq!(changes.get(), 3);
    }

    #[test]
    fn dropping_navigator_detaches_listener() {
        let (host, navigator) = navigator();
        navigator.show_quick_look(file("a"), None);
        assert_eq!(host.listener_count(), 1);

        drop(navigator);

        assert_eq!(host.listener_count(), 0);
    }

    #[test]
    fn file_type_is_exposed_on_navigator() {
        let (_host, navigator) = navigator();
        assert_eq!(navigator.file_type(&file("a")), FileType::Image);
    }
}
