//! Global `keydown` listener adapter for browser contexts.

use platform_host::{KeyHandler, KeyListenerGuard, KeyboardHost};

#[derive(Debug, Clone, Copy, Default)]
/// Browser keyboard host attaching listeners to `window`.
pub struct WebKeyboardHost;

impl KeyboardHost for WebKeyboardHost {
    fn attach(&self, handler: KeyHandler) -> KeyListenerGuard {
        #[cfg(target_arch = "wasm32")]
        {
            use platform_host::{KeyInput, KeyOutcome};
            use wasm_bindgen::{closure::Closure, JsCast};

            let Some(window) = web_sys::window() else {
                return KeyListenerGuard::inert();
            };
            let closure = Closure::<dyn FnMut(web_sys::KeyboardEvent)>::new(
                move |ev: web_sys::KeyboardEvent| {
                    let input = KeyInput {
                        key: ev.key(),
                        meta: ev.meta_key(),
                        ctrl: ev.ctrl_key(),
                        alt: ev.alt_key(),
                        shift: ev.shift_key(),
                    };
                    if handler(&input) == KeyOutcome::Consumed {
                        ev.prevent_default();
                    }
                },
            );
            if let Err(err) = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())
            {
                web_sys::console::warn_2(
                    &wasm_bindgen::JsValue::from_str("keydown listener attach failed"),
                    &err,
                );
                return KeyListenerGuard::inert();
            }

            KeyListenerGuard::new(move || {
                let _ = window.remove_event_listener_with_callback(
                    "keydown",
                    closure.as_ref().unchecked_ref(),
                );
                // The handler may be detaching itself from inside its own callback.
                wasm_bindgen_futures::spawn_local(async move {
                    drop(closure);
                });
            })
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = handler;
            KeyListenerGuard::inert()
        }
    }
}
