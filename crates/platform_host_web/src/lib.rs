//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! This crate is the concrete browser-side host wiring layer for the desktop session runtime:
//! `localStorage` persistence, `fetch`, dynamic `import()` of application bundles, the global
//! `keydown` listener, and task spawning on the page's event loop. Non-wasm builds compile every adapter to an inert fallback so the runtime
//! can be tested natively.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and concrete adapter factories for runtime wiring.
pub mod adapters;
pub mod bundle;
pub mod http;
pub mod keyboard;
pub mod spawn;
pub mod storage;

pub use adapters::{
    bundle_importer, host_strategy_name, http_client, key_value_store, keyboard_host,
    selected_host_strategy, task_spawner, BundleImporterAdapter, HostStrategy, HttpClientAdapter,
    KeyValueStoreAdapter, KeyboardHostAdapter, TaskSpawnerAdapter,
};
pub use bundle::WebBundleImporter;
pub use http::WebHttpClient;
pub use keyboard::WebKeyboardHost;
pub use spawn::WebSpawner;
pub use storage::local_storage::WebLocalStorage;
