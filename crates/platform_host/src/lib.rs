//! Typed host-domain contracts used by the desktop session runtime and its browser adapters.
//!
//! This crate is the API-first boundary for platform services. It exposes the storage, fetch,
//! bundle-import, keyboard, task-spawn, and clock ports together with no-op and in-memory
//! adapters; concrete browser adapters live in `platform_host_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod bundle;
pub mod http;
pub mod keyboard;
pub mod spawn;
pub mod storage;
pub mod time;

pub use bundle::{BundleFuture, BundleImporter, MemoryBundleImporter, NoopBundleImporter};
pub use http::{HttpClient, HttpFuture, HttpResponse, MemoryHttpClient, NoopHttpClient};
pub use keyboard::{
    KeyHandler, KeyInput, KeyListenerGuard, KeyOutcome, KeyboardHost, MemoryKeyboardHost,
    NoopKeyboardHost,
};
pub use spawn::NoopSpawner;
pub use storage::kv::{save_json_with, KeyValueStore, MemoryKeyValueStore, NoopKeyValueStore};
pub use time::{unix_time_ms_now, Clock, ManualClock, SystemClock};
