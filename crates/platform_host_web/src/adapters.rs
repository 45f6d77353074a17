use desktop_app_contract::ImportedBundle;
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use platform_host::{
    BundleFuture, BundleImporter, HttpClient, HttpFuture, HttpResponse, KeyHandler,
    KeyListenerGuard, KeyValueStore, KeyboardHost, NoopBundleImporter, NoopHttpClient,
    NoopKeyValueStore, NoopKeyboardHost, NoopSpawner,
};

use crate::{WebBundleImporter, WebHttpClient, WebKeyboardHost, WebLocalStorage, WebSpawner};

#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Compile-time selected host strategy for `platform_host_web` adapters.
pub enum HostStrategy {
    /// Browser-backed adapters from `platform_host_web`.
    Browser,
    /// Inert adapters used for headless desktop builds.
    DesktopStub,
}

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "desktop-host-stub")]
    {
        HostStrategy::DesktopStub
    }

    #[cfg(not(feature = "desktop-host-stub"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    match selected_host_strategy() {
        HostStrategy::Browser => "browser",
        HostStrategy::DesktopStub => "desktop-stub",
    }
}

/// Adapter enum that erases the concrete key/value backend behind [`KeyValueStore`].
#[derive(Debug, Clone, Copy)]
pub enum KeyValueStoreAdapter {
    /// Browser `localStorage`.
    Browser(WebLocalStorage),
    /// No-op fallback.
    DesktopStub(NoopKeyValueStore),
}

impl KeyValueStore for KeyValueStoreAdapter {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        match self {
            Self::Browser(store) => store.get(key),
            Self::DesktopStub(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        match self {
            Self::Browser(store) => store.set(key, value),
            Self::DesktopStub(store) => store.set(key, value),
        }
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        match self {
            Self::Browser(store) => store.remove(key),
            Self::DesktopStub(store) => store.remove(key),
        }
    }
}

/// Adapter enum that erases the concrete fetch backend behind [`HttpClient`].
#[derive(Debug, Clone, Copy)]
pub enum HttpClientAdapter {
    /// Browser `fetch`.
    Browser(WebHttpClient),
    /// Offline fallback.
    DesktopStub(NoopHttpClient),
}

impl HttpClient for HttpClientAdapter {
    fn get<'a>(&'a self, url: &'a str) -> HttpFuture<'a, Result<HttpResponse, String>> {
        match self {
            Self::Browser(client) => client.get(url),
            Self::DesktopStub(client) => client.get(url),
        }
    }
}

/// Adapter enum that erases the concrete import backend behind [`BundleImporter`].
#[derive(Debug, Clone, Copy)]
pub enum BundleImporterAdapter {
    /// Browser dynamic `import()`.
    Browser(WebBundleImporter),
    /// Fallback that rejects every import.
    DesktopStub(NoopBundleImporter),
}

impl BundleImporter for BundleImporterAdapter {
    fn import<'a>(&'a self, url: &'a str) -> BundleFuture<'a, Result<ImportedBundle, String>> {
        match self {
            Self::Browser(importer) => importer.import(url),
            Self::DesktopStub(importer) => importer.import(url),
        }
    }
}

/// Adapter enum that erases the concrete keyboard backend behind [`KeyboardHost`].
#[derive(Debug, Clone, Copy)]
pub enum KeyboardHostAdapter {
    /// Browser `window` keydown listeners.
    Browser(WebKeyboardHost),
    /// Fallback without a key stream.
    DesktopStub(NoopKeyboardHost),
}

impl KeyboardHost for KeyboardHostAdapter {
    fn attach(&self, handler: KeyHandler) -> KeyListenerGuard {
        match self {
            Self::Browser(host) => host.attach(handler),
            Self::DesktopStub(host) => host.attach(handler),
        }
    }
}

/// Adapter enum that erases the concrete executor behind [`LocalSpawn`].
#[derive(Debug, Clone, Copy)]
pub enum TaskSpawnerAdapter {
    /// Browser event loop.
    Browser(WebSpawner),
    /// No executor; spawned work is refused.
    DesktopStub(NoopSpawner),
}

impl LocalSpawn for TaskSpawnerAdapter {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        match self {
            Self::Browser(spawner) => spawner.spawn_local_obj(future),
            Self::DesktopStub(spawner) => spawner.spawn_local_obj(future),
        }
    }

    fn status_local(&self) -> Result<(), SpawnError> {
        match self {
            Self::Browser(spawner) => spawner.status_local(),
            Self::DesktopStub(spawner) => spawner.status_local(),
        }
    }
}

/// Builds the key/value adapter for the compile-time selected host strategy.
pub fn key_value_store() -> KeyValueStoreAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => KeyValueStoreAdapter::Browser(WebLocalStorage),
        HostStrategy::DesktopStub => KeyValueStoreAdapter::DesktopStub(NoopKeyValueStore),
    }
}

/// Builds the HTTP adapter for the compile-time selected host strategy.
pub fn http_client() -> HttpClientAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => HttpClientAdapter::Browser(WebHttpClient),
        HostStrategy::DesktopStub => HttpClientAdapter::DesktopStub(NoopHttpClient),
    }
}

/// Builds the bundle-import adapter for the compile-time selected host strategy.
pub fn bundle_importer() -> BundleImporterAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => BundleImporterAdapter::Browser(WebBundleImporter),
        HostStrategy::DesktopStub => BundleImporterAdapter::DesktopStub(NoopBundleImporter),
    }
}

/// Builds the keyboard adapter for the compile-time selected host strategy.
pub fn keyboard_host() -> KeyboardHostAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => KeyboardHostAdapter::Browser(WebKeyboardHost),
        HostStrategy::DesktopStub => KeyboardHostAdapter::DesktopStub(NoopKeyboardHost),
    }
}

/// Builds the task spawner for the compile-time selected host strategy.
pub fn task_spawner() -> TaskSpawnerAdapter {
    match selected_host_strategy() {
        HostStrategy::Browser => TaskSpawnerAdapter::Browser(WebSpawner),
        HostStrategy::DesktopStub => TaskSpawnerAdapter::DesktopStub(NoopSpawner),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_build_selects_browser_strategy() {
        #[cfg(not(feature = "desktop-host-stub"))]
        {
            assert_eq!(selected_host_strategy(), HostStrategy::Browser);
            assert_eq!(host_strategy_name(), "browser");
            assert!(matches!(key_value_store(), KeyValueStoreAdapter::Browser(_)));
        }
    }

    #[test]
    fn non_wasm_browser_adapters_degrade_without_panicking() {
        let store = key_value_store();
        assert_eq!(store.get("k").expect("get"), None);
        store.set("k", "v").expect("set");
        assert!(futures::executor::block_on(http_client().get("https://a.test")).is_err());
        assert!(futures::executor::block_on(bundle_importer().import("https://a.test/x.js")).is_err());
        assert!(task_spawner().status_local().is_err());
    }
}
