//! Session composition root.
//!
//! A [`DesktopSession`] owns one instance of every runtime component, wired to the ports in a
//! [`SessionHost`]. Nothing is global: each session (and each test) gets fresh caches and counters.

use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use desktop_app_contract::{AppComponent, ApplicationId, LoadedApplication};
use futures::{
    future::{FutureExt, LocalBoxFuture},
    task::LocalSpawn,
};
use leptos::logging::{log, warn};
use platform_host::{BundleImporter, Clock, HttpClient, KeyValueStore, KeyboardHost, SystemClock};

use crate::{
    builtin::builtin_manifests,
    catalog::AppCatalog,
    config::RuntimeConfig,
    dock::DockStore,
    error::{PersistenceError, RuntimeError},
    installed::InstalledAppsStore,
    loader::{CdnBundleResolver, ModuleLoader},
    persistence::{load_persisted, persist_or_warn},
    quick_look::QuickLookNavigator,
    registry::RegistryClient,
    window_stack::{WindowStack, WindowStackSnapshot},
};

#[derive(Clone)]
/// Host ports a session runs on.
pub struct SessionHost {
    /// Durable key/value storage.
    pub storage: Rc<dyn KeyValueStore>,
    /// Registry fetches.
    pub http: Rc<dyn HttpClient>,
    /// Bundle imports.
    pub importer: Rc<dyn BundleImporter>,
    /// Global key listener.
    pub keyboard: Rc<dyn KeyboardHost>,
    /// Executor for app loads that outlive their callers.
    pub spawner: Rc<dyn LocalSpawn>,
    /// Wall clock.
    pub clock: Rc<dyn Clock>,
}

impl SessionHost {
    /// Ports selected by `platform_host_web` for the current build.
    pub fn browser() -> Self {
        log!(
            "desktop session host strategy: {}",
            platform_host_web::host_strategy_name()
        );
        Self {
            storage: Rc::new(platform_host_web::key_value_store()),
            http: Rc::new(platform_host_web::http_client()),
            importer: Rc::new(platform_host_web::bundle_importer()),
            keyboard: Rc::new(platform_host_web::keyboard_host()),
            spawner: Rc::new(platform_host_web::task_spawner()),
            clock: Rc::new(SystemClock),
        }
    }
}

/// One desktop session: registry, loader, catalog, installed apps, windows, dock and Quick Look.
pub struct DesktopSession {
    config: RuntimeConfig,
    storage: Rc<dyn KeyValueStore>,
    registry: Rc<RegistryClient>,
    loader: ModuleLoader,
    catalog: AppCatalog,
    installed: InstalledAppsStore,
    dock: DockStore,
    quick_look: QuickLookNavigator,
    windows: RefCell<WindowStack>,
    window_recovery: RefCell<Option<PersistenceError>>,
}

impl DesktopSession {
    /// Builds a session, restoring persisted dock, installed apps and window stack.
    pub fn new(config: RuntimeConfig, host: SessionHost) -> Self {
        let registry = Rc::new(RegistryClient::new(
            config.registry.clone(),
            config.bundles.clone(),
            Rc::clone(&host.http),
            Rc::clone(&host.clock),
        ));
        let loader = ModuleLoader::new(
            Rc::clone(&registry),
            Rc::new(CdnBundleResolver::new(&config.bundles)),
            Rc::clone(&host.importer),
            Rc::clone(&host.spawner),
        );
        let catalog = AppCatalog::new(
            Rc::clone(&registry),
            Rc::clone(&host.storage),
            config.storage.registry_snapshot.clone(),
            config.catalog.snapshot_ttl_secs,
            Rc::clone(&host.clock),
        );
        let installed = InstalledAppsStore::load(
            Rc::clone(&host.storage),
            config.storage.installed_apps.clone(),
            builtin_manifests(),
            Rc::clone(&host.clock),
        );
        let dock = DockStore::load(
            Rc::clone(&host.storage),
            config.storage.dock.clone(),
            config.dock.default_items.clone(),
        );
        let quick_look =
            QuickLookNavigator::new(Rc::clone(&host.keyboard), config.quick_look.fullscreen_modifier);

        let floor = config.windows.z_index_floor;
        let (windows, window_recovery) =
            match load_persisted::<WindowStackSnapshot>(host.storage.as_ref(), &config.storage.windows) {
                Ok(snapshot) => (
                    snapshot
                        .map(|snapshot| WindowStack::from_snapshot(snapshot, floor))
                        .unwrap_or_else(|| WindowStack::new(floor)),
                    None,
                ),
                Err(err) => {
                    warn!("window stack load failed, starting empty: {err}");
                    (WindowStack::new(floor), Some(err))
                }
            };

        Self {
            storage: host.storage,
            registry,
            loader,
            catalog,
            installed,
            dock,
            quick_look,
            windows: RefCell::new(windows),
            window_recovery: RefCell::new(window_recovery),
            config,
        }
    }

    /// Session on the browser host ports.
    pub fn browser(config: RuntimeConfig) -> Self {
        Self::new(config, SessionHost::browser())
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Registry client.
    pub fn registry(&self) -> &RegistryClient {
        &self.registry
    }

    /// Module loader.
    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    /// App store catalog.
    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    /// Installed apps.
    pub fn installed(&self) -> &InstalledAppsStore {
        &self.installed
    }

    /// Dock order store.
    pub fn dock(&self) -> &DockStore {
        &self.dock
    }

    /// Quick Look navigator.
    pub fn quick_look(&self) -> &QuickLookNavigator {
        &self.quick_look
    }

    /// Read access to the window stack.
    pub fn windows(&self) -> Ref<'_, WindowStack> {
        self.windows.borrow()
    }

    /// Mutates the window stack and persists it afterwards.
    pub fn with_windows<R>(&self, mutate: impl FnOnce(&mut WindowStack) -> R) -> R {
        let result = mutate(&mut self.windows.borrow_mut());
        let snapshot = self.windows.borrow().snapshot();
        if let Some(err) = persist_or_warn(
            self.storage.as_ref(),
            &self.config.storage.windows,
            &snapshot,
            "window stack",
        ) {
            *self.window_recovery.borrow_mut() = Some(err);
        }
        result
    }

    /// Most recent window-stack load or write failure.
    pub fn window_recovery(&self) -> Option<PersistenceError> {
        self.window_recovery.borrow().clone()
    }

    /// Registers the component for a builtin app declared in `builtin_apps.toml`.
    ///
    /// Returns `None` when `identifier` is not a builtin.
    pub fn register_builtin(
        &self,
        identifier: &str,
        component: AppComponent,
    ) -> Option<Rc<LoadedApplication>> {
        let manifest = builtin_manifests()
            .into_iter()
            .find(|manifest| manifest.identifier.as_str() == identifier)?;
        Some(self.loader.register_builtin(manifest, component))
    }

    /// Loads `identifier` and, on success, opens `window_id` on top of the stack.
    ///
    /// A failed load leaves windows, dock and Quick Look untouched.
    ///
    /// # Errors
    ///
    /// Propagates the [`RuntimeError`] from [`ModuleLoader::load_app`].
    pub fn launch_app(
        &self,
        identifier: &ApplicationId,
        window_id: impl Into<String>,
    ) -> LocalBoxFuture<'_, Result<Rc<LoadedApplication>, RuntimeError>> {
        let load = self.loader.load_app(identifier);
        let window_id = window_id.into();
        async move {
            let app = load.await?;
            self.with_windows(|windows| windows.open_window(&window_id));
            Ok(app)
        }
        .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::{AppSource, ImportedBundle};
    use futures::executor::{block_on, LocalPool};
    use platform_host::{
        HttpResponse, KeyInput, KeyOutcome, ManualClock, MemoryBundleImporter, MemoryHttpClient,
        MemoryKeyValueStore, MemoryKeyboardHost,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::quick_look::QuickLookFile;

    const PRIMARY: &str = "https://raw.githubusercontent.com/desktop-apps/registry/main/registry.json";
    const WEATHER_CDN: &str = "https://cdn.jsdelivr.net/gh/desktop-apps/weather@1.0.0/dist/index.js";

    struct Ports {
        storage: MemoryKeyValueStore,
        http: MemoryHttpClient,
        importer: MemoryBundleImporter,
        keyboard: MemoryKeyboardHost,
        pool: LocalPool,
    }

    impl Ports {
        fn new() -> Self {
            let http = MemoryHttpClient::default();
            http.respond(
                PRIMARY,
                HttpResponse::ok(
                    json!({
                        "apps": {
                            "weather": {
                                "name": "Weather",
                                "version": "1.0.0",
                                "bundleURL": WEATHER_CDN,
                                "manifest": { "identifier": "weather", "name": "Weather", "version": "1.0.0" }
                            }
                        },
                        "updated": "2024-05-01T00:00:00Z"
                    })
                    .to_string(),
                ),
            );
            Self {
                storage: MemoryKeyValueStore::default(),
                http,
                importer: MemoryBundleImporter::default(),
                keyboard: MemoryKeyboardHost::default(),
                pool: LocalPool::new(),
            }
        }

        fn session(&self) -> DesktopSession {
            DesktopSession::new(
                RuntimeConfig::default(),
                SessionHost {
                    storage: Rc::new(self.storage.clone()),
                    http: Rc::new(self.http.clone()),
                    importer: Rc::new(self.importer.clone()),
                    keyboard: Rc::new(self.keyboard.clone()),
                    spawner: Rc::new(self.pool.spawner()),
                    clock: Rc::new(ManualClock::starting_at(0)),
                },
            )
        }
    }

    #[test]
    fn fresh_session_seeds_dock_and_builtins() {
        let ports = Ports::new();
        let session = ports.session();

        assert!(session.dock().is_item_pinned("finder"));
        assert_eq!(
            session.dock().items().len(),
            RuntimeConfig::default().dock.default_items.len()
        );
        assert!(session
            .installed()
            .is_installed(&ApplicationId::trusted("finder")));
        assert!(session.windows().is_empty());
    }

    #[test]
    fn window_stack_survives_reload() {
        let ports = Ports::new();
        {
            let session = ports.session();
            session.with_windows(|windows| {
                windows.open_window("finder-1");
                windows.open_window("notes-1");
                windows.focus_window("finder-1");
            });
        }

        let reloaded = ports.session();

        assert_eq!(reloaded.windows().focused_window(), Some("finder-1"));
        let z = reloaded.with_windows(|windows| windows.open_window("mail-1"));
        assert_eq!(z, 104);
        assert_eq!(reloaded.window_recovery(), None);
    }

    #[test]
    fn corrupt_window_state_starts_empty() {
        let ports = Ports::new();
        ports
            .storage
            .set("desktop.windows.v1", "[1, 2")
            .expect("seed corrupt state");

        let session = ports.session();

        assert!(session.windows().is_empty());
        assert!(matches!(
            session.window_recovery(),
            Some(PersistenceError::Corrupt { .. })
        ));
    }

    #[test]
    fn launch_opens_window_only_on_success() {
        let ports = Ports::new();
        let session = ports.session();
        session.with_windows(|windows| {
            windows.open_window("finder-1");
        });
        session
            .quick_look()
            .show_quick_look(QuickLookFile::new("a", "a.txt", "/a.txt"), None);
        let dock_before = session.dock().items();

        let err = block_on(session.launch_app(&ApplicationId::trusted("weather"), "weather-1"))
            .expect_err("bundle missing");

        assert!(matches!(err, RuntimeError::AppLoadFailed { .. }));
        assert_eq!(session.windows().focused_window(), Some("finder-1"));
        assert!(session.windows().window("weather-1").is_none());
        assert_eq!(session.dock().items(), dock_before);
        assert!(session.quick_look().is_open());
        assert_eq!(
            ports.keyboard.dispatch(&KeyInput::key("Escape")),
            KeyOutcome::Consumed
        );

        ports.importer.provide(
            WEATHER_CDN,
            ImportedBundle::with_default(AppComponent::foreign("weather")),
        );
        let app = block_on(session.launch_app(&ApplicationId::trusted("weather"), "weather-1"))
            .expect("launch");

        assert_eq!(app.source, AppSource::Registry);
        assert_eq!(session.windows().focused_window(), Some("weather-1"));
    }

    #[test]
    fn builtin_registration_uses_catalog_manifest() {
        let ports = Ports::new();
        let session = ports.session();

        let calculator = session
            .register_builtin("calculator", AppComponent::foreign("calc"))
            .expect("calculator is builtin");
        assert_eq!(calculator.manifest.name, "Calculator");
        assert!(session.register_builtin("weather", AppComponent::foreign("w")).is_none());

        let loaded = block_on(session.launch_app(&ApplicationId::trusted("calculator"), "calc-1"))
            .expect("builtin launch");
        assert_eq!(loaded.source, AppSource::Builtin);
        assert!(ports.http.requests().is_empty());
    }
}
