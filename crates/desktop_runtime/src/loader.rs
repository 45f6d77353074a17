//! Module loader: resolves app identifiers to code bundles, imports them, and caches the loaded
//! handles for the life of the session.
//!
//! At most one load per identifier is in flight. The in-flight future itself is memoized, so every
//! caller that arrives before it settles shares its single import and its outcome. Each load is
//! also handed to the host spawner, so it still completes and fills the cache when every caller
//! has dropped its future. Successful loads are cached; failures are not, so a later call retries.

mod resolver;

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use desktop_app_contract::{
    AppComponent, AppManifest, AppSource, ApplicationId, LoadedApplication,
};
use futures::{
    future::{self, FutureExt, LocalBoxFuture, Shared},
    task::{LocalSpawn, LocalSpawnExt},
};
use leptos::logging::{log, warn};
use platform_host::BundleImporter;

pub use resolver::{BundleLocation, BundleResolver, CdnBundleResolver};

use crate::{error::RuntimeError, registry::RegistryClient};

/// Result of a load shared by every waiter.
pub type LoadOutcome = Result<Rc<LoadedApplication>, RuntimeError>;

type InFlightLoad = Shared<LocalBoxFuture<'static, LoadOutcome>>;

struct LoaderInner {
    registry: Rc<RegistryClient>,
    resolver: Rc<dyn BundleResolver>,
    importer: Rc<dyn BundleImporter>,
    spawner: Rc<dyn LocalSpawn>,
    loaded: RefCell<HashMap<ApplicationId, Rc<LoadedApplication>>>,
    in_flight: RefCell<HashMap<ApplicationId, InFlightLoad>>,
}

#[derive(Clone)]
/// Loads and caches applications. Clones share the same caches.
pub struct ModuleLoader {
    inner: Rc<LoaderInner>,
}

impl ModuleLoader {
    /// Creates a loader with empty caches. In-flight loads are driven on `spawner`.
    pub fn new(
        registry: Rc<RegistryClient>,
        resolver: Rc<dyn BundleResolver>,
        importer: Rc<dyn BundleImporter>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        Self {
            inner: Rc::new(LoaderInner {
                registry,
                resolver,
                importer,
                spawner,
                loaded: RefCell::new(HashMap::new()),
                in_flight: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Loads `identifier` through the registry.
    ///
    /// A cached app resolves immediately. Otherwise the registry entry is resolved to a bundle
    /// location, the primary URL is imported, and on failure the fallback URL is tried once.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::RegistryUnavailable`] when no catalog can be fetched,
    /// [`RuntimeError::AppNotFound`] when the catalog lacks `identifier`, and
    /// [`RuntimeError::AppLoadFailed`] when no host yields a default export.
    pub fn load_app(&self, identifier: &ApplicationId) -> LocalBoxFuture<'static, LoadOutcome> {
        if let Some(loaded) = self.loaded(identifier) {
            return future::ready(Ok(loaded)).boxed_local();
        }

        let inner = Rc::clone(&self.inner);
        let id = identifier.clone();
        self.join_or_start(identifier, move || load_from_registry(inner, id).boxed_local())
            .boxed_local()
    }

    /// Loads an app from an explicit bundle URL, tagged [`AppSource::External`].
    ///
    /// Shares the cache and in-flight tracking of [`ModuleLoader::load_app`], keyed by the
    /// manifest identifier.
    pub fn load_external(
        &self,
        manifest: AppManifest,
        bundle_url: &str,
    ) -> LocalBoxFuture<'static, LoadOutcome> {
        let identifier = manifest.identifier.clone();
        if let Some(loaded) = self.loaded(&identifier) {
            return future::ready(Ok(loaded)).boxed_local();
        }

        let inner = Rc::clone(&self.inner);
        let location = self.inner.resolver.resolve_url(bundle_url);
        self.join_or_start(&identifier, move || {
            async move {
                let component =
                    import_component(inner.importer.as_ref(), &manifest.identifier, &location)
                        .await?;
                Ok(Rc::new(LoadedApplication {
                    manifest,
                    component,
                    source: AppSource::External,
                }))
            }
            .boxed_local()
        })
        .boxed_local()
    }

    /// Warms the cache for `identifier`; a failure is logged and discarded.
    pub fn preload_app(&self, identifier: &ApplicationId) -> LocalBoxFuture<'static, ()> {
        let load = self.load_app(identifier);
        let identifier = identifier.clone();
        async move {
            if let Err(err) = load.await {
                warn!("preload of `{identifier}` failed: {err}");
            }
        }
        .boxed_local()
    }

    /// Seeds the cache with an app compiled into the shell.
    pub fn register_builtin(
        &self,
        manifest: AppManifest,
        component: AppComponent,
    ) -> Rc<LoadedApplication> {
        let app = Rc::new(LoadedApplication {
            manifest,
            component,
            source: AppSource::Builtin,
        });
        self.inner
            .loaded
            .borrow_mut()
            .insert(app.identifier().clone(), Rc::clone(&app));
        app
    }

    /// Returns whether `identifier` is in the load cache.
    pub fn is_app_loaded(&self, identifier: &ApplicationId) -> bool {
        self.inner.loaded.borrow().contains_key(identifier)
    }

    /// Returns the cached app for `identifier`.
    pub fn loaded(&self, identifier: &ApplicationId) -> Option<Rc<LoadedApplication>> {
        self.inner.loaded.borrow().get(identifier).cloned()
    }

    /// Identifiers currently in the load cache, sorted.
    pub fn loaded_apps(&self) -> Vec<ApplicationId> {
        let mut ids: Vec<_> = self.inner.loaded.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drops every loaded app except builtins and clears the registry cache.
    ///
    /// Loads already in flight still complete and populate the cache.
    pub fn clear_cache(&self) {
        self.inner
            .loaded
            .borrow_mut()
            .retain(|_, app| app.source == AppSource::Builtin);
        self.inner.registry.clear_cache();
    }

    fn join_or_start(
        &self,
        identifier: &ApplicationId,
        start: impl FnOnce() -> LocalBoxFuture<'static, LoadOutcome>,
    ) -> InFlightLoad {
        if let Some(pending) = self.inner.in_flight.borrow().get(identifier) {
            return pending.clone();
        }

        let inner = Rc::clone(&self.inner);
        let id = identifier.clone();
        let load = start();
        let tracked = async move {
            let outcome = load.await;
            inner.in_flight.borrow_mut().remove(&id);
            if let Ok(app) = &outcome {
                inner.loaded.borrow_mut().insert(id, Rc::clone(app));
            }
            outcome
        }
        .boxed_local()
        .shared();

        self.inner
            .in_flight
            .borrow_mut()
            .insert(identifier.clone(), tracked.clone());
        if let Err(err) = self.inner.spawner.spawn_local(tracked.clone().map(|_| ())) {
            log!("load of `{identifier}` progresses only while awaited: {err}");
        }
        tracked
    }
}

async fn load_from_registry(inner: Rc<LoaderInner>, identifier: ApplicationId) -> LoadOutcome {
    let registry = inner.registry.fetch_registry().await?;
    let entry = registry
        .entry(identifier.as_str())
        .ok_or_else(|| RuntimeError::AppNotFound(identifier.clone()))?;
    let location = inner.resolver.resolve(entry);
    let component = import_component(inner.importer.as_ref(), &identifier, &location).await?;

    Ok(Rc::new(LoadedApplication {
        manifest: entry.manifest.clone(),
        component,
        source: AppSource::Registry,
    }))
}

async fn import_component(
    importer: &dyn BundleImporter,
    identifier: &ApplicationId,
    location: &BundleLocation,
) -> Result<AppComponent, RuntimeError> {
    let load_failed = |reason: String| RuntimeError::AppLoadFailed {
        identifier: identifier.clone(),
        reason,
    };

    let bundle = match importer.import(&location.primary).await {
        Ok(bundle) => bundle,
        Err(primary_err) => {
            let Some(fallback) = location.fallback.as_deref() else {
                return Err(load_failed(primary_err));
            };
            warn!(
                "bundle import for `{identifier}` failed at {}: {primary_err}; retrying {fallback}",
                location.primary
            );
            importer
                .import(fallback)
                .await
                .map_err(|fallback_err| load_failed(format!("{primary_err}; {fallback_err}")))?
        }
    };

    bundle
        .default_export
        .ok_or_else(|| load_failed("bundle has no default export".to_string()))
}
