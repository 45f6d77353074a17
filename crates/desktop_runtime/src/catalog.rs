//! Installed-apps catalog backed by a persisted registry snapshot.
//!
//! The snapshot has its own TTL, independent of the registry client's in-memory cache, so the app
//! store can open from storage after a reload without touching the network.

use std::{cell::RefCell, rc::Rc};

use desktop_app_contract::{AppCategory, AppRegistry, RegistryEntry};
use futures::future::{self, FutureExt, LocalBoxFuture};
use leptos::logging::warn;
use platform_host::{Clock, KeyValueStore};
use serde::{Deserialize, Serialize};

use crate::{
    error::{PersistenceError, RuntimeError},
    persistence::{load_persisted, persist_or_warn},
    registry::RegistryClient,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Registry contents plus the time they were fetched.
pub struct RegistrySnapshot {
    /// Catalog as fetched.
    pub registry: AppRegistry,
    /// Fetch time, unix milliseconds.
    pub fetched_at_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Catalog query.
pub struct CatalogFilter {
    /// Only apps in this category.
    pub category: Option<AppCategory>,
    /// Case-insensitive match against identifier, name and description.
    pub query: Option<String>,
}

impl CatalogFilter {
    fn matches(&self, entry: &RegistryEntry) -> bool {
        if let Some(category) = self.category {
            if entry.manifest.category != category {
                return false;
            }
        }
        let Some(query) = self
            .query
            .as_deref()
            .map(str::trim)
            .filter(|query| !query.is_empty())
        else {
            return true;
        };
        let query = query.to_lowercase();
        [
            Some(entry.name.as_str()),
            Some(entry.manifest.name.as_str()),
            Some(entry.manifest.identifier.as_str()),
            entry.manifest.description.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Serves the app store catalog.
pub struct AppCatalog {
    registry: Rc<RegistryClient>,
    store: Rc<dyn KeyValueStore>,
    key: String,
    ttl_ms: u64,
    clock: Rc<dyn Clock>,
    last_recovery: RefCell<Option<PersistenceError>>,
}

impl AppCatalog {
    /// Catalog persisting its snapshot under `key` for `ttl_secs`.
    pub fn new(
        registry: Rc<RegistryClient>,
        store: Rc<dyn KeyValueStore>,
        key: impl Into<String>,
        ttl_secs: u64,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            store,
            key: key.into(),
            ttl_ms: ttl_secs.saturating_mul(1_000),
            clock,
            last_recovery: RefCell::new(None),
        }
    }

    /// Apps matching `filter`, sorted by name.
    ///
    /// A fresh persisted snapshot is used as is; otherwise the registry is fetched and a new
    /// snapshot persisted.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::RegistryUnavailable`] when a fetch is needed and fails.
    pub fn available_apps(
        &self,
        filter: CatalogFilter,
    ) -> LocalBoxFuture<'_, Result<Vec<RegistryEntry>, RuntimeError>> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return future::ready(Ok(select(&snapshot.registry, &filter))).boxed_local();
        }
        async move {
            let registry = self.fetch_and_persist().await?;
            Ok(select(&registry, &filter))
        }
        .boxed_local()
    }

    /// Refetches the registry, bypassing both caches, and persists a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::RegistryUnavailable`] when the fetch fails.
    pub fn refresh(&self) -> LocalBoxFuture<'_, Result<Rc<AppRegistry>, RuntimeError>> {
        self.registry.clear_cache();
        self.fetch_and_persist().boxed_local()
    }

    /// The persisted snapshot, fresh or not.
    pub fn snapshot(&self) -> Option<RegistrySnapshot> {
        match load_persisted::<RegistrySnapshot>(self.store.as_ref(), &self.key) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("registry snapshot load failed: {err}");
                *self.last_recovery.borrow_mut() = Some(err);
                None
            }
        }
    }

    /// Most recent load or write failure recovered by the catalog.
    pub fn last_recovery(&self) -> Option<PersistenceError> {
        self.last_recovery.borrow().clone()
    }

    fn fresh_snapshot(&self) -> Option<RegistrySnapshot> {
        let snapshot = self.snapshot()?;
        let age_ms = self.clock.now_ms().saturating_sub(snapshot.fetched_at_ms);
        (age_ms < self.ttl_ms).then_some(snapshot)
    }

    async fn fetch_and_persist(&self) -> Result<Rc<AppRegistry>, RuntimeError> {
        let registry = self.registry.fetch_registry().await?;
        let snapshot = RegistrySnapshot {
            registry: (*registry).clone(),
            fetched_at_ms: self.clock.now_ms(),
        };
        if let Some(err) =
            persist_or_warn(self.store.as_ref(), &self.key, &snapshot, "registry snapshot")
        {
            *self.last_recovery.borrow_mut() = Some(err);
        }
        Ok(registry)
    }
}

fn select(registry: &AppRegistry, filter: &CatalogFilter) -> Vec<RegistryEntry> {
    let mut entries: Vec<RegistryEntry> = registry
        .apps
        .values()
        .filter(|entry| filter.matches(entry))
        .cloned()
        .collect();
    entries.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.manifest.identifier.cmp(&b.manifest.identifier))
    });
    entries
}
