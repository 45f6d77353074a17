//! Registry client: fetches the catalog of installable apps with an in-memory TTL cache, a primary
//! static catalog, and a paginated fallback listing.

mod fallback;

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
};

use desktop_app_contract::{AppRegistry, RegistryEntry};
use futures::future::{self, join_all, FutureExt, LocalBoxFuture, Shared};
use leptos::logging::{log, warn};
use platform_host::{Clock, HttpClient};
use serde::Deserialize;

use crate::{
    config::{BundleConfig, RegistryConfig},
    error::RuntimeError,
};

/// Result of a registry fetch shared by every waiter.
pub type RegistryOutcome = Result<Rc<AppRegistry>, RuntimeError>;

type InFlightFetch = Shared<LocalBoxFuture<'static, RegistryOutcome>>;

#[derive(Debug, Clone)]
struct CachedRegistry {
    registry: Rc<AppRegistry>,
    fetched_at_ms: u64,
}

/// Primary catalog with entries left undecoded so one bad entry cannot sink the rest.
#[derive(Deserialize)]
struct PublishedCatalog {
    apps: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    updated: String,
}

struct ClientInner {
    config: RegistryConfig,
    bundles: BundleConfig,
    http: Rc<dyn HttpClient>,
    clock: Rc<dyn Clock>,
    cache: RefCell<Option<CachedRegistry>>,
    in_flight: RefCell<Option<InFlightFetch>>,
    generation: Cell<u64>,
}

/// Fetches and caches the app catalog.
///
/// A cached catalog younger than the configured TTL is returned without network access, and
/// callers arriving while a fetch is in flight share it. The cache lives for the process only;
/// nothing here is persisted.
pub struct RegistryClient {
    inner: Rc<ClientInner>,
}

impl RegistryClient {
    /// Creates a client with an empty cache.
    pub fn new(
        config: RegistryConfig,
        bundles: BundleConfig,
        http: Rc<dyn HttpClient>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Rc::new(ClientInner {
                config,
                bundles,
                http,
                clock,
                cache: RefCell::new(None),
                in_flight: RefCell::new(None),
                generation: Cell::new(0),
            }),
        }
    }

    /// Returns the catalog, from cache when fresh, otherwise from the primary endpoint and then the
    /// fallback listing.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::RegistryUnavailable`] only when both sources fail.
    pub fn fetch_registry(&self) -> LocalBoxFuture<'static, RegistryOutcome> {
        if let Some(registry) = self.cached_registry() {
            return future::ready(Ok(registry)).boxed_local();
        }
        if let Some(pending) = self.inner.in_flight.borrow().as_ref() {
            return pending.clone().boxed_local();
        }

        let inner = Rc::clone(&self.inner);
        let generation = inner.generation.get();
        let fetch = async move {
            let outcome = inner.fetch_uncached().await.map(Rc::new);
            // A clear during the fetch orphans it: waiters get the result, the cache does not.
            if inner.generation.get() == generation {
                inner.in_flight.borrow_mut().take();
                if let Ok(registry) = &outcome {
                    *inner.cache.borrow_mut() = Some(CachedRegistry {
                        registry: Rc::clone(registry),
                        fetched_at_ms: inner.clock.now_ms(),
                    });
                }
            }
            outcome
        }
        .boxed_local()
        .shared();

        *self.inner.in_flight.borrow_mut() = Some(fetch.clone());
        fetch.boxed_local()
    }

    /// Drops the cached catalog so the next fetch goes to the network, even if one is in flight.
    pub fn clear_cache(&self) {
        self.inner.generation.set(self.inner.generation.get() + 1);
        self.inner.cache.borrow_mut().take();
        self.inner.in_flight.borrow_mut().take();
    }

    /// Returns the cached catalog when it is still within the TTL.
    pub fn cached_registry(&self) -> Option<Rc<AppRegistry>> {
        let cache = self.inner.cache.borrow();
        let cached = cache.as_ref()?;
        self.inner
            .is_within_ttl(cached.fetched_at_ms)
            .then(|| Rc::clone(&cached.registry))
    }

    /// Returns whether a cached catalog exists and is within the TTL.
    pub fn is_fresh(&self) -> bool {
        self.inner
            .cache
            .borrow()
            .as_ref()
            .map(|cached| self.inner.is_within_ttl(cached.fetched_at_ms))
            .unwrap_or(false)
    }
}

impl ClientInner {
    fn is_within_ttl(&self, fetched_at_ms: u64) -> bool {
        let age_ms = self.clock.now_ms().saturating_sub(fetched_at_ms);
        age_ms < self.config.ttl_secs.saturating_mul(1_000)
    }

    async fn fetch_uncached(&self) -> Result<AppRegistry, RuntimeError> {
        let primary = match self.fetch_primary().await {
            Ok(registry) => return Ok(registry),
            Err(err) => err,
        };
        warn!("primary registry fetch failed, using fallback listing: {primary}");

        self.fetch_fallback().await.map_err(|fallback| {
            warn!("fallback registry fetch failed: {fallback}");
            RuntimeError::RegistryUnavailable { primary, fallback }
        })
    }

    async fn fetch_primary(&self) -> Result<AppRegistry, String> {
        let url = self.config.primary_url.as_str();
        let response = self.http.get(url).await?;
        if !response.is_success() {
            return Err(format!("{url} returned HTTP {}", response.status));
        }
        let published: PublishedCatalog = serde_json::from_str(&response.body)
            .map_err(|err| format!("{url} returned an invalid catalog: {err}"))?;

        let listed = published.apps.len();
        let mut apps = BTreeMap::new();
        for (identifier, raw) in published.apps {
            match serde_json::from_value::<RegistryEntry>(raw) {
                Ok(entry) => {
                    apps.insert(identifier, entry);
                }
                Err(err) => warn!("registry entry `{identifier}` skipped: {err}"),
            }
        }
        if listed > 0 && apps.is_empty() {
            return Err(format!("{url} listed {listed} apps but none decoded"));
        }

        Ok(AppRegistry {
            apps,
            updated: published.updated,
        })
    }

    async fn fetch_fallback(&self) -> Result<AppRegistry, String> {
        let sources = self.list_sources().await?;
        let entries = join_all(sources.iter().map(|repo| self.fetch_source_entry(repo))).await;

        let mut apps = BTreeMap::new();
        for (repo, entry) in sources.iter().zip(entries) {
            match entry {
                Ok(entry) => {
                    apps.insert(entry.manifest.identifier.to_string(), entry);
                }
                Err(err) => log!("registry fallback skipped `{repo}`: {err}"),
            }
        }

        Ok(AppRegistry {
            apps,
            updated: rfc3339_from_ms(self.clock.now_ms()),
        })
    }

    /// Walks listing pages until a short page or `max_pages`. A failure after the first page keeps
    /// the sources already listed.
    async fn list_sources(&self) -> Result<Vec<String>, String> {
        let page_size = self.config.page_size.max(1);
        let mut sources = Vec::new();

        for page in 1..=self.config.max_pages.max(1) {
            let listed = match self.fetch_listing_page(page_size, page).await {
                Ok(listed) => listed,
                Err(err) if page == 1 => return Err(err),
                Err(err) => {
                    warn!("registry listing stopped at page {page}: {err}");
                    break;
                }
            };
            let short_page = listed.len() < page_size as usize;
            sources.extend(
                listed
                    .into_iter()
                    .filter(|source| !source.archived)
                    .map(|source| source.name),
            );
            if short_page {
                break;
            }
        }

        Ok(sources)
    }

    async fn fetch_listing_page(
        &self,
        page_size: u32,
        page: u32,
    ) -> Result<Vec<fallback::ListedSource>, String> {
        let url = fallback::listing_page_url(&self.config.fallback_listing_url, page_size, page)?;
        let response = self.http.get(&url).await?;
        if !response.is_success() {
            return Err(format!("{url} returned HTTP {}", response.status));
        }
        serde_json::from_str(&response.body)
            .map_err(|err| format!("{url} returned an invalid listing: {err}"))
    }

    async fn fetch_source_entry(&self, repo: &str) -> Result<RegistryEntry, String> {
        let url = fallback::config_file_url(
            &self.config.fallback_config_url_template,
            &self.config.org,
            repo,
        );
        let response = self.http.get(&url).await?;
        if !response.is_success() {
            return Err(format!("configuration file missing (HTTP {})", response.status));
        }
        let descriptor = fallback::decode_config_file(&response.body)?;
        fallback::entry_from_descriptor(
            descriptor,
            &self.config.manifest_field,
            &self.config.org,
            repo,
            &self.bundles,
        )
    }
}

fn rfc3339_from_ms(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|at| at.to_rfc3339())
        .unwrap_or_default()
}
